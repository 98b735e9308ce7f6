use crate::{cli_args::PodfileArgs, State};
use clap::Args;
use miette::{Context, IntoDiagnostic};
use podvend_installer::load_build_settings;

#[derive(Debug, Args)]
pub struct BuildSettingsArgs {
    #[clap(flatten)]
    pub podfile: PodfileArgs,
}

impl BuildSettingsArgs {
    pub fn run(self, state: State) -> miette::Result<()> {
        let State { config, podfile, source, .. } = &state;
        let settings = load_build_settings(config, podfile, source)
            .wrap_err("load build settings from the lockfile")?;
        let json = serde_json::to_string_pretty(&settings)
            .into_diagnostic()
            .wrap_err("serialize build settings")?;
        println!("{json}");
        Ok(())
    }
}
