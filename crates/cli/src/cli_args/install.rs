use crate::{cli_args::PodfileArgs, State};
use clap::Args;
use miette::Context;
use podvend_installer::{Install, InstallReport};

#[derive(Debug, Args)]
pub struct InstallArgs {
    #[clap(flatten)]
    pub podfile: PodfileArgs,

    /// Refetch and reinstall every pod even if it is already installed.
    #[clap(long)]
    pub force: bool,

    /// Resolve again instead of reusing the versions pinned by the lockfile.
    #[clap(long)]
    pub update: bool,
}

impl InstallArgs {
    pub async fn run(self, state: State) -> miette::Result<()> {
        let State { config, podfile, source, fetcher } = &state;
        let InstallArgs { force, update, .. } = self;

        let report = Install {
            config,
            podfile,
            source,
            fetcher,
            force,
            update,
            post_install: None,
        }
        .run()
        .await
        .wrap_err("install pods")?;

        if !config.silent {
            print!("{}", summary(&report, config.verbose));
        }
        Ok(())
    }
}

/// Human readable account of an install run.
fn summary(report: &InstallReport, verbose: bool) -> String {
    let mut lines = Vec::new();
    for name in &report.removed {
        lines.push(format!("Removing {name}"));
    }
    for spec in report.graph.iter() {
        if report.installed.contains(&spec.name) {
            lines.push(format!("Installing {}", spec.to_pin_string()));
        } else if verbose {
            lines.push(format!("Using {}", spec.to_pin_string()));
        }
    }
    let count = report.graph.len();
    let noun = if count == 1 { "pod" } else { "pods" };
    lines.push(format!("Pod installation complete! {count} {noun} vendored."));
    lines.iter().map(|line| format!("{line}\n")).collect()
}
