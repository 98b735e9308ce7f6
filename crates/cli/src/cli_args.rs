pub mod build_settings;
pub mod install;

use crate::State;
use build_settings::BuildSettingsArgs;
use clap::{Args, Parser, Subcommand};
use install::InstallArgs;
use miette::{Context, IntoDiagnostic};
use podvend_config::Config;
use std::{env, io, path::PathBuf};

/// Dependency manager for Objective-C projects.
#[derive(Debug, Parser)]
#[clap(name = "podvend")]
#[clap(bin_name = "podvend")]
#[clap(version)]
#[clap(about = "Dependency manager for Objective-C projects")]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: CliCommand,

    /// Set working directory.
    #[clap(short = 'C', long, default_value = ".")]
    pub dir: PathBuf,

    /// Print nothing but errors.
    #[clap(long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    /// Also list the pods that were already installed.
    #[clap(long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve, fetch and vendor the pods of the Podfile.
    Install(InstallArgs),
    /// Print the aggregated build settings of the installed pods as JSON.
    BuildSettings(BuildSettingsArgs),
}

/// Location of the manifest, shared by every subcommand.
#[derive(Debug, Args)]
pub struct PodfileArgs {
    /// Path to the manifest, relative to the working directory.
    #[clap(long, default_value = "Podfile.json")]
    pub podfile: PathBuf,
}

impl CliArgs {
    /// Execute the command
    pub async fn run(self) -> miette::Result<()> {
        let CliArgs { command, dir, silent, verbose } = self;
        let project_dir = env::current_dir()
            .into_diagnostic()
            .wrap_err("get the current directory")?
            .join(dir);
        let current_dir = || io::Result::Ok(project_dir.clone());
        let config = Config::current(current_dir, home::home_dir, Default::default);
        let config: &'static Config = Config {
            silent: config.silent || silent,
            verbose: (config.verbose || verbose) && !silent,
            ..config
        }
        .leak();
        let state = |podfile: &PodfileArgs| {
            State::init(project_dir.join(&podfile.podfile), config).wrap_err("initialize the state")
        };

        match command {
            CliCommand::Install(args) => {
                let state = state(&args.podfile)?;
                args.run(state).await
            }
            CliCommand::BuildSettings(args) => {
                let state = state(&args.podfile)?;
                args.run(state)
            }
        }
    }
}
