mod cli_args;
mod state;

use clap::Parser;
use cli_args::CliArgs;
use miette::set_panic_hook;
use podvend_diagnostics::enable_tracing_by_env;
use state::State;

pub async fn run_cli() -> miette::Result<()> {
    enable_tracing_by_env();
    set_panic_hook();
    CliArgs::parse().run().await
}
