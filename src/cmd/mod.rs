//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`init`] or [`validate`]. Each handler
//! lives in its own submodule.

pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::ProxyError;

pub async fn dispatch(cli: Cli) -> Result<(), ProxyError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args),
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    let build = env!("PELO_PROXY_GIT_SHORT");
    println!(
        "\n  pelo-proxy v{version} ({build}) \u{2014} reverse proxy for the Peloton API\n\n  \
         No command provided. To get started:\n\n    \
         pelo-proxy run                    Start with built-in defaults (or ./pelo-proxy.yaml)\n    \
         pelo-proxy init                   Write the defaults to a config file\n    \
         pelo-proxy validate <file>        Check a config file\n    \
         pelo-proxy --help                 See all commands and options\n"
    );
}
