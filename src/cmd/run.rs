//! `pelo-proxy run`: start the proxy server.
//!
//! Resolves the configuration (file or built-in defaults), applies CLI
//! overrides, builds the immutable [`AppState`] and serves until Ctrl+C or
//! SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::{self, model::Config};
use crate::error::ProxyError;
use crate::logging;
use crate::proxy::hooks::TracingHooks;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), ProxyError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let (mut config, origin) = config::resolve(args.config.as_deref()).await?;
    apply_overrides(&mut config, &args);

    let state = Arc::new(AppState::from_config(
        &config,
        args.max_body,
        Arc::new(TracingHooks),
    )?);
    let route_count = state.routes.routes().len();
    let upstream = state.engine.target().origin();

    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        upstream = %upstream,
        routes = route_count,
        config = %origin,
        build = env!("PELO_PROXY_GIT_SHORT"),
        "pelo-proxy started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("pelo-proxy stopped");
    Ok(())
}

/// CLI flags and their env equivalents win over the config file.
fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(ref upstream) = args.upstream {
        config.upstream.url.clone_from(upstream);
    }
    if let Some(ms) = args.connect_timeout {
        config.upstream.connect_timeout = ms;
    }
    if let Some(ms) = args.timeout {
        config.upstream.response_timeout = ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Some(Commands::Run(args)) => *args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = run_args(&[
            "pelo-proxy",
            "run",
            "--upstream",
            "http://localhost:9000",
            "--connect-timeout",
            "100",
            "--timeout",
            "200",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.upstream.url, "http://localhost:9000");
        assert_eq!(config.upstream.connect_timeout, 100);
        assert_eq!(config.upstream.response_timeout, 200);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let args = run_args(&["pelo-proxy", "run"]);
        let mut config = Config::default();
        config.upstream.response_timeout = 1234;
        apply_overrides(&mut config, &args);
        assert_eq!(config.upstream.response_timeout, 1234);
    }
}
