//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared, read-only state holding the
//! route table, forwarding engine and hook sink), [`build_router`] for
//! constructing the Axum router with middleware layers,
//! [`build_http_client`] for the connection-pooled hyper client, and
//! [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::Config;
use crate::error::ProxyError;
use crate::proxy;
use crate::proxy::forward::{ForwardingEngine, UpstreamTarget};
use crate::proxy::hooks::ProxyHooks;
use crate::proxy::routing::RouteTable;

pub type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Body>;

pub struct AppState {
    pub routes: RouteTable,
    pub engine: ForwardingEngine,
    pub hooks: Arc<dyn ProxyHooks>,
    /// Request body cap in bytes, enforced by [`build_router`].
    pub max_body: usize,
}

impl AppState {
    /// Validate `config` and build everything a request needs.
    pub fn from_config(
        config: &Config,
        max_body: usize,
        hooks: Arc<dyn ProxyHooks>,
    ) -> Result<Self, ProxyError> {
        let routes = RouteTable::from_config(config)?;
        let target = UpstreamTarget::parse(&config.upstream.url)?;
        let connect_timeout = Duration::from_millis(config.upstream.connect_timeout);
        let response_timeout = Duration::from_millis(config.upstream.response_timeout);

        let engine = ForwardingEngine::new(
            build_http_client(connect_timeout),
            target,
            connect_timeout,
            response_timeout,
            max_body,
        );

        Ok(Self {
            routes,
            engine,
            hooks,
            max_body,
        })
    }
}

#[must_use]
pub fn build_http_client(connect_timeout: Duration) -> HttpClient {
    // rustls cannot pick a crypto provider on its own when more than one is
    // compiled in; install `ring` explicitly. Fails harmlessly if already set.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let max_body = state.max_body;
    Router::new()
        .fallback(proxy::proxy_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
