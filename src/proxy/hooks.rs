//! Observability hook points invoked by the proxy core.
//!
//! The handler calls a [`ProxyHooks`] implementation at each stage of an
//! exchange instead of logging inline. [`TracingHooks`] is the sink used
//! by `pelo-proxy run`; tests plug in their own recorder.

use std::time::Instant;

use axum::http::{HeaderMap, Method, StatusCode};

use super::forward::ForwardError;

/// Per-request context shared by every hook of one exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub id: String,
    pub method: Method,
    pub path: String,
    pub upstream_path: String,
    pub route: String,
    started: Instant,
}

impl Exchange {
    #[must_use]
    pub fn new(id: String, method: Method, path: String, upstream_path: String, route: String) -> Self {
        Self {
            id,
            method,
            path,
            upstream_path,
            route,
            started: Instant::now(),
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// All methods default to no-ops.
pub trait ProxyHooks: Send + Sync + 'static {
    /// Route matched and the outbound request is about to be sent.
    fn on_request(&self, _exchange: &Exchange, _outbound: &HeaderMap) {}

    /// Upstream response head received and about to be relayed.
    fn on_response(&self, _exchange: &Exchange, _status: StatusCode) {}

    /// Forwarding failed before a response head was relayed.
    fn on_error(&self, _exchange: &Exchange, _error: &ForwardError) {}

    fn on_unmatched(&self, _method: &Method, _path: &str) {}

    /// Response body failed after the head was already sent; the stream
    /// to the caller ends early.
    fn on_stream_error(&self, _exchange: &Exchange, _error: &(dyn std::error::Error + 'static)) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl ProxyHooks for NoopHooks {}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl ProxyHooks for TracingHooks {
    fn on_request(&self, exchange: &Exchange, outbound: &HeaderMap) {
        tracing::info!(
            correlation_id = %exchange.id,
            method = %exchange.method,
            path = %exchange.path,
            upstream_path = %exchange.upstream_path,
            route = %exchange.route,
            "request received"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            let names: Vec<&str> = outbound.keys().map(axum::http::HeaderName::as_str).collect();
            tracing::debug!(
                correlation_id = %exchange.id,
                headers = ?names,
                "outbound headers"
            );
        }
    }

    fn on_response(&self, exchange: &Exchange, status: StatusCode) {
        tracing::info!(
            correlation_id = %exchange.id,
            status = status.as_u16(),
            path = %exchange.path,
            upstream_path = %exchange.upstream_path,
            latency_ms = exchange.elapsed_ms(),
            "upstream responded"
        );
    }

    fn on_error(&self, exchange: &Exchange, error: &ForwardError) {
        tracing::error!(
            correlation_id = %exchange.id,
            kind = error.kind(),
            error = %error,
            path = %exchange.path,
            upstream_path = %exchange.upstream_path,
            latency_ms = exchange.elapsed_ms(),
            "proxy error"
        );
    }

    fn on_unmatched(&self, method: &Method, path: &str) {
        tracing::warn!(method = %method, path = %path, "no route matched");
    }

    fn on_stream_error(&self, exchange: &Exchange, error: &(dyn std::error::Error + 'static)) {
        tracing::warn!(
            correlation_id = %exchange.id,
            error = %error,
            path = %exchange.path,
            latency_ms = exchange.elapsed_ms(),
            "response stream truncated"
        );
    }
}
