//! Core HTTP forwarding handler.
//!
//! [`proxy_handler`] is the Axum fallback that receives every request,
//! selects a route by prefix, rewrites the path and headers, and relays
//! the upstream response with its body streaming. Submodules hold the
//! route table ([`routing`]), path rewriting ([`rewrite`]), header
//! transformation ([`headers`]), the upstream client ([`forward`]) and
//! the observability hooks ([`hooks`]).

pub mod forward;
pub mod headers;
pub mod hooks;
pub mod rewrite;
pub mod routing;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;

use crate::server::AppState;
use forward::OutboundRequest;
use hooks::Exchange;

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from)
}

pub async fn proxy_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    let Some(route) = state.routes.match_route(&parts.method, path) else {
        state.hooks.on_unmatched(&parts.method, path);
        return StatusCode::NOT_FOUND.into_response();
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or(path, PathAndQuery::as_str);
    let upstream_path = route.upstream_path(path_and_query);

    let exchange = Exchange::new(
        correlation_id(&parts.headers),
        parts.method.clone(),
        path_and_query.to_string(),
        upstream_path.clone(),
        route.prefix.clone(),
    );

    let headers = headers::build_outbound_headers(&parts.headers, route, state.engine.target());
    state.hooks.on_request(&exchange, &headers);

    let outbound = OutboundRequest {
        method: parts.method,
        path: upstream_path,
        headers,
        body,
    };

    match state.engine.forward(outbound).await {
        Ok(response) => {
            let (mut head, upstream_body) = response.into_parts();
            headers::transform_response_headers(&mut head.headers, &route.cookie_rules);
            state.hooks.on_response(&exchange, head.status);

            // Status and headers are committed from here on; a body error
            // can only cut the stream short.
            let hooks = Arc::clone(&state.hooks);
            let body = upstream_body.map_err(move |err| {
                hooks.on_stream_error(&exchange, &err);
                err
            });
            Response::from_parts(head, Body::new(body))
        }
        Err(err) => {
            state.hooks.on_error(&exchange, &err);
            err.into_response()
        }
    }
}
