//! Single-attempt forwarding to the fixed upstream.
//!
//! [`ForwardingEngine::forward`] sends one [`OutboundRequest`] and hands
//! back the upstream response with its body still streaming. Request
//! bodies are never buffered. Every failure before the response head
//! arrives becomes a [`ForwardError`], which renders as the proxy's 500
//! JSON body.
//!
//! Dropping the returned future (the caller went away) drops the pending
//! hyper request, which aborts the upstream exchange and frees its
//! connection.

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http_body_util::LengthLimitError;
use hyper::body::Incoming;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::server::HttpClient;

use super::rewrite::request_target;

pub const PROXY_ERROR: &str = "Proxy server error";
pub const BODY_TOO_LARGE: &str = "Request body too large";

/// Scheme and authority of the upstream; fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
}

impl UpstreamTarget {
    pub fn parse(url: &str) -> Result<Self, ProxyError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| ProxyError::InvalidUpstream(format!("{url}: {e}")))?;
        let parts = uri.into_parts();
        match (parts.scheme, parts.authority) {
            (Some(scheme), Some(authority)) => Ok(Self { scheme, authority }),
            _ => Err(ProxyError::InvalidUpstream(format!(
                "{url}: scheme and host are required"
            ))),
        }
    }

    #[must_use]
    pub const fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    #[must_use]
    pub const fn authority(&self) -> &Authority {
        &self.authority
    }

    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    pub fn uri_for(&self, rewritten_path: &str) -> Result<Uri, axum::http::Error> {
        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(request_target(rewritten_path))
            .build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    Connect,
    Response,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Response => f.write_str("response"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Connection, TLS, DNS or protocol failure, including responses that
    /// could not be parsed.
    #[error("{0}")]
    Unreachable(String),

    #[error("upstream {phase} timed out after {}ms", .after.as_millis())]
    Timeout { phase: TimeoutPhase, after: Duration },

    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),

    /// The caller's streamed body went past `--max-body` mid-send.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl ForwardError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "upstream_unreachable",
            Self::Timeout { .. } => "upstream_timeout",
            Self::InvalidRequest(_) => "invalid_request",
            Self::BodyTooLarge { .. } => "body_too_large",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let error = match self {
            Self::BodyTooLarge { .. } => BODY_TOO_LARGE,
            _ => PROXY_ERROR,
        };
        let body = ErrorBody {
            error: error.to_string(),
            details: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub struct OutboundRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Body,
}

#[derive(Clone)]
pub struct ForwardingEngine {
    client: HttpClient,
    target: UpstreamTarget,
    connect_timeout: Duration,
    response_timeout: Duration,
    max_body: usize,
}

impl ForwardingEngine {
    #[must_use]
    pub const fn new(
        client: HttpClient,
        target: UpstreamTarget,
        connect_timeout: Duration,
        response_timeout: Duration,
        max_body: usize,
    ) -> Self {
        Self {
            client,
            target,
            connect_timeout,
            response_timeout,
            max_body,
        }
    }

    #[must_use]
    pub const fn target(&self) -> &UpstreamTarget {
        &self.target
    }

    pub async fn forward(&self, request: OutboundRequest) -> Result<Response<Incoming>, ForwardError> {
        let uri = self
            .target
            .uri_for(&request.path)
            .map_err(|e| ForwardError::InvalidRequest(e.to_string()))?;

        let mut upstream_req = hyper::Request::builder()
            .method(request.method)
            .uri(uri)
            .body(request.body)
            .map_err(|e| ForwardError::InvalidRequest(e.to_string()))?;
        *upstream_req.headers_mut() = request.headers;

        match tokio::time::timeout(self.response_timeout, self.client.request(upstream_req)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(self.classify(&e)),
            Err(_) => Err(ForwardError::Timeout {
                phase: TimeoutPhase::Response,
                after: self.response_timeout,
            }),
        }
    }

    fn classify(&self, err: &hyper_util::client::legacy::Error) -> ForwardError {
        if caused_by_length_limit(err) {
            return ForwardError::BodyTooLarge {
                limit: self.max_body,
            };
        }
        if err.is_connect() && caused_by_timeout(err) {
            return ForwardError::Timeout {
                phase: TimeoutPhase::Connect,
                after: self.connect_timeout,
            };
        }
        ForwardError::Unreachable(describe(err))
    }
}

/// The request body limit tripped while hyper was still writing the body.
fn caused_by_length_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

fn caused_by_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Top-level message plus the root cause, e.g.
/// `client error (Connect): Connection refused (os error 111)`.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut root = None;
    let mut current = err.source();
    while let Some(e) = current {
        root = Some(e);
        current = e.source();
    }
    match root {
        Some(cause) => format!("{err}: {cause}"),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn parses_upstream() {
        let target = UpstreamTarget::parse("https://api.onepeloton.com").unwrap();
        assert_eq!(target.scheme(), &Scheme::HTTPS);
        assert_eq!(target.authority().as_str(), "api.onepeloton.com");
        assert_eq!(target.origin(), "https://api.onepeloton.com");
    }

    #[test]
    fn rejects_upstream_without_host() {
        assert!(UpstreamTarget::parse("/just/a/path").is_err());
    }

    #[test]
    fn uri_for_empty_path_is_root() {
        let target = UpstreamTarget::parse("https://api.onepeloton.com").unwrap();
        assert_eq!(
            target.uri_for("").unwrap().to_string(),
            "https://api.onepeloton.com/"
        );
        assert_eq!(
            target.uri_for("/workouts?limit=5").unwrap().to_string(),
            "https://api.onepeloton.com/workouts?limit=5"
        );
    }

    #[test]
    fn timeout_message() {
        let err = ForwardError::Timeout {
            phase: TimeoutPhase::Response,
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "upstream response timed out after 250ms");
        assert_eq!(err.kind(), "upstream_timeout");
    }

    #[test]
    fn describe_appends_root_cause() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(describe(&err), "outer: connection refused");
        assert!(!caused_by_timeout(&err));
    }

    #[test]
    fn detects_timeout_in_chain() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert!(caused_by_timeout(&err));
    }

    #[tokio::test]
    async fn length_limit_found_through_wrappers() {
        use axum::body::Bytes;
        use http_body_util::{BodyExt, Full, Limited};

        let limited = Limited::new(Full::new(Bytes::from_static(b"0123456789")), 4);
        let cause = limited.collect().await.err().unwrap();
        let wrapped = axum::Error::new(cause);
        assert!(caused_by_length_limit(&wrapped));

        let unrelated = Outer(std::io::Error::other("reset"));
        assert!(!caused_by_length_limit(&unrelated));
    }

    #[tokio::test]
    async fn body_too_large_renders_as_json_413() {
        use http_body_util::BodyExt;

        let err = ForwardError::BodyTooLarge { limit: 16 };
        assert_eq!(err.kind(), "body_too_large");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Request body too large");
        assert_eq!(body.details, "request body exceeds 16 bytes");
    }

    #[tokio::test]
    async fn error_renders_as_json_500() {
        use http_body_util::BodyExt;

        let response = ForwardError::Unreachable("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "Proxy server error", "details": "boom"})
        );
    }
}
