//! Request and response header transformation.
//!
//! [`build_outbound_headers`] copies the caller's headers, strips
//! hop-by-hop headers, points `Host` at the upstream, applies the route's
//! forced headers and re-sets `Cookie` explicitly.
//! [`transform_response_headers`] runs every `Set-Cookie` entry through
//! the route's [`CookieRules`] so cookies bind to the proxy's own host.

use std::sync::LazyLock;

use axum::http::header::{COOKIE, HOST, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use super::forward::UpstreamTarget;
use super::routing::RouteConfig;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// How `Domain` attributes of upstream `Set-Cookie` entries are edited.
///
/// Rewrites are matched case-insensitively against the attribute value;
/// the key `*` matches any domain. An empty replacement removes the
/// attribute. With `strip_unmatched` set, a `Domain` attribute that no
/// rewrite matched is removed as well.
#[derive(Debug, Clone, Default)]
pub struct CookieRules {
    rewrites: Vec<(String, String)>,
    strip_unmatched: bool,
}

impl CookieRules {
    pub fn new<'a>(
        rewrites: impl IntoIterator<Item = (&'a str, &'a str)>,
        strip_unmatched: bool,
    ) -> Self {
        let mut rewrites: Vec<(String, String)> = rewrites
            .into_iter()
            .map(|(domain, replacement)| (domain.to_ascii_lowercase(), replacement.to_string()))
            .collect();
        // exact domains before the wildcard
        rewrites.sort_by_key(|(domain, _)| domain == "*");
        Self {
            rewrites,
            strip_unmatched,
        }
    }

    #[must_use]
    pub const fn strips_unmatched(&self) -> bool {
        self.strip_unmatched
    }

    fn replacement_for(&self, domain: &str) -> Option<&str> {
        self.rewrites
            .iter()
            .find(|(d, _)| d == "*" || d.eq_ignore_ascii_case(domain))
            .map(|(_, r)| r.as_str())
    }

    /// Apply the rules to one `Set-Cookie` value.
    ///
    /// The name/value pair and every other attribute are kept byte for
    /// byte, including their original spacing.
    #[must_use]
    pub fn apply(&self, set_cookie: &str) -> String {
        let mut parts = set_cookie.split(';');
        let mut out = String::with_capacity(set_cookie.len());
        if let Some(pair) = parts.next() {
            out.push_str(pair);
        }

        for attr in parts {
            let trimmed = attr.trim_start();
            let leading = &attr[..attr.len() - trimmed.len()];
            let (name, value) = trimmed.split_once('=').unwrap_or((trimmed, ""));

            if !name.trim_end().eq_ignore_ascii_case("domain") {
                out.push(';');
                out.push_str(attr);
                continue;
            }

            match self.replacement_for(value.trim()) {
                Some("") => {}
                Some(replacement) => {
                    out.push(';');
                    out.push_str(leading);
                    out.push_str(name);
                    out.push('=');
                    out.push_str(replacement);
                }
                None if self.strip_unmatched => {}
                None => {
                    out.push(';');
                    out.push_str(attr);
                }
            }
        }
        out
    }
}

pub fn build_outbound_headers(
    inbound: &HeaderMap,
    route: &RouteConfig,
    upstream: &UpstreamTarget,
) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);

    if let Ok(host) = HeaderValue::from_str(upstream.authority().as_str()) {
        headers.insert(HOST, host);
    }

    for (name, value) in &route.forced_headers {
        headers.insert(name.clone(), value.clone());
    }

    // HTTP/1.1 allows a single Cookie field; HTTP/2 clients may split it.
    let cookies: Vec<&[u8]> = inbound
        .get_all(COOKIE)
        .iter()
        .map(HeaderValue::as_bytes)
        .collect();
    if !cookies.is_empty() {
        let joined = cookies.join(&b"; "[..]);
        if let Ok(value) = HeaderValue::from_bytes(&joined) {
            headers.insert(COOKIE, value);
        }
    }

    headers
}

pub fn transform_response_headers(headers: &mut HeaderMap, rules: &CookieRules) {
    strip_hop_by_hop(headers);

    if !headers.contains_key(SET_COOKIE) {
        return;
    }

    let rewritten: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| match value.to_str() {
            Ok(text) => HeaderValue::from_str(&rules.apply(text)).unwrap_or_else(|_| value.clone()),
            Err(_) => value.clone(),
        })
        .collect();

    headers.remove(SET_COOKIE);
    for value in rewritten {
        headers.append(SET_COOKIE, value);
    }
}
