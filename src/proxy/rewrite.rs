//! Upstream path computation.
//!
//! [`rewrite_path`] maps the inbound path-and-query onto the path sent to
//! the upstream according to the route's [`RewriteRule`]. The query string
//! is carried through untouched; only the leading prefix is ever edited.

use crate::config::model::RewriteRule;

#[must_use]
pub fn rewrite_path(rule: RewriteRule, prefix: &str, path_and_query: &str) -> String {
    match rule {
        RewriteRule::StripPrefix => strip_prefix(prefix, path_and_query).to_string(),
        RewriteRule::Canonicalize => canonicalize(prefix, path_and_query),
        RewriteRule::Preserve => path_and_query.to_string(),
    }
}

/// `/api/workouts` -> `/workouts`, `/api` -> ``.
fn strip_prefix<'a>(prefix: &str, path_and_query: &'a str) -> &'a str {
    path_and_query
        .strip_prefix(prefix)
        .unwrap_or(path_and_query)
}

/// `/auth` and `/auth/` -> `/auth/`, `/auth/login` -> `/auth/login`.
///
/// At most one `/` after the prefix is absorbed, so `/auth//x` keeps its
/// second slash and `/auth/auth/x` is left as is.
fn canonicalize(prefix: &str, path_and_query: &str) -> String {
    let Some(rest) = path_and_query.strip_prefix(prefix) else {
        return path_and_query.to_string();
    };
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let base = prefix.trim_end_matches('/');
    format!("{base}/{rest}")
}

/// Turn a rewritten path into something a request line can carry: an
/// empty path or a bare query addresses the upstream root.
#[must_use]
pub fn request_target(rewritten: &str) -> String {
    if rewritten.starts_with('/') {
        rewritten.to_string()
    } else {
        format!("/{rewritten}")
    }
}
