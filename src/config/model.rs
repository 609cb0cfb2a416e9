//! Serde data structures for the pelo-proxy configuration file.
//!
//! Contains [`Config`] (the root), [`Upstream`], [`Defaults`] and
//! [`Route`]. Every field has a default, so an empty document yields the
//! built-in Peloton setup. All types use `deny_unknown_fields`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_UPSTREAM: &str = "https://api.onepeloton.com";
pub const DEFAULT_ORIGIN: &str = "https://members.onepeloton.com";
pub const DEFAULT_COOKIE_DOMAIN: &str = ".onepeloton.com";

const fn default_connect_timeout() -> u64 {
    5000
}

const fn default_response_timeout() -> u64 {
    30_000
}

const fn default_true() -> bool {
    true
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM.to_string()
}

fn default_forced_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Origin".to_string(), DEFAULT_ORIGIN.to_string()),
        ("Peloton-Platform".to_string(), "web".to_string()),
    ])
}

fn default_cookie_domain_rewrite() -> BTreeMap<String, String> {
    BTreeMap::from([(DEFAULT_COOKIE_DOMAIN.to_string(), String::new())])
}

fn default_routes() -> Vec<Route> {
    vec![
        Route::new("/api", RewriteRule::StripPrefix),
        Route::new("/auth", RewriteRule::Canonicalize),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub upstream: Upstream,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: Upstream::default(),
            defaults: Defaults::default(),
            routes: default_routes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Upstream {
    #[serde(default = "default_upstream_url")]
    pub url: String,

    /// Milliseconds allowed for TCP + TLS connection establishment.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Milliseconds allowed until the upstream response head arrives.
    #[serde(default = "default_response_timeout")]
    pub response_timeout: u64,
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            connect_timeout: default_connect_timeout(),
            response_timeout: default_response_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Remove any `Domain` attribute the rewrites below leave behind.
    #[serde(default = "default_true")]
    pub strip_cookie_domain: bool,

    #[serde(default = "default_forced_headers")]
    pub headers: BTreeMap<String, String>,

    /// Domain -> replacement; `""` removes the attribute, `*` matches any.
    #[serde(default = "default_cookie_domain_rewrite")]
    pub cookie_domain_rewrite: BTreeMap<String, String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            strip_cookie_domain: default_true(),
            headers: default_forced_headers(),
            cookie_domain_rewrite: default_cookie_domain_rewrite(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub prefix: String,

    #[serde(default)]
    pub rewrite: RewriteRule,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_cookie_domain: Option<bool>,

    /// Merged over `defaults.headers`; the route's value wins.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Replaces `defaults.cookie_domain_rewrite` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_domain_rewrite: Option<BTreeMap<String, String>>,
}

impl Route {
    #[must_use]
    pub fn new(prefix: &str, rewrite: RewriteRule) -> Self {
        Self {
            prefix: prefix.to_string(),
            rewrite,
            strip_cookie_domain: None,
            headers: BTreeMap::new(),
            cookie_domain_rewrite: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteRule {
    /// Remove one leading occurrence of the prefix.
    #[default]
    StripPrefix,
    /// Normalize `<prefix>` / `<prefix>/` to `<prefix>/`.
    Canonicalize,
    /// Forward the path untouched.
    Preserve,
}

impl RewriteRule {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StripPrefix => "strip_prefix",
            Self::Canonicalize => "canonicalize",
            Self::Preserve => "preserve",
        }
    }
}
