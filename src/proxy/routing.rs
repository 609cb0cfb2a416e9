//! Prefix-based route table.
//!
//! [`RouteTable`] is built once from a validated [`Config`]: defaults and
//! per-route overrides are merged into a resolved [`RouteConfig`] per
//! prefix, with forced headers already parsed into wire types. Lookups
//! are pure and lock-free.

use axum::http::{HeaderName, HeaderValue, Method};

use crate::config::model::{Config, RewriteRule};
use crate::config::validation::validate;
use crate::error::{ProxyError, ValidationError};

use super::headers::CookieRules;
use super::rewrite::rewrite_path;

#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub prefix: String,
    pub rewrite: RewriteRule,
    pub forced_headers: Vec<(HeaderName, HeaderValue)>,
    pub cookie_rules: CookieRules,
}

impl RouteConfig {
    /// Whether `path` falls under this route's prefix on a segment boundary.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        path.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    #[must_use]
    pub fn upstream_path(&self, path_and_query: &str) -> String {
        rewrite_path(self.rewrite, &self.prefix, path_and_query)
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteConfig>,
}

impl RouteTable {
    pub fn from_config(config: &Config) -> Result<Self, ProxyError> {
        if let Err(errors) = validate(config) {
            return Err(ProxyError::ConfigValidation { errors });
        }

        let mut routes = Vec::with_capacity(config.routes.len());
        for route in &config.routes {
            let mut merged = config.defaults.headers.clone();
            for (name, value) in &route.headers {
                // header names are case-insensitive; drop any default spelled differently
                merged.retain(|k, _| !k.eq_ignore_ascii_case(name));
                merged.insert(name.clone(), value.clone());
            }

            let mut forced_headers = Vec::with_capacity(merged.len());
            for (name, value) in &merged {
                let parsed = HeaderName::from_bytes(name.as_bytes())
                    .ok()
                    .zip(HeaderValue::from_str(value).ok());
                let Some(pair) = parsed else {
                    return Err(ProxyError::ConfigValidation {
                        errors: vec![ValidationError {
                            scope: route.prefix.clone(),
                            field: "headers".into(),
                            message: format!("header '{name}' cannot be sent"),
                            suggestion: None,
                        }],
                    });
                };
                forced_headers.push(pair);
            }

            let domain_rewrites = route
                .cookie_domain_rewrite
                .as_ref()
                .unwrap_or(&config.defaults.cookie_domain_rewrite);
            let cookie_rules = CookieRules::new(
                domain_rewrites.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                route
                    .strip_cookie_domain
                    .unwrap_or(config.defaults.strip_cookie_domain),
            );

            routes.push(RouteConfig {
                prefix: route.prefix.clone(),
                rewrite: route.rewrite,
                forced_headers,
                cookie_rules,
            });
        }

        // Longest prefix first so nested prefixes resolve deterministically.
        routes.sort_by_key(|r| std::cmp::Reverse(r.prefix.len()));
        Ok(Self { routes })
    }

    /// Every method is forwarded; `_method` is accepted so callers can
    /// pass the full request identity.
    #[must_use]
    pub fn match_route(&self, _method: &Method, path: &str) -> Option<&RouteConfig> {
        self.routes.iter().find(|r| r.matches(path))
    }

    #[must_use]
    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::Route;

    fn table() -> RouteTable {
        RouteTable::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn matches_api_and_auth() {
        let table = table();
        assert_eq!(
            table.match_route(&Method::GET, "/api/workouts").unwrap().prefix,
            "/api"
        );
        assert_eq!(table.match_route(&Method::POST, "/api").unwrap().prefix, "/api");
        assert_eq!(table.match_route(&Method::GET, "/auth").unwrap().prefix, "/auth");
        assert_eq!(
            table.match_route(&Method::DELETE, "/auth/login").unwrap().prefix,
            "/auth"
        );
    }

    #[test]
    fn segment_boundary_is_required() {
        let table = table();
        assert!(table.match_route(&Method::GET, "/apix").is_none());
        assert!(table.match_route(&Method::GET, "/authorize").is_none());
    }

    #[test]
    fn unmatched_returns_none() {
        let table = table();
        assert!(table.match_route(&Method::GET, "/health").is_none());
        assert!(table.match_route(&Method::GET, "/").is_none());
        assert!(table.match_route(&Method::GET, "/API/x").is_none());
    }

    #[test]
    fn longest_prefix_wins() {
        let mut config = Config::default();
        config.routes = vec![
            Route::new("/api", RewriteRule::StripPrefix),
            Route::new("/api/v2", RewriteRule::Preserve),
        ];
        let table = RouteTable::from_config(&config).unwrap();
        assert_eq!(
            table.match_route(&Method::GET, "/api/v2/x").unwrap().prefix,
            "/api/v2"
        );
        assert_eq!(
            table.match_route(&Method::GET, "/api/v1/x").unwrap().prefix,
            "/api"
        );
    }

    #[test]
    fn root_prefix_matches_everything() {
        let mut config = Config::default();
        config.routes = vec![Route::new("/", RewriteRule::Preserve)];
        let table = RouteTable::from_config(&config).unwrap();
        assert!(table.match_route(&Method::GET, "/anything").is_some());
    }

    #[test]
    fn route_headers_override_defaults_case_insensitively() {
        let mut config = Config::default();
        let mut route = Route::new("/api", RewriteRule::StripPrefix);
        route.headers.insert("origin".into(), "https://proxy.local".into());
        config.routes = vec![route];

        let table = RouteTable::from_config(&config).unwrap();
        let forced = &table.routes()[0].forced_headers;
        assert_eq!(forced.len(), 2);
        let origin = forced
            .iter()
            .find(|(n, _)| n == "origin")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(origin, "https://proxy.local");
    }

    #[test]
    fn route_cookie_rules_replace_defaults() {
        let mut config = Config::default();
        let mut route = Route::new("/api", RewriteRule::StripPrefix);
        route.strip_cookie_domain = Some(false);
        config.routes = vec![route];

        let table = RouteTable::from_config(&config).unwrap();
        assert!(!table.routes()[0].cookie_rules.strips_unmatched());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.routes.clear();
        assert!(RouteTable::from_config(&config).is_err());
    }
}
