//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors: a malformed upstream URL, zero timeouts, missing or duplicate
//! route prefixes, and header names or values that cannot go on the wire.
//! Returns every [`ValidationError`] found, not just the first.

use std::collections::{BTreeMap, HashSet};

use http::{HeaderName, HeaderValue};
use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate the upstream URL. Returns `Ok(())` or a human-readable error.
pub fn validate_upstream_url(url: &str) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|_| format!("'{url}' is not a valid URL"))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if parsed.host_str().is_none() {
        return Err("upstream URL must include a host".into());
    }
    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err("upstream URL must not carry a path, query or fragment".into());
    }
    Ok(())
}

/// Validate a route prefix. Returns `Ok(())` or a human-readable error.
pub fn validate_prefix(prefix: &str) -> Result<(), String> {
    if prefix.is_empty() {
        return Err("prefix cannot be empty".into());
    }
    if !prefix.starts_with('/') {
        return Err("prefix must start with '/'".into());
    }
    if prefix.len() > 1 && prefix.ends_with('/') {
        return Err("prefix must not end with '/'".into());
    }
    if prefix.contains(['?', '#']) {
        return Err("prefix must be a plain path".into());
    }
    Ok(())
}

fn validate_headers(
    scope: &str,
    field: &str,
    headers: &BTreeMap<String, String>,
    errors: &mut Vec<ValidationError>,
) {
    for (name, value) in headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError {
                scope: scope.to_string(),
                field: field.to_string(),
                message: format!("'{name}' is not a valid header name"),
                suggestion: None,
            });
        }
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError {
                scope: scope.to_string(),
                field: field.to_string(),
                message: format!("value of '{name}' is not a valid header value"),
                suggestion: None,
            });
        }
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(msg) = validate_upstream_url(&config.upstream.url) {
        let trimmed = config.upstream.url.trim_end_matches('/');
        let suggestion = Url::parse(trimmed)
            .ok()
            .filter(|u| u.path() != "/")
            .map(|u| format!("did you mean '{}'?", u.origin().ascii_serialization()));
        errors.push(ValidationError {
            scope: "upstream".into(),
            field: "url".into(),
            message: msg,
            suggestion,
        });
    }

    if config.upstream.connect_timeout == 0 {
        errors.push(ValidationError {
            scope: "upstream".into(),
            field: "connect_timeout".into(),
            message: "timeout must be greater than 0".into(),
            suggestion: None,
        });
    }
    if config.upstream.response_timeout == 0 {
        errors.push(ValidationError {
            scope: "upstream".into(),
            field: "response_timeout".into(),
            message: "timeout must be greater than 0".into(),
            suggestion: None,
        });
    }

    validate_headers("defaults", "headers", &config.defaults.headers, &mut errors);

    if config.routes.is_empty() {
        errors.push(ValidationError {
            scope: "(root)".into(),
            field: "routes".into(),
            message: "at least one route must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    let mut seen_prefixes = HashSet::new();

    for (i, route) in config.routes.iter().enumerate() {
        let scope = if route.prefix.is_empty() {
            format!("routes[{i}]")
        } else {
            route.prefix.clone()
        };

        if let Err(msg) = validate_prefix(&route.prefix) {
            let suggestion = if !route.prefix.is_empty() && !route.prefix.starts_with('/') {
                Some(format!("did you mean '/{}'?", route.prefix))
            } else if route.prefix.len() > 1 && route.prefix.ends_with('/') {
                Some(format!(
                    "did you mean '{}'?",
                    route.prefix.trim_end_matches('/')
                ))
            } else {
                None
            };
            errors.push(ValidationError {
                scope: scope.clone(),
                field: "prefix".into(),
                message: msg,
                suggestion,
            });
        }

        if !seen_prefixes.insert(&route.prefix) {
            errors.push(ValidationError {
                scope: scope.clone(),
                field: "prefix".into(),
                message: "duplicate route prefix".into(),
                suggestion: None,
            });
        }

        validate_headers(&scope, "headers", &route.headers, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
