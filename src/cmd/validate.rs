//! `pelo-proxy validate`: check a configuration file for errors.
//!
//! On success the report shows the route table the proxy would run with:
//! resolution order, the rewrite applied to a sample path, the merged
//! forced headers and the cookie `Domain` policy of each route.

use std::path::Path;

use serde_json::json;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::Config;
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::{ProxyError, ValidationError};
use crate::proxy::routing::{RouteConfig, RouteTable};

pub fn execute(args: &ValidateArgs) -> Result<(), ProxyError> {
    let path = &args.config;
    let config = read(path)?;

    if let Err(errors) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => eprint!("{}", error_report(path, &errors)),
            ValidateFormat::Json => println!("{}", error_json(&errors)),
        }
        return Err(ProxyError::ConfigValidation { errors });
    }

    let table = RouteTable::from_config(&config)?;
    match args.format {
        ValidateFormat::Text => println!("{}", route_report(path, &config, &table)),
        ValidateFormat::Json => println!("{}", route_json(&config, &table)),
    }
    Ok(())
}

fn read(path: &Path) -> Result<Config, ProxyError> {
    if !path.exists() {
        return Err(ProxyError::ConfigFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parse_config_str(ext, &content, &path.display().to_string())
}

/// A request path under `route`, used to show what the rewrite does.
fn sample_path(route: &RouteConfig) -> String {
    format!("{}/workouts?limit=5", route.prefix.trim_end_matches('/'))
}

fn header_names(route: &RouteConfig) -> Vec<&str> {
    route
        .forced_headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect()
}

fn domain_policy(route: &RouteConfig) -> &'static str {
    if route.cookie_rules.strips_unmatched() {
        "strip"
    } else {
        "keep unmatched"
    }
}

fn error_report(path: &Path, errors: &[ValidationError]) -> String {
    let mut out = format!("\u{2717} {} has {} errors\n\n", path.display(), errors.len());
    for error in errors {
        out.push_str(&format!("{error}\n"));
    }
    out
}

fn error_json(errors: &[ValidationError]) -> serde_json::Value {
    let errors: Vec<serde_json::Value> = errors
        .iter()
        .map(|e| {
            json!({
                "scope": e.scope,
                "field": e.field,
                "message": e.message,
                "suggestion": e.suggestion,
            })
        })
        .collect();
    json!({ "valid": false, "errors": errors })
}

fn route_report(path: &Path, config: &Config, table: &RouteTable) -> String {
    let mut lines = vec![
        format!("\u{2713} {} is valid", path.display()),
        format!(
            "  upstream {} (connect {}ms, response {}ms)",
            config.upstream.url, config.upstream.connect_timeout, config.upstream.response_timeout
        ),
        format!("  {} routes, longest prefix first\n", table.routes().len()),
    ];

    for route in table.routes() {
        let sample = sample_path(route);
        lines.push(format!("  {}  -> {}", route.prefix, route.rewrite.as_str()));
        lines.push(format!("    {sample} => {}", route.upstream_path(&sample)));
        lines.push(format!("    forced headers: {}", header_names(route).join(", ")));
        lines.push(format!("    cookie domain: {}", domain_policy(route)));
    }
    lines.join("\n")
}

fn route_json(config: &Config, table: &RouteTable) -> serde_json::Value {
    let routes: Vec<serde_json::Value> = table
        .routes()
        .iter()
        .map(|route| {
            let sample = sample_path(route);
            json!({
                "prefix": route.prefix,
                "rewrite": route.rewrite.as_str(),
                "sample": { "from": sample, "to": route.upstream_path(&sample) },
                "forced_headers": header_names(route),
                "strip_cookie_domain": route.cookie_rules.strips_unmatched(),
            })
        })
        .collect();
    json!({
        "valid": true,
        "upstream": config.upstream.url,
        "connect_timeout_ms": config.upstream.connect_timeout,
        "response_timeout_ms": config.upstream.response_timeout,
        "routes": routes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{RewriteRule, Route};

    fn default_table() -> (Config, RouteTable) {
        let config = Config::default();
        let table = RouteTable::from_config(&config).unwrap();
        (config, table)
    }

    #[test]
    fn text_report_shows_sample_rewrites() {
        let (config, table) = default_table();
        let report = route_report(Path::new("pelo-proxy.yaml"), &config, &table);
        assert!(report.contains("pelo-proxy.yaml is valid"));
        assert!(report.contains("/api  -> strip_prefix"));
        assert!(report.contains("/api/workouts?limit=5 => /workouts?limit=5"));
        assert!(report.contains("/auth  -> canonicalize"));
        assert!(report.contains("/auth/workouts?limit=5 => /auth/workouts?limit=5"));
        assert!(report.contains("forced headers: origin, peloton-platform"));
        assert!(report.contains("cookie domain: strip"));
    }

    #[test]
    fn json_report_lists_resolved_routes_in_match_order() {
        let mut config = Config::default();
        config.routes.push(Route::new("/api/v2", RewriteRule::Preserve));
        let table = RouteTable::from_config(&config).unwrap();

        let report = route_json(&config, &table);
        assert_eq!(report["valid"], true);
        assert_eq!(report["routes"][0]["prefix"], "/api/v2");
        assert_eq!(report["routes"][0]["sample"]["to"], "/api/v2/workouts?limit=5");
        assert_eq!(report["routes"][1]["sample"]["to"], "/auth/workouts?limit=5");
        assert_eq!(report["routes"][2]["sample"]["to"], "/workouts?limit=5");
        assert_eq!(report["routes"][2]["strip_cookie_domain"], true);
    }

    #[test]
    fn error_json_carries_scope_and_suggestion() {
        let errors = vec![ValidationError {
            scope: "/api".into(),
            field: "prefix".into(),
            message: "duplicate prefix".into(),
            suggestion: Some("remove one of the routes".into()),
        }];
        let report = error_json(&errors);
        assert_eq!(report["valid"], false);
        assert_eq!(report["errors"][0]["scope"], "/api");
        assert_eq!(report["errors"][0]["suggestion"], "remove one of the routes");
    }

    #[test]
    fn missing_file_is_reported() {
        let args = ValidateArgs {
            config: "does/not/exist.yaml".into(),
            format: ValidateFormat::Text,
        };
        assert!(matches!(
            execute(&args),
            Err(ProxyError::ConfigFileNotFound { .. })
        ));
    }
}
