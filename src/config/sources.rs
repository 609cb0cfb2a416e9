//! File-format sources for [`Config`].
//!
//! Provides [`parse_config_str`] for format-specific deserialization
//! (YAML, JSON, TOML, gated by feature flags), [`load_file`] for the async
//! read-parse-validate pipeline, and [`serialize_config`] used by
//! `pelo-proxy init`.

use std::path::Path;

use crate::cli::ConfigFormat;
use crate::config::model::Config;
use crate::config::validation::validate;
use crate::error::ProxyError;

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, ProxyError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => parse_yaml(content, path_display),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| ProxyError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| ProxyError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(ProxyError::UnsupportedFormat(other.to_string())),
    }
}

// serde_yml rejects an empty document, but an empty file should mean
// "all defaults" like `{}` does for JSON.
#[cfg(feature = "yaml")]
fn parse_yaml(content: &str, path_display: &str) -> Result<Config, ProxyError> {
    let has_content = content
        .lines()
        .map(str::trim)
        .any(|l| !l.is_empty() && !l.starts_with('#') && l != "---");
    if !has_content {
        return Ok(Config::default());
    }
    serde_yml::from_str(content).map_err(|e| ProxyError::ConfigParse {
        path: path_display.to_string(),
        source: Box::new(e),
    })
}

/// Read, parse and validate a config file.
pub async fn load_file(path: &Path) -> Result<Config, ProxyError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProxyError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ProxyError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(errors) = validate(&config) {
        return Err(ProxyError::ConfigValidation { errors });
    }
    Ok(config)
}

/// Serialize a `Config` to a formatted string in the given format.
pub fn serialize_config(config: &Config, format: &ConfigFormat) -> Result<String, ProxyError> {
    match format {
        #[cfg(feature = "yaml")]
        ConfigFormat::Yaml => {
            serde_yml::to_string(config).map_err(|e| ProxyError::ConfigSerialize(e.to_string()))
        }

        #[cfg(not(feature = "yaml"))]
        ConfigFormat::Yaml => Err(ProxyError::UnsupportedFormat("yaml".into())),

        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| ProxyError::ConfigSerialize(e.to_string())),

        #[cfg(feature = "toml")]
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| ProxyError::ConfigSerialize(e.to_string())),

        #[cfg(not(feature = "toml"))]
        ConfigFormat::Toml => Err(ProxyError::UnsupportedFormat("toml".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RewriteRule;

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_overrides_selected_fields() {
        let yaml = r#"
upstream:
  url: "http://localhost:9000"
routes:
  - prefix: "/v2"
    rewrite: preserve
"#;
        let config = parse_config_str("yaml", yaml, "test.yaml").unwrap();
        assert_eq!(config.upstream.url, "http://localhost:9000");
        assert_eq!(config.upstream.response_timeout, 30_000);
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].rewrite, RewriteRule::Preserve);
        assert_eq!(config.defaults.headers.len(), 2);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn empty_yaml_is_default() {
        let config = parse_config_str("yaml", "# nothing here\n", "empty.yaml").unwrap();
        assert_eq!(config.routes.len(), 2);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_round_trips_defaults() {
        let rendered = serialize_config(&Config::default(), &ConfigFormat::Yaml).unwrap();
        let parsed = parse_config_str("yaml", &rendered, "rendered.yaml").unwrap();
        assert_eq!(parsed.routes.len(), 2);
        assert_eq!(parsed.defaults.cookie_domain_rewrite[".onepeloton.com"], "");
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let result = parse_config_str("ini", "", "x.ini");
        assert!(matches!(result, Err(ProxyError::UnsupportedFormat(ext)) if ext == "ini"));
    }
}
