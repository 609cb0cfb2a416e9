//! Crate-level error types for pelo-proxy.
//!
//! [`ProxyError`] covers everything that can stop a command (config
//! loading, I/O, address parsing). [`ValidationError`] describes a single
//! config problem; a failed validation aggregates them into
//! [`ProxyError::ConfigValidation`]. Per-request forwarding failures live
//! in [`ForwardError`](crate::proxy::forward::ForwardError) instead, since
//! they never leave the request that caused them.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub scope: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}: {}", self.scope, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProxyError {
    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Config serialization failed: {0}")]
    ConfigSerialize(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUpstream(String),

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_includes_suggestion() {
        let err = ValidationError {
            scope: "routes[0]".into(),
            field: "prefix".into(),
            message: "prefix must start with '/'".into(),
            suggestion: Some("did you mean '/api'?".into()),
        };
        assert_eq!(
            err.to_string(),
            "  routes[0]: prefix: prefix must start with '/' (did you mean '/api'?)"
        );
    }

    #[test]
    fn config_validation_lists_every_error() {
        let err = ProxyError::ConfigValidation {
            errors: vec![
                ValidationError {
                    scope: "upstream".into(),
                    field: "url".into(),
                    message: "bad".into(),
                    suggestion: None,
                },
                ValidationError {
                    scope: "/api".into(),
                    field: "headers".into(),
                    message: "worse".into(),
                    suggestion: None,
                },
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("upstream: url: bad"));
        assert!(rendered.contains("/api: headers: worse"));
    }
}
