//! `pelo-proxy init`: write the built-in configuration to a file.
//!
//! Serializes [`Config::default`] in the chosen format so the defaults
//! can be edited instead of written from scratch.

use std::path::PathBuf;

use crate::cli::InitArgs;
use crate::config::model::Config;
use crate::config::sources::serialize_config;
use crate::error::ProxyError;

const HEADER: &str = "# pelo-proxy config. Every field is optional; omitted fields use these defaults.\n";

pub fn execute(args: &InitArgs) -> Result<(), ProxyError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("pelo-proxy.{}", args.format.extension())));

    if output.exists() {
        return Err(ProxyError::FileExists { path: output });
    }

    std::fs::write(&output, render(args)?)?;
    println!("Created {}", output.display());
    Ok(())
}

fn render(args: &InitArgs) -> Result<String, ProxyError> {
    let body = serialize_config(&Config::default(), &args.format)?;
    // JSON has no comments
    Ok(match args.format {
        crate::cli::ConfigFormat::Json => body,
        _ => format!("{HEADER}\n{body}"),
    })
}
