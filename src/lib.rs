//! pelo-proxy is a reverse proxy for the Peloton API.
//!
//! It forwards browser traffic to a single fixed upstream
//! (`https://api.onepeloton.com`), rewriting paths, forcing the `Origin`
//! and `Peloton-Platform` headers, and stripping `Domain` attributes from
//! `Set-Cookie` so session cookies bind to the proxy's own host.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate).
//! - [`config`] -- Configuration model, file sources and validation. Loaded
//!   once at startup and immutable afterwards.
//! - [`error`] -- Crate error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Core forwarding: prefix routing, path rewriting, header
//!   and cookie transformation, the upstream client, and hook points.
//! - [`server`] -- Axum server setup, shared application state, HTTP client,
//!   and graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file formats |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod server;
