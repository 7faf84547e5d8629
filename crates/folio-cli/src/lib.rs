//! Command-line interface for Folio.
//!
//! The `folio` binary exposes critique chains, feedback revision, the
//! knowledge library and context retrieval over JSON snapshots kept in the
//! configured data directory.
//!
//! # Modules
//!
//! - [`cli`]: clap argument definitions
//! - [`config`]: `FolioConfig` loading via confyg
//! - [`services`]: Service wiring and snapshot persistence
//! - [`lock`]: Advisory data directory lock held across load and save
//! - [`commands`]: Command handlers returning JSON
//! - [`app`]: Logging setup and dispatch

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;
pub mod lock;
pub mod services;

pub use app::FolioCli;
pub use cli::CliArgs;
pub use config::FolioConfig;
pub use services::Services;
