//! Folio Core: shared errors and utilities.
//!
//! This crate has no internal Folio dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`util`]: Text helpers and JSON snapshot file I/O

pub mod error;
pub mod util;

pub use error::{EmbeddingError, Error, Result};
pub use util::text::{head_truncate, is_blank};
