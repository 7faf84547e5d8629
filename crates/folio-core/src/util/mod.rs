//! Utility modules.

pub mod files;
pub mod text;
