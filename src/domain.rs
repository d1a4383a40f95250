//! Domain types for the scene dialect.
//!
//! This module contains the dialect separator model, the custom tag
//! registry, and conversion configuration.

/// Dialect document separator lines.
pub mod separator;
pub use separator::{InstanceIdPolicy, Separator, SeparatorError};

/// Custom tag identifiers and their resolution.
pub mod tag;
pub use tag::{TagRegistry, TagResolution, canonical_tag};

mod config;
pub use config::Config;
