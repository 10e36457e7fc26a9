//! Configuration management for declaratively defined tools and prompts.
//!
//! [`validate`] turns a raw configuration tree into typed descriptors and is
//! free of side effects. [`loader`] reads that tree from a file, an inline
//! string, or the environment, then validates it.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod validate;

pub use error::{ConfigValidationError, Defect, EntryKind, ValidationResult};
pub use loader::{ConfigSource, LoadError, LoadResult, load};
pub use validate::{ValidatedConfig, ValidationWarning, validate};
