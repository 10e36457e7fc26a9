//! Declarative shell tools and prompt templates.
//!
//! Depend on this crate via `cargo add cmdforge`. It bundles the component
//! crates behind feature flags so hosts can pull in only what they serve.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use cmdforge::config::{ConfigSource, load};
//! use cmdforge::registry::{LocalDispatcher, Registry, register};
//!
//! let config = load(&ConfigSource::Path("tools.yaml".into()))?;
//! let registry = Registry::from_config(config)?;
//! let mut dispatcher = LocalDispatcher::new();
//! register(&registry, &mut dispatcher)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared descriptors and argument types.
pub use forge_primitives as primitives;

/// Command templates, process execution, and compiled tools (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use forge_tools as tools;

/// Prompt templates and renderers (enabled by `prompts` feature).
#[cfg(feature = "prompts")]
pub use forge_prompts as prompts;

/// Configuration loading and validation (enabled by `config` feature).
#[cfg(feature = "config")]
pub use forge_config as config;

/// Handler registry and dispatcher boundary (enabled by `registry` feature).
#[cfg(feature = "registry")]
pub use forge_registry as registry;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use forge_telemetry as telemetry;
