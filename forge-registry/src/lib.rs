//! Ownership of compiled handlers and their hand-off to a protocol dispatcher.
//!
//! A [`Registry`] is built once from a validated configuration and owns every
//! compiled tool and prompt. [`register`] exposes its contents to any
//! [`Dispatcher`] as `(name, description, handler)` entries; the bundled
//! [`LocalDispatcher`] serves them in-process.

#![warn(missing_docs, clippy::pedantic)]

pub mod adapter;
pub mod description;
pub mod dispatcher;
pub mod registry;

pub use adapter::register;
pub use description::{prompt_description, tool_description};
pub use dispatcher::{Dispatcher, LocalDispatcher, PromptEntry, ToolEntry};
pub use registry::{Registry, RegistryError, RegistryResult};
