//! Core shared types for declaratively configured tools and prompts.

#![warn(missing_docs, clippy::pedantic)]

mod arguments;
mod descriptor;
mod error;
mod prompt;

/// Caller-supplied argument values for a single invocation.
pub use arguments::Arguments;
/// Tool descriptors and their parameter specifications.
pub use descriptor::{ParamSpec, ToolDescriptor, ToolDescriptorBuilder};
/// Error types and result alias shared across the workspace.
pub use error::{Error, InvocationError, InvocationResult, Result};
/// Prompt descriptors and their argument specifications.
pub use prompt::{ArgSpec, PromptDescriptor, PromptDescriptorBuilder};
