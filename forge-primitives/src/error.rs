//! Shared error definitions for descriptors and invocations.

use thiserror::Error;

/// Result alias used when constructing primitive types.
pub type Result<T> = std::result::Result<T, Error>;

/// Result alias used by handlers while preparing an invocation.
pub type InvocationResult<T> = std::result::Result<T, InvocationError>;

/// Errors that can occur while building descriptors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Descriptor failed validation.
    #[error("invalid descriptor: {reason}")]
    InvalidDescriptor {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A parameter or argument name was declared twice on one descriptor.
    #[error("`{name}` is declared more than once")]
    DuplicateEntry {
        /// The repeated name.
        name: String,
    },
}

/// Errors raised per invocation, before any command runs.
///
/// Handlers never propagate these past their own boundary; they are rendered
/// into the invocation's result text instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvocationError {
    /// A required tool parameter had no value and no default.
    #[error("missing required parameter `{name}`")]
    MissingRequiredParameter {
        /// Name of the missing parameter.
        name: String,
    },

    /// A required prompt argument had no value.
    #[error("missing required argument `{name}`")]
    MissingRequiredArgument {
        /// Name of the missing argument.
        name: String,
    },

    /// A value was supplied for a parameter the tool does not declare.
    #[error("unknown parameter `{name}`")]
    UnknownParameter {
        /// Name supplied by the caller.
        name: String,
    },

    /// A value was supplied for an argument the prompt does not declare.
    #[error("unknown argument `{name}`")]
    UnknownArgument {
        /// Name supplied by the caller.
        name: String,
    },

    /// A supplied value could not be interpreted as text.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidArgumentValue {
        /// Name of the offending argument.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The prompt template itself is malformed.
    #[error("template error: {reason}")]
    Template {
        /// Description of the syntax problem.
        reason: String,
    },
}
