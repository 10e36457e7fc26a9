//! Compilation and execution of declaratively configured shell tools.
//!
//! A [`ToolDescriptor`](forge_primitives::ToolDescriptor) is compiled into a
//! [`CompiledTool`](compiler::CompiledTool): a data structure holding the
//! template and parameter contract, dispatched through one generic handler.
//! Each invocation substitutes `<<name>>` placeholders, runs the resulting
//! string through the system shell, and reports the outcome as text.
//!
//! Substituted values are inserted verbatim. Templates may use shell
//! operators on purpose, which also means a caller-controlled value can
//! inject shell syntax; only expose tools to callers you would trust with
//! the underlying commands.

#![warn(missing_docs, clippy::pedantic)]

pub mod compiler;
pub mod executor;
pub mod template;

pub use compiler::{CompiledTool, PreparedCommand, ToolHandler, WORKING_DIR_PARAMETER, compile};
pub use executor::{CommandRunner, ExecutionError, ExecutionResult, ShellRunner};
