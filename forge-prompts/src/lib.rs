//! Prompt rendering for declaratively configured prompts.
//!
//! Templates understand exactly two constructs: `{{name}}` variables and
//! `{{#if name}} ... {{else}} ... {{/if}}` conditional blocks. There are no
//! loops, expressions, or nested conditionals.

#![warn(missing_docs, clippy::pedantic)]

pub mod handler;
pub mod template;

pub use handler::{CompiledPrompt, PromptHandler};
pub use template::{PromptTemplate, TemplateError, TemplateResult, is_variable_name, render};
