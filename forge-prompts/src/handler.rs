//! Prompt handlers exposed to the dispatcher.

use std::sync::Arc;

use forge_primitives::{Arguments, InvocationResult, PromptDescriptor};
use tracing::warn;

use crate::template;

/// Callable surface shared by every prompt renderer.
///
/// Rendering is pure and never fails past this boundary; problems are
/// reported in the returned text.
pub trait PromptHandler: Send + Sync {
    /// Renders the prompt with the caller's argument values.
    fn render(&self, arguments: &Arguments) -> String;
}

impl<F> PromptHandler for F
where
    F: Fn(&Arguments) -> String + Send + Sync,
{
    fn render(&self, arguments: &Arguments) -> String {
        (self)(arguments)
    }
}

/// A prompt descriptor ready to be rendered on each call.
#[derive(Clone, Debug)]
pub struct CompiledPrompt {
    descriptor: Arc<PromptDescriptor>,
}

impl CompiledPrompt {
    /// Wraps a validated descriptor.
    #[must_use]
    pub fn new(descriptor: PromptDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
        }
    }

    /// Returns the underlying descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &PromptDescriptor {
        &self.descriptor
    }

    /// Returns the prompt name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Renders the prompt, surfacing invocation errors to the caller.
    ///
    /// # Errors
    ///
    /// See [`template::render`].
    pub fn try_render(&self, arguments: &Arguments) -> InvocationResult<String> {
        template::render(
            self.descriptor.template(),
            arguments,
            self.descriptor.arguments(),
        )
    }
}

impl PromptHandler for CompiledPrompt {
    fn render(&self, arguments: &Arguments) -> String {
        self.try_render(arguments).unwrap_or_else(|err| {
            warn!(prompt = %self.name(), error = %err, "rejected prompt render");
            format!("Error: {err}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use forge_primitives::ArgSpec;

    fn review_prompt() -> CompiledPrompt {
        CompiledPrompt::new(
            PromptDescriptor::builder(
                "review",
                "Review {{path}}.{{#if focus}} Focus on {{focus}}.{{/if}}",
            )
            .unwrap()
            .description("Code review")
            .argument(ArgSpec::required("path", "File"))
            .unwrap()
            .argument(ArgSpec::optional("focus", "Area"))
            .unwrap()
            .build()
            .unwrap(),
        )
    }

    #[test]
    fn renders_through_handler() {
        let prompt = review_prompt();
        let args = Arguments::new().with("path", "lib.rs").with("focus", "errors");
        assert_eq!(prompt.render(&args), "Review lib.rs. Focus on errors.");
        assert_eq!(
            prompt.render(&Arguments::new().with("path", "lib.rs")),
            "Review lib.rs."
        );
    }

    #[test]
    fn errors_are_returned_as_text() {
        let prompt = review_prompt();
        assert_eq!(
            prompt.render(&Arguments::new()),
            "Error: missing required argument `path`"
        );
        assert!(prompt.try_render(&Arguments::new()).is_err());
    }

    #[test]
    fn closures_are_handlers() {
        let handler = |args: &Arguments| format!("{} args", args.len());
        assert_eq!(PromptHandler::render(&handler, &Arguments::new()), "0 args");
    }
}
