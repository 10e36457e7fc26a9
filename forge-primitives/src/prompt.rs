//! Validated, immutable description of one configured prompt.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Declaration of a single prompt argument.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArgSpec {
    name: String,
    description: String,
    required: bool,
}

impl ArgSpec {
    /// Declares an argument that must be supplied on every render.
    #[must_use]
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, true)
    }

    /// Declares an argument that renders as empty text when absent.
    #[must_use]
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, false)
    }

    /// Creates an argument with explicit required-ness.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
        }
    }

    /// Returns the argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns `true` when a value must be supplied.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// A configured prompt: text template plus its argument contract.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptDescriptor {
    name: String,
    description: String,
    template: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    arguments: Vec<ArgSpec>,
}

impl PromptDescriptor {
    /// Starts building a [`PromptDescriptor`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] when the name is empty.
    pub fn builder(
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<PromptDescriptorBuilder> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: "prompt name cannot be empty".into(),
            });
        }

        Ok(PromptDescriptorBuilder {
            name,
            description: String::new(),
            template: template.into(),
            arguments: Vec::new(),
        })
    }

    /// Returns the prompt name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the declared arguments in configuration order.
    #[must_use]
    pub fn arguments(&self) -> &[ArgSpec] {
        &self.arguments
    }

    /// Looks up a declared argument by name.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&ArgSpec> {
        self.arguments.iter().find(|spec| spec.name == name)
    }
}

/// Builder for [`PromptDescriptor`].
#[derive(Debug)]
pub struct PromptDescriptorBuilder {
    name: String,
    description: String,
    template: String,
    arguments: Vec<ArgSpec>,
}

impl PromptDescriptorBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends an argument declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEntry`] when the name was already declared.
    pub fn argument(mut self, spec: ArgSpec) -> Result<Self> {
        if self.arguments.iter().any(|a| a.name == spec.name) {
            return Err(Error::DuplicateEntry { name: spec.name });
        }
        self.arguments.push(spec);
        Ok(self)
    }

    /// Consumes the builder and returns the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] when the description is blank.
    pub fn build(self) -> Result<PromptDescriptor> {
        if self.description.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: format!("prompt `{}` requires a description", self.name),
            });
        }

        Ok(PromptDescriptor {
            name: self.name,
            description: self.description,
            template: self.template,
            arguments: self.arguments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_prompt() {
        let prompt = PromptDescriptor::builder("greet", "Hi {{name}}")
            .unwrap()
            .description("Greets someone")
            .argument(ArgSpec::required("name", "Who to greet"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(prompt.template(), "Hi {{name}}");
        assert!(prompt.argument("name").unwrap().is_required());
        assert!(prompt.argument("nobody").is_none());
    }

    #[test]
    fn description_is_required() {
        let result = PromptDescriptor::builder("greet", "Hi").unwrap().build();
        assert!(result.is_err());
    }
}
