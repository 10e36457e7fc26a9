//! Validated, immutable description of one configured tool.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Declaration of a single command parameter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamSpec {
    name: String,
    description: String,
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
}

impl ParamSpec {
    /// Declares a parameter that must be supplied (or defaulted) on every call.
    #[must_use]
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, true)
    }

    /// Declares a parameter whose placeholder is elided when absent.
    #[must_use]
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, false)
    }

    /// Creates a parameter with explicit required-ness.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            default: None,
        }
    }

    /// Sets the value used when the caller supplies none.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns `true` when a value must be available at invocation time.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// A configured tool: a shell command template plus its parameter contract.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    command_template: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<ParamSpec>,
    #[serde(default)]
    uses_working_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    toolset: Option<String>,
}

impl ToolDescriptor {
    /// Starts building a [`ToolDescriptor`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] when the name is empty.
    pub fn builder(
        name: impl Into<String>,
        command_template: impl Into<String>,
    ) -> Result<ToolDescriptorBuilder> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: "tool name cannot be empty".into(),
            });
        }

        Ok(ToolDescriptorBuilder {
            name,
            description: String::new(),
            command_template: command_template.into(),
            parameters: Vec::new(),
            uses_working_dir: false,
            toolset: None,
        })
    }

    /// Returns the exposed tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the raw command template with `<<name>>` placeholders.
    #[must_use]
    pub fn command_template(&self) -> &str {
        &self.command_template
    }

    /// Returns the declared parameters in configuration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    /// Looks up a declared parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|spec| spec.name == name)
    }

    /// Returns `true` when the tool accepts a `working_dir` argument.
    #[must_use]
    pub const fn uses_working_dir(&self) -> bool {
        self.uses_working_dir
    }

    /// Returns the toolset this tool was declared in, if any.
    #[must_use]
    pub fn toolset(&self) -> Option<&str> {
        self.toolset.as_deref()
    }
}

/// Builder for [`ToolDescriptor`].
#[derive(Debug)]
pub struct ToolDescriptorBuilder {
    name: String,
    description: String,
    command_template: String,
    parameters: Vec<ParamSpec>,
    uses_working_dir: bool,
    toolset: Option<String>,
}

impl ToolDescriptorBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a parameter declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEntry`] when the name was already declared.
    pub fn parameter(mut self, spec: ParamSpec) -> Result<Self> {
        if self.parameters.iter().any(|p| p.name == spec.name) {
            return Err(Error::DuplicateEntry { name: spec.name });
        }
        self.parameters.push(spec);
        Ok(self)
    }

    /// Marks the tool as accepting a working directory.
    #[must_use]
    pub fn uses_working_dir(mut self, enabled: bool) -> Self {
        self.uses_working_dir = enabled;
        self
    }

    /// Records the toolset the tool belongs to.
    #[must_use]
    pub fn toolset(mut self, toolset: impl Into<String>) -> Self {
        self.toolset = Some(toolset.into());
        self
    }

    /// Consumes the builder and returns the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] when the description or command
    /// template is blank.
    pub fn build(self) -> Result<ToolDescriptor> {
        if self.description.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: format!("tool `{}` requires a description", self.name),
            });
        }
        if self.command_template.trim().is_empty() {
            return Err(Error::InvalidDescriptor {
                reason: format!("tool `{}` requires a command template", self.name),
            });
        }

        Ok(ToolDescriptor {
            name: self.name,
            description: self.description,
            command_template: self.command_template,
            parameters: self.parameters,
            uses_working_dir: self.uses_working_dir,
            toolset: self.toolset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_descriptor() {
        let tool = ToolDescriptor::builder("tail", "tail -n <<lines>> '<<file>>'")
            .unwrap()
            .description("Show the end of a file")
            .parameter(ParamSpec::required("file", "File to read"))
            .unwrap()
            .parameter(ParamSpec::optional("lines", "Line count").with_default("10"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(tool.name(), "tail");
        assert_eq!(tool.parameters().len(), 2);
        assert_eq!(tool.parameters()[0].name(), "file");
        assert!(tool.parameter("file").unwrap().is_required());
        assert_eq!(tool.parameter("lines").unwrap().default_value(), Some("10"));
        assert!(tool.parameter("missing").is_none());
        assert!(!tool.uses_working_dir());
    }

    #[test]
    fn rejects_duplicate_parameters() {
        let err = ToolDescriptor::builder("t", "echo")
            .unwrap()
            .parameter(ParamSpec::required("a", "first"))
            .unwrap()
            .parameter(ParamSpec::optional("a", "second"))
            .unwrap_err();
        assert_eq!(err, Error::DuplicateEntry { name: "a".into() });
    }

    #[test]
    fn requires_name_and_description() {
        assert!(ToolDescriptor::builder(" ", "echo").is_err());
        assert!(ToolDescriptor::builder("t", "echo").unwrap().build().is_err());
        assert!(
            ToolDescriptor::builder("t", "")
                .unwrap()
                .description("d")
                .build()
                .is_err()
        );
    }
}
