//! Validation error types.

use std::fmt;

use forge_prompts::TemplateError;
use thiserror::Error;

/// Result alias for configuration validation.
pub type ValidationResult<T> = Result<T, ConfigValidationError>;

/// Kind of configuration entry an error or warning refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// An entry under `tools` or inside a toolset.
    Tool,
    /// An entry under `toolsets`.
    Toolset,
    /// An entry under `prompts`.
    Prompt,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tool => "tool",
            Self::Toolset => "toolset",
            Self::Prompt => "prompt",
        })
    }
}

/// What exactly is wrong with a configuration entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Defect {
    /// The entry (or a nested field) is not a mapping.
    #[error("`{field}` must be a mapping")]
    NotAMapping {
        /// Dotted path of the field, relative to the entry.
        field: String,
    },

    /// A mandatory field is absent.
    #[error("missing `{field}`")]
    MissingField {
        /// Dotted path of the field, relative to the entry.
        field: String,
    },

    /// A field holds a value of the wrong type.
    #[error("`{field}` must be {expected}")]
    WrongType {
        /// Dotted path of the field, relative to the entry.
        field: String,
        /// Description of the accepted type.
        expected: &'static str,
    },

    /// A field that must carry text is blank.
    #[error("`{field}` must not be empty")]
    EmptyField {
        /// Dotted path of the field, relative to the entry.
        field: String,
    },

    /// The command template uses `<<name>>` without declaring `name`.
    #[error("placeholder `<<{name}>>` has no matching parameter")]
    DanglingPlaceholder {
        /// Name inside the placeholder.
        name: String,
    },

    /// The prompt template references `name` without declaring it.
    #[error("template references `{name}` but no such argument is declared")]
    DanglingVariable {
        /// Referenced name.
        name: String,
    },

    /// The prompt template does not parse.
    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),

    /// Another entry already claimed this name.
    #[error("name is already used by another {0}")]
    DuplicateName(EntryKind),

    /// The descriptor could not be constructed.
    #[error(transparent)]
    Descriptor(#[from] forge_primitives::Error),

    /// A parameter or argument name that no template could ever reference.
    #[error("`{name}` cannot be referenced from a template")]
    UnreferenceableName {
        /// Declared name.
        name: String,
    },

    /// A key in the configuration is not a string.
    #[error("entry names must be strings")]
    InvalidName,
}

/// Fatal configuration problem detected before any handler is registered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// The document root is not a mapping.
    #[error("configuration root must be a mapping")]
    NotAMapping,

    /// None of the recognised top-level sections is present.
    #[error("configuration must define at least one of `tools`, `toolsets`, or `prompts`")]
    NothingDefined,

    /// A top-level section is not a mapping.
    #[error("`{section}` must be a mapping of names to definitions")]
    InvalidSection {
        /// Name of the section.
        section: &'static str,
    },

    /// A specific tool, toolset, or prompt is invalid.
    #[error("{kind} `{name}`: {defect}")]
    Invalid {
        /// Kind of entry.
        kind: EntryKind,
        /// Entry name as written (exposed name for tools).
        name: String,
        /// The specific problem.
        defect: Defect,
    },
}

impl ConfigValidationError {
    pub(crate) fn invalid(kind: EntryKind, name: impl Into<String>, defect: Defect) -> Self {
        Self::Invalid {
            kind,
            name: name.into(),
            defect,
        }
    }

    /// Returns the offending entry name, if the error concerns one.
    #[must_use]
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::Invalid { name, .. } => Some(name),
            _ => None,
        }
    }
}
