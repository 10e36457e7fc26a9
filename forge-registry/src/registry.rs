//! Owned collection of compiled tools and prompts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use forge_config::ValidatedConfig;
use forge_primitives::Arguments;
use forge_prompts::{CompiledPrompt, PromptHandler};
use forge_tools::{CommandRunner, CompiledTool, ShellRunner, ToolHandler};
use thiserror::Error;
use tracing::{debug, info};

use crate::description::{prompt_description, tool_description};
use crate::dispatcher::{PromptEntry, ToolEntry};

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Default)]
struct Inner {
    tools: Vec<CompiledTool>,
    prompts: Vec<CompiledPrompt>,
    tool_index: HashMap<String, usize>,
    prompt_index: HashMap<String, usize>,
}

/// Registry that owns every compiled handler, keyed by exposed name.
///
/// Registration order is preserved for listing.
pub struct Registry {
    runner: Arc<dyn CommandRunner>,
    inner: RwLock<Inner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_runner(Arc::new(ShellRunner::default()))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("registry poisoned");
        let tools: Vec<_> = inner.tools.iter().map(CompiledTool::name).collect();
        let prompts: Vec<_> = inner.prompts.iter().map(CompiledPrompt::name).collect();
        f.debug_struct("Registry")
            .field("tools", &tools)
            .field("prompts", &prompts)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an empty registry whose tools run through the platform shell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose tools run through `runner`.
    #[must_use]
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Compiles and registers everything in a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] or
    /// [`RegistryError::DuplicatePrompt`] on a name collision.
    pub fn from_config(config: ValidatedConfig) -> RegistryResult<Self> {
        let registry = Self::new();
        registry.load(config)?;
        Ok(registry)
    }

    /// Like [`Registry::from_config`], with a custom command runner.
    ///
    /// # Errors
    ///
    /// See [`Registry::from_config`].
    pub fn from_config_with_runner(
        config: ValidatedConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> RegistryResult<Self> {
        let registry = Self::with_runner(runner);
        registry.load(config)?;
        Ok(registry)
    }

    fn load(&self, config: ValidatedConfig) -> RegistryResult<()> {
        for descriptor in config.tools {
            self.register_tool(CompiledTool::with_runner(descriptor, Arc::clone(&self.runner)))?;
        }
        for descriptor in config.prompts {
            self.register_prompt(CompiledPrompt::new(descriptor))?;
        }
        Ok(())
    }

    /// Registers a compiled tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if the name is already present.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register_tool(&self, tool: CompiledTool) -> RegistryResult<()> {
        let mut inner = self.inner.write().expect("registry poisoned");
        let name = tool.name().to_owned();
        if inner.tool_index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool { name });
        }

        info!(tool = %name, toolset = ?tool.descriptor().toolset(), "tool registered");
        let index = inner.tools.len();
        inner.tools.push(tool);
        inner.tool_index.insert(name, index);
        Ok(())
    }

    /// Registers a compiled prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicatePrompt`] if the name is already present.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register_prompt(&self, prompt: CompiledPrompt) -> RegistryResult<()> {
        let mut inner = self.inner.write().expect("registry poisoned");
        let name = prompt.name().to_owned();
        if inner.prompt_index.contains_key(&name) {
            return Err(RegistryError::DuplicatePrompt { name });
        }

        info!(prompt = %name, "prompt registered");
        let index = inner.prompts.len();
        inner.prompts.push(prompt);
        inner.prompt_index.insert(name, index);
        Ok(())
    }

    /// Returns the tool registered under `name`.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<CompiledTool> {
        let inner = self.inner.read().expect("registry poisoned");
        inner.tool_index.get(name).map(|&i| inner.tools[i].clone())
    }

    /// Returns the prompt registered under `name`.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn prompt(&self, name: &str) -> Option<CompiledPrompt> {
        let inner = self.inner.read().expect("registry poisoned");
        inner.prompt_index.get(name).map(|&i| inner.prompts[i].clone())
    }

    /// Invokes a registered tool directly.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTool`] when no tool has that name.
    /// Failures inside the tool are reported in the returned text.
    pub async fn invoke_tool(&self, name: &str, arguments: Arguments) -> RegistryResult<String> {
        let tool = self.tool(name).ok_or_else(|| RegistryError::UnknownTool {
            name: name.to_owned(),
        })?;
        debug!(tool = %name, "dispatching tool call");
        Ok(tool.invoke(arguments).await)
    }

    /// Renders a registered prompt directly.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownPrompt`] when no prompt has that name.
    pub fn render_prompt(&self, name: &str, arguments: &Arguments) -> RegistryResult<String> {
        let prompt = self.prompt(name).ok_or_else(|| RegistryError::UnknownPrompt {
            name: name.to_owned(),
        })?;
        Ok(prompt.render(arguments))
    }

    /// Lists tool names in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn tool_names(&self) -> Vec<String> {
        let inner = self.inner.read().expect("registry poisoned");
        inner.tools.iter().map(|tool| tool.name().to_owned()).collect()
    }

    /// Lists prompt names in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn prompt_names(&self) -> Vec<String> {
        let inner = self.inner.read().expect("registry poisoned");
        inner.prompts.iter().map(|prompt| prompt.name().to_owned()).collect()
    }

    /// Builds the dispatcher entries for every tool.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn tool_entries(&self) -> Vec<ToolEntry> {
        let inner = self.inner.read().expect("registry poisoned");
        inner
            .tools
            .iter()
            .map(|tool| ToolEntry {
                name: tool.name().to_owned(),
                description: tool_description(tool.descriptor()),
                handler: Arc::new(tool.clone()) as Arc<dyn ToolHandler>,
            })
            .collect()
    }

    /// Builds the dispatcher entries for every prompt.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn prompt_entries(&self) -> Vec<PromptEntry> {
        let inner = self.inner.read().expect("registry poisoned");
        inner
            .prompts
            .iter()
            .map(|prompt| PromptEntry {
                name: prompt.name().to_owned(),
                description: prompt_description(prompt.descriptor()),
                handler: Arc::new(prompt.clone()) as Arc<dyn PromptHandler>,
            })
            .collect()
    }
}

/// Errors produced by registration and lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// Prompt name collided with an existing registration.
    #[error("prompt `{name}` is already registered")]
    DuplicatePrompt {
        /// Name of the offending prompt.
        name: String,
    },

    /// Requested tool does not exist.
    #[error("tool `{name}` is not registered")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// Requested prompt does not exist.
    #[error("prompt `{name}` is not registered")]
    UnknownPrompt {
        /// Name of the missing prompt.
        name: String,
    },
}
