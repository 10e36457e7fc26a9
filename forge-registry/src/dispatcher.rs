//! The boundary between compiled handlers and whatever serves them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use forge_primitives::Arguments;
use forge_prompts::PromptHandler;
use forge_tools::ToolHandler;
use tracing::debug;

use crate::registry::{RegistryError, RegistryResult};

/// A tool as presented to a dispatcher.
#[derive(Clone)]
pub struct ToolEntry {
    /// Exposed tool name.
    pub name: String,
    /// Combined discovery description.
    pub description: String,
    /// Callable handler.
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A prompt as presented to a dispatcher.
#[derive(Clone)]
pub struct PromptEntry {
    /// Prompt name.
    pub name: String,
    /// Combined discovery description.
    pub description: String,
    /// Renderer.
    pub handler: Arc<dyn PromptHandler>,
}

impl fmt::Debug for PromptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registration surface of an outer protocol dispatcher.
pub trait Dispatcher {
    /// Exposes a tool to callers.
    ///
    /// # Errors
    ///
    /// Implementations reject names they already serve.
    fn add_tool(&mut self, entry: ToolEntry) -> RegistryResult<()>;

    /// Exposes a prompt to callers.
    ///
    /// # Errors
    ///
    /// Implementations reject names they already serve.
    fn add_prompt(&mut self, entry: PromptEntry) -> RegistryResult<()>;
}

/// In-process dispatcher that serves entries by name.
#[derive(Debug, Default)]
pub struct LocalDispatcher {
    tools: Vec<ToolEntry>,
    prompts: Vec<PromptEntry>,
    tool_index: HashMap<String, usize>,
    prompt_index: HashMap<String, usize>,
}

impl LocalDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists served tools in registration order.
    #[must_use]
    pub fn tools(&self) -> &[ToolEntry] {
        &self.tools
    }

    /// Lists served prompts in registration order.
    #[must_use]
    pub fn prompts(&self) -> &[PromptEntry] {
        &self.prompts
    }

    /// Calls a tool with string arguments.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTool`] when no tool has that name.
    pub async fn call_tool(&self, name: &str, arguments: Arguments) -> RegistryResult<String> {
        let entry = self
            .tool_index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| RegistryError::UnknownTool {
                name: name.to_owned(),
            })?;
        debug!(tool = %name, arguments = arguments.len(), "local tool call");
        Ok(entry.handler.invoke(arguments).await)
    }

    /// Calls a tool with a JSON object of arguments, as a remote caller
    /// would send them. Values that cannot be coerced are reported in the
    /// returned text.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTool`] when no tool has that name.
    pub async fn call_tool_json(
        &self,
        name: &str,
        arguments: &serde_json::Value,
    ) -> RegistryResult<String> {
        match Arguments::from_json(arguments) {
            Ok(arguments) => self.call_tool(name, arguments).await,
            Err(err) if self.tool_index.contains_key(name) => Ok(format!("Error: {err}")),
            Err(_) => Err(RegistryError::UnknownTool {
                name: name.to_owned(),
            }),
        }
    }

    /// Renders a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownPrompt`] when no prompt has that name.
    pub fn get_prompt(&self, name: &str, arguments: &Arguments) -> RegistryResult<String> {
        let entry = self
            .prompt_index
            .get(name)
            .map(|&i| &self.prompts[i])
            .ok_or_else(|| RegistryError::UnknownPrompt {
                name: name.to_owned(),
            })?;
        Ok(entry.handler.render(arguments))
    }
}

impl Dispatcher for LocalDispatcher {
    fn add_tool(&mut self, entry: ToolEntry) -> RegistryResult<()> {
        if self.tool_index.contains_key(&entry.name) {
            return Err(RegistryError::DuplicateTool { name: entry.name });
        }
        self.tool_index.insert(entry.name.clone(), self.tools.len());
        self.tools.push(entry);
        Ok(())
    }

    fn add_prompt(&mut self, entry: PromptEntry) -> RegistryResult<()> {
        if self.prompt_index.contains_key(&entry.name) {
            return Err(RegistryError::DuplicatePrompt { name: entry.name });
        }
        self.prompt_index.insert(entry.name.clone(), self.prompts.len());
        self.prompts.push(entry);
        Ok(())
    }
}
