//! Hands a registry's contents to a dispatcher.

use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::registry::{Registry, RegistryResult};

/// Exposes every tool and prompt in `registry` through `dispatcher`.
///
/// Tools go first, then prompts, each in registration order. Returns the
/// number of entries handed over.
///
/// # Errors
///
/// Stops at and returns the first error reported by the dispatcher.
pub fn register<D>(registry: &Registry, dispatcher: &mut D) -> RegistryResult<usize>
where
    D: Dispatcher + ?Sized,
{
    let tools = registry.tool_entries();
    let prompts = registry.prompt_entries();
    let (tool_count, prompt_count) = (tools.len(), prompts.len());

    for entry in tools {
        dispatcher.add_tool(entry)?;
    }
    for entry in prompts {
        dispatcher.add_prompt(entry)?;
    }

    info!(
        tools = tool_count,
        prompts = prompt_count,
        "handlers exposed to dispatcher"
    );
    Ok(tool_count + prompt_count)
}
