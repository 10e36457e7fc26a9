//! Binds a tool descriptor to the template engine and a command runner.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use forge_primitives::{Arguments, InvocationResult, ToolDescriptor};
use tracing::{debug, warn};

use crate::executor::{CommandRunner, ShellRunner, run_to_text};
use crate::template;

/// Name of the implicit argument accepted by tools with `uses_working_dir`.
pub const WORKING_DIR_PARAMETER: &str = "working_dir";

/// Callable surface shared by every compiled tool.
///
/// Implementations must never fail past their own boundary: every problem is
/// reported in the returned text.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Invokes the tool with the caller's argument values.
    async fn invoke(&self, arguments: Arguments) -> String;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Send + Sync + Fn(Arguments) -> Fut,
    Fut: Future<Output = String> + Send,
{
    async fn invoke(&self, arguments: Arguments) -> String {
        (self)(arguments).await
    }
}

/// Final command string plus the directory it should run in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedCommand {
    /// Command text handed to the shell.
    pub command: String,
    /// Directory to run in, when the tool accepts one and a value was given.
    pub working_dir: Option<PathBuf>,
}

/// A descriptor bound to a [`CommandRunner`].
///
/// Holds no per-call state; each invocation repeats validation and
/// substitution, so one instance may serve many concurrent calls.
#[derive(Clone)]
pub struct CompiledTool {
    descriptor: Arc<ToolDescriptor>,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for CompiledTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledTool")
            .field("name", &self.descriptor.name())
            .field("command_template", &self.descriptor.command_template())
            .finish_non_exhaustive()
    }
}

/// Compiles a descriptor into a handler that runs commands with the platform shell.
#[must_use]
pub fn compile(descriptor: ToolDescriptor) -> CompiledTool {
    CompiledTool::with_runner(descriptor, Arc::new(ShellRunner::default()))
}

impl CompiledTool {
    /// Compiles a descriptor with a custom runner.
    #[must_use]
    pub fn with_runner(descriptor: ToolDescriptor, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            runner,
        }
    }

    /// Returns the descriptor this handler was compiled from.
    #[must_use]
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Returns the exposed tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Validates the arguments and produces the command to run.
    ///
    /// # Errors
    ///
    /// Propagates [`InvocationError`](forge_primitives::InvocationError) from
    /// the template engine for missing or unknown parameters.
    pub fn prepare(&self, arguments: &Arguments) -> InvocationResult<PreparedCommand> {
        let descriptor = &*self.descriptor;
        let mut arguments = arguments.clone();

        let working_dir = if !descriptor.uses_working_dir() {
            None
        } else if let Some(spec) = descriptor.parameter(WORKING_DIR_PARAMETER) {
            arguments
                .get(WORKING_DIR_PARAMETER)
                .filter(|dir| !dir.is_empty())
                .or_else(|| spec.default_value())
                .map(str::to_owned)
        } else {
            arguments.remove(WORKING_DIR_PARAMETER)
        };

        let command = template::substitute(
            descriptor.command_template(),
            &arguments,
            descriptor.parameters(),
        )?;

        Ok(PreparedCommand {
            command,
            working_dir: working_dir.filter(|dir| !dir.is_empty()).map(PathBuf::from),
        })
    }
}

#[async_trait]
impl ToolHandler for CompiledTool {
    async fn invoke(&self, arguments: Arguments) -> String {
        let prepared = match self.prepare(&arguments) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(tool = %self.name(), error = %err, "rejected tool invocation");
                return format!("Error: {err}");
            }
        };

        debug!(tool = %self.name(), command = %prepared.command, "invoking tool");
        run_to_text(
            &*self.runner,
            &prepared.command,
            prepared.working_dir.as_deref(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::Mutex;

    use forge_primitives::ParamSpec;

    use crate::executor::{ExecutionError, ExecutionResult};

    /// Records commands instead of running them.
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<(String, Option<PathBuf>)>>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(
            &self,
            command: &str,
            working_dir: Option<&Path>,
        ) -> Result<ExecutionResult, ExecutionError> {
            self.calls
                .lock()
                .unwrap()
                .push((command.to_owned(), working_dir.map(Path::to_path_buf)));
            Ok(ExecutionResult {
                stdout: format!("ran: {command}"),
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    fn find_tool(uses_working_dir: bool) -> ToolDescriptor {
        ToolDescriptor::builder("find-files", "find . -name '<<pattern>>' <<depth>>")
            .unwrap()
            .description("Find files")
            .parameter(ParamSpec::required("pattern", "Glob"))
            .unwrap()
            .parameter(ParamSpec::optional("depth", "Depth flag"))
            .unwrap()
            .uses_working_dir(uses_working_dir)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn invokes_runner_with_substituted_command() {
        let runner = Arc::new(RecordingRunner::default());
        let tool = CompiledTool::with_runner(find_tool(false), runner.clone());

        let output = tool
            .invoke(Arguments::new().with("pattern", "*.rs"))
            .await;

        assert_eq!(output, "ran: find . -name '*.rs' ");
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, None);
    }

    #[tokio::test]
    async fn invocation_errors_become_text_and_skip_execution() {
        let runner = Arc::new(RecordingRunner::default());
        let tool = CompiledTool::with_runner(find_tool(false), runner.clone());

        let output = tool.invoke(Arguments::new()).await;
        assert_eq!(output, "Error: missing required parameter `pattern`");

        let output = tool
            .invoke(Arguments::new().with("pattern", "x").with("bogus", "1"))
            .await;
        assert_eq!(output, "Error: unknown parameter `bogus`");

        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn implicit_working_dir_is_routed_to_runner() {
        let runner = Arc::new(RecordingRunner::default());
        let tool = CompiledTool::with_runner(find_tool(true), runner.clone());

        let output = tool
            .invoke(
                Arguments::new()
                    .with("pattern", "*.md")
                    .with(WORKING_DIR_PARAMETER, "/srv/docs"),
            )
            .await;

        assert_eq!(output, "ran: find . -name '*.md' ");
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].1.as_deref(), Some(Path::new("/srv/docs")));
    }

    #[test]
    fn working_dir_is_unknown_when_not_enabled() {
        let tool = compile(find_tool(false));
        let err = tool
            .prepare(
                &Arguments::new()
                    .with("pattern", "x")
                    .with(WORKING_DIR_PARAMETER, "/tmp"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("working_dir"));
    }

    #[test]
    fn declared_working_dir_is_also_substituted() {
        let descriptor = ToolDescriptor::builder("ls", "ls <<working_dir>>")
            .unwrap()
            .description("List")
            .parameter(ParamSpec::optional(WORKING_DIR_PARAMETER, "Dir").with_default("."))
            .unwrap()
            .uses_working_dir(true)
            .build()
            .unwrap();
        let tool = compile(descriptor);

        let prepared = tool.prepare(&Arguments::new()).unwrap();
        assert_eq!(prepared.command, "ls .");
        assert_eq!(prepared.working_dir, Some(PathBuf::from(".")));

        let prepared = tool
            .prepare(&Arguments::new().with(WORKING_DIR_PARAMETER, ""))
            .unwrap();
        assert_eq!(prepared.command, "ls .");
        assert_eq!(prepared.working_dir, Some(PathBuf::from(".")));

        let prepared = tool
            .prepare(&Arguments::new().with(WORKING_DIR_PARAMETER, "/srv"))
            .unwrap();
        assert_eq!(prepared.command, "ls /srv");
        assert_eq!(prepared.working_dir, Some(PathBuf::from("/srv")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_tool_reports_output_and_failures() {
        let echo = ToolDescriptor::builder("echo", "echo <<msg>>")
            .unwrap()
            .description("Echo")
            .parameter(ParamSpec::required("msg", "Message"))
            .unwrap()
            .build()
            .unwrap();
        let tool = compile(echo);
        assert_eq!(tool.invoke(Arguments::new().with("msg", "ok")).await, "ok\n");

        let failing = ToolDescriptor::builder("cat", "cat <<path>>")
            .unwrap()
            .description("Read")
            .parameter(ParamSpec::required("path", "File"))
            .unwrap()
            .build()
            .unwrap();
        let output = compile(failing)
            .invoke(Arguments::new().with("path", "/definitely/not/here"))
            .await;
        assert!(output.starts_with("Error executing command (exit code 1)"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn handler_serves_concurrent_calls() {
        let tool = Arc::new(compile(
            ToolDescriptor::builder("echo", "echo <<msg>>")
                .unwrap()
                .description("Echo")
                .parameter(ParamSpec::required("msg", "Message"))
                .unwrap()
                .build()
                .unwrap(),
        ));

        let calls = (0..8).map(|i| {
            let tool = Arc::clone(&tool);
            async move { tool.invoke(Arguments::new().with("msg", i.to_string())).await }
        });
        let outputs = futures::future::join_all(calls).await;

        for (i, output) in outputs.iter().enumerate() {
            assert_eq!(output, &format!("{i}\n"));
        }
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let handler = |args: Arguments| async move { format!("{} args", args.len()) };
        assert_eq!(handler.invoke(Arguments::new().with("a", "1")).await, "1 args");
    }
}
