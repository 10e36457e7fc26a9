use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cmdforge::config::{ConfigSource, ConfigValidationError, Defect, EntryKind, LoadError, load};
use cmdforge::primitives::Arguments;
use cmdforge::registry::{LocalDispatcher, Registry, register};
use cmdforge::tools::{CommandRunner, ExecutionError, ExecutionResult};
use serde_json::json;

const CONFIG: &str = r#"
tools:
  echo:
    description: Print a message
    execution:
      command: "echo <<msg>>"
    parameters:
      msg:
        description: Message to print
        required: true
  find-in:
    description: Find files under a directory
    execution:
      command: "find '<<dir>>' <<extra>>"
    parameters:
      dir: { description: Directory, required: true }
      extra: { description: Extra flags, required: false }
toolsets:
  fs:
    description: File system helpers
    tools:
      list:
        description: List the working directory
        execution:
          command: ls
          uses_working_dir: true
      fs:
        description: Fail loudly
        execution:
          command: "echo not found >&2; exit 1"
prompts:
  greet:
    description: Greeting
    template: "Hi {{name}}{{#if loud}}!!!{{/if}}"
    arguments:
      name: { description: Who, required: true }
      loud: { description: Shout, required: false }
  review:
    description: Code review
    template: "Review {{path}}.{{#if focus}} Focus on {{focus}}.{{else}} General pass.{{/if}}"
    arguments:
      path: { description: File, required: true }
      focus: { description: Area, required: false }
"#;

/// Answers every command with the command text itself.
#[derive(Default)]
struct Recorder {
    commands: Mutex<Vec<String>>,
}

#[async_trait]
impl CommandRunner for Recorder {
    async fn run(
        &self,
        command: &str,
        _working_dir: Option<&Path>,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.commands.lock().unwrap().push(command.to_owned());
        Ok(ExecutionResult {
            stdout: command.to_owned(),
            stderr: String::new(),
            exit_code: 0,
        })
    }
}

fn dispatcher_with(registry: &Registry) -> LocalDispatcher {
    let mut dispatcher = LocalDispatcher::new();
    register(registry, &mut dispatcher).unwrap();
    dispatcher
}

#[tokio::test]
async fn configuration_flows_to_dispatcher() {
    let config = load(&ConfigSource::Yaml(CONFIG.to_owned())).unwrap();
    assert!(config.warnings.is_empty());

    let recorder = Arc::new(Recorder::default());
    let registry = Registry::from_config_with_runner(config, recorder.clone()).unwrap();
    let dispatcher = dispatcher_with(&registry);

    let tools: Vec<_> = dispatcher.tools().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tools, ["echo", "find-in", "fs-list", "fs"]);
    let prompts: Vec<_> = dispatcher.prompts().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(prompts, ["greet", "review"]);

    let output = dispatcher
        .call_tool("echo", Arguments::new().with("msg", "hi"))
        .await
        .unwrap();
    assert_eq!(output, "echo hi");

    let output = dispatcher
        .call_tool("find-in", Arguments::new().with("dir", "/tmp"))
        .await
        .unwrap();
    assert_eq!(output, "find '/tmp' ");

    let output = dispatcher
        .call_tool_json("find-in", &json!({ "dir": "/srv", "extra": "-maxdepth 1" }))
        .await
        .unwrap();
    assert_eq!(output, "find '/srv' -maxdepth 1");

    assert_eq!(recorder.commands.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn invocation_errors_are_text_and_never_execute() {
    let config = load(&ConfigSource::Yaml(CONFIG.to_owned())).unwrap();
    let recorder = Arc::new(Recorder::default());
    let registry = Registry::from_config_with_runner(config, recorder.clone()).unwrap();
    let dispatcher = dispatcher_with(&registry);

    let output = dispatcher.call_tool("echo", Arguments::new()).await.unwrap();
    assert_eq!(output, "Error: missing required parameter `msg`");

    let output = dispatcher
        .call_tool("echo", Arguments::new().with("msg", "x").with("volume", "11"))
        .await
        .unwrap();
    assert_eq!(output, "Error: unknown parameter `volume`");

    assert!(recorder.commands.lock().unwrap().is_empty());
}

#[test]
fn prompts_render_through_dispatcher() {
    let registry = Registry::from_config(load(&ConfigSource::Yaml(CONFIG.to_owned())).unwrap()).unwrap();
    let dispatcher = dispatcher_with(&registry);

    let quiet = Arguments::new().with("name", "Sam").with("loud", "");
    assert_eq!(dispatcher.get_prompt("greet", &quiet).unwrap(), "Hi Sam");

    let loud = Arguments::new().with("name", "Sam").with("loud", "yes");
    assert_eq!(dispatcher.get_prompt("greet", &loud).unwrap(), "Hi Sam!!!");

    assert_eq!(
        dispatcher
            .get_prompt("review", &Arguments::new().with("path", "main.rs"))
            .unwrap(),
        "Review main.rs. General pass."
    );
    assert_eq!(
        dispatcher.get_prompt("greet", &Arguments::new()).unwrap(),
        "Error: missing required argument `name`"
    );

    let description = &dispatcher.prompts()[0].description;
    assert!(description.contains("- name [REQUIRED]: Who"));
}

#[cfg(unix)]
#[tokio::test]
async fn shell_execution_end_to_end() {
    let registry = Registry::from_config(load(&ConfigSource::Yaml(CONFIG.to_owned())).unwrap()).unwrap();
    let dispatcher = dispatcher_with(&registry);

    let output = dispatcher
        .call_tool("echo", Arguments::new().with("msg", "ok"))
        .await
        .unwrap();
    assert_eq!(output, "ok\n");

    let output = dispatcher.call_tool("fs", Arguments::new()).await.unwrap();
    assert!(output.contains("exit code 1"), "{output}");
    assert!(output.contains("not found"), "{output}");

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "").unwrap();
    let output = dispatcher
        .call_tool(
            "fs-list",
            Arguments::new().with("working_dir", dir.path().to_string_lossy()),
        )
        .await
        .unwrap();
    assert_eq!(output, "marker.txt\n");

    let missing = dir.path().join("gone");
    let output = dispatcher
        .call_tool(
            "fs-list",
            Arguments::new().with("working_dir", missing.to_string_lossy()),
        )
        .await
        .unwrap();
    assert_eq!(
        output,
        format!("Error: Working directory does not exist: {}", missing.display())
    );
}

#[cfg(unix)]
#[tokio::test]
async fn concurrent_invocations_are_independent() {
    let registry = Registry::from_config(load(&ConfigSource::Yaml(CONFIG.to_owned())).unwrap()).unwrap();
    let dispatcher = dispatcher_with(&registry);

    let calls = (0..10).map(|i| {
        let dispatcher = &dispatcher;
        async move {
            dispatcher
                .call_tool("echo", Arguments::new().with("msg", format!("call-{i}")))
                .await
                .unwrap()
        }
    });
    let outputs = futures::future::join_all(calls).await;

    for (i, output) in outputs.into_iter().enumerate() {
        assert_eq!(output, format!("call-{i}\n"));
    }
}

#[test]
fn dangling_placeholder_is_rejected_at_load() {
    let yaml = r#"
tools:
  remove:
    description: Remove a file
    execution:
      command: "rm <<path>>"
"#;
    let err = load(&ConfigSource::Yaml(yaml.to_owned())).unwrap_err();
    match err {
        LoadError::Validation(ConfigValidationError::Invalid { kind, name, defect }) => {
            assert_eq!(kind, EntryKind::Tool);
            assert_eq!(name, "remove");
            assert_eq!(defect, Defect::DanglingPlaceholder { name: "path".into() });
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_tool_names_are_rejected_at_load() {
    let yaml = r"
tools:
  git-log:
    description: Log
    execution: { command: git log }
toolsets:
  git:
    tools:
      log:
        description: Log again
        execution: { command: git log -1 }
";
    let err = load(&ConfigSource::Yaml(yaml.to_owned())).unwrap_err();
    assert!(
        matches!(
            &err,
            LoadError::Validation(ConfigValidationError::Invalid {
                defect: Defect::DuplicateName(EntryKind::Tool),
                ..
            })
        ),
        "{err}"
    );
}

#[test]
fn json_configuration_is_equivalent() {
    let yaml: serde_yaml::Value = serde_yaml::from_str(CONFIG).unwrap();
    let json = serde_json::to_string(&yaml).unwrap();

    let from_yaml = load(&ConfigSource::Yaml(CONFIG.to_owned())).unwrap();
    let from_json = load(&ConfigSource::Json(json)).unwrap();
    assert_eq!(from_yaml, from_json);
}
