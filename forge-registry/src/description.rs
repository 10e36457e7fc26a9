//! Discovery text shown to remote callers.
//!
//! These descriptions are documentation only; nothing dispatches on them.

use std::fmt::Write as _;

use forge_primitives::{ParamSpec, PromptDescriptor, ToolDescriptor};
use forge_tools::WORKING_DIR_PARAMETER;

/// Builds the combined description of a tool.
///
/// The text has a `TOOL DESCRIPTION` section, the `COMMAND CALLED`, a
/// `PARAMETERS` table when the tool takes any, and `IMPORTANT NOTES` when the
/// command looks like it deletes, moves, or writes data.
#[must_use]
pub fn tool_description(tool: &ToolDescriptor) -> String {
    let mut lines = vec![
        "TOOL DESCRIPTION:".to_owned(),
        String::new(),
        tool.description().trim().to_owned(),
        String::new(),
        "COMMAND CALLED:".to_owned(),
        String::new(),
        format!("`{}`", tool.command_template()),
    ];

    if let Some(first) = tool.parameters().first()
        && tool.command_template().contains("<<")
    {
        lines.push(String::new());
        lines.push(format!(
            "Text like <<parameter_name>> (e.g. <<{}>>) will be replaced with parameter values.",
            first.name()
        ));
    }

    let implicit_working_dir =
        tool.uses_working_dir() && tool.parameter(WORKING_DIR_PARAMETER).is_none();
    if !tool.parameters().is_empty() || implicit_working_dir {
        lines.push(String::new());
        lines.push("PARAMETERS:".to_owned());
        lines.push(String::new());
        lines.extend(tool.parameters().iter().map(parameter_line));
        if implicit_working_dir {
            lines.push(format!(
                "- {WORKING_DIR_PARAMETER} [OPTIONAL] (string, directory path): Directory to run the command in"
            ));
        }
    }

    let notes = side_effect_notes(tool.command_template());
    if !notes.is_empty() {
        lines.push(String::new());
        lines.push("IMPORTANT NOTES:".to_owned());
        lines.push(String::new());
        lines.extend(notes.into_iter().map(str::to_owned));
    }

    lines.join("\n")
}

/// Builds the combined description of a prompt: its own description followed
/// by an `ARGUMENTS` table when it takes any.
#[must_use]
pub fn prompt_description(prompt: &PromptDescriptor) -> String {
    let mut text = prompt.description().trim().to_owned();
    if prompt.arguments().is_empty() {
        return text;
    }

    text.push_str("\n\nARGUMENTS:\n");
    for arg in prompt.arguments() {
        let _ = write!(
            text,
            "\n- {} {}: {}",
            arg.name(),
            requirement(arg.is_required()),
            arg.description()
        );
    }
    text
}

fn parameter_line(spec: &ParamSpec) -> String {
    let mut line = format!("- {} {}", spec.name(), requirement(spec.is_required()));
    if let Some(hint) = type_hint(spec.name()) {
        line.push(' ');
        line.push_str(hint);
    }
    let _ = write!(line, ": {}", spec.description());
    if let Some(default) = spec.default_value() {
        let _ = write!(line, " (default: `{default}`)");
    }
    line
}

fn requirement(required: bool) -> &'static str {
    if required { "[REQUIRED]" } else { "[OPTIONAL]" }
}

/// Guesses a value shape from the parameter name.
fn type_hint(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|needle| name.contains(needle));

    if has(&["file", "path"]) {
        Some("(string, file path)")
    } else if has(&["pattern", "glob"]) {
        Some("(string, glob pattern)")
    } else if has(&["number", "count", "limit"]) {
        Some("(integer)")
    } else if has(&["enabled", "flag"]) {
        Some("(boolean)")
    } else if has(&["url"]) {
        Some("(string, URL)")
    } else {
        None
    }
}

fn side_effect_notes(command: &str) -> Vec<&'static str> {
    let command = command.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|needle| command.contains(needle));

    let mut notes = Vec::new();
    if has(&["rm ", "remove ", "delete "]) {
        notes.push("- This command can DELETE files or data. Use with caution.");
    }
    if has(&["mv ", "move "]) {
        notes.push("- This command can MOVE files or data. Verify paths are correct.");
    }
    if has(&["write ", "create ", "touch ", " > ", " >> "]) {
        notes.push("- This command can CREATE or MODIFY files or data.");
    }
    notes
}
