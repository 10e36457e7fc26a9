//! Validation of raw configuration trees into typed descriptors.
//!
//! The expected shape is:
//!
//! ```yaml
//! tools:
//!   <name>:
//!     description: <text>
//!     execution:
//!       command: <template with <<param>> placeholders>
//!       uses_working_dir: <bool, optional>
//!     parameters:
//!       <param>: { description: <text>, required: <bool>, default: <scalar, optional> }
//! toolsets:
//!   <set>:
//!     description: <text, optional>
//!     tools: { <name>: <tool as above> }
//! prompts:
//!   <name>:
//!     description: <text>
//!     template: <text with {{arg}} and {{#if arg}}...{{/if}}>
//!     arguments:
//!       <arg>: { description: <text>, required: <bool> }
//! ```

use std::collections::HashSet;
use std::fmt;

use forge_primitives::{ArgSpec, ParamSpec, PromptDescriptor, ToolDescriptor};
use forge_prompts::{PromptTemplate, is_variable_name};
use forge_tools::template::{is_placeholder_name, placeholders};
use serde_yaml::{Mapping, Value};

use crate::error::{ConfigValidationError, Defect, EntryKind, ValidationResult};

/// Non-fatal finding reported alongside a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Kind of entry the warning concerns.
    pub kind: EntryKind,
    /// Entry name.
    pub name: String,
    /// Human-readable explanation.
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`: {}", self.kind, self.name, self.message)
    }
}

/// Descriptors produced from one configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Tools, top-level first, then toolset members, in document order.
    pub tools: Vec<ToolDescriptor>,
    /// Prompts in document order.
    pub prompts: Vec<PromptDescriptor>,
    /// Lint findings such as declared-but-unused parameters.
    pub warnings: Vec<ValidationWarning>,
}

/// Validates a configuration tree and builds its descriptors.
///
/// # Errors
///
/// Returns the first [`ConfigValidationError`] encountered; nothing is
/// partially accepted.
pub fn validate(root: &Value) -> ValidationResult<ValidatedConfig> {
    let root = root.as_mapping().ok_or(ConfigValidationError::NotAMapping)?;

    let tools = section(root, "tools")?;
    let toolsets = section(root, "toolsets")?;
    let prompts = section(root, "prompts")?;
    if tools.is_none() && toolsets.is_none() && prompts.is_none() {
        return Err(ConfigValidationError::NothingDefined);
    }

    let mut config = ValidatedConfig::default();
    let mut tool_names = HashSet::new();

    for (key, entry) in tools.into_iter().flatten() {
        let name = entry_name(EntryKind::Tool, key)?;
        let tool = tool_descriptor(&name, None, entry, &mut config.warnings)?;
        claim(&mut tool_names, EntryKind::Tool, tool.name())?;
        config.tools.push(tool);
    }

    for (key, entry) in toolsets.into_iter().flatten() {
        let set_name = entry_name(EntryKind::Toolset, key)?;
        let set = entry.as_mapping().ok_or_else(|| {
            ConfigValidationError::invalid(
                EntryKind::Toolset,
                &set_name,
                Defect::NotAMapping {
                    field: set_name.clone(),
                },
            )
        })?;
        let members = match set.get("tools") {
            None | Some(Value::Null) => None,
            Some(Value::Mapping(members)) => Some(members),
            Some(_) => {
                return Err(ConfigValidationError::invalid(
                    EntryKind::Toolset,
                    &set_name,
                    Defect::NotAMapping {
                        field: "tools".into(),
                    },
                ));
            }
        };

        for (key, entry) in members.into_iter().flatten() {
            let tool_name = entry_name(EntryKind::Tool, key)?;
            let exposed = exposed_tool_name(&set_name, &tool_name);
            let tool = tool_descriptor(&exposed, Some(&set_name), entry, &mut config.warnings)?;
            claim(&mut tool_names, EntryKind::Tool, tool.name())?;
            config.tools.push(tool);
        }
    }

    let mut prompt_names = HashSet::new();
    for (key, entry) in prompts.into_iter().flatten() {
        let name = entry_name(EntryKind::Prompt, key)?;
        let prompt = prompt_descriptor(&name, entry, &mut config.warnings)?;
        claim(&mut prompt_names, EntryKind::Prompt, prompt.name())?;
        config.prompts.push(prompt);
    }

    Ok(config)
}

/// Name under which a toolset member is exposed.
///
/// Members are prefixed with their toolset (`set-tool`) unless the member
/// shares the toolset's name.
#[must_use]
pub fn exposed_tool_name(toolset: &str, tool: &str) -> String {
    if toolset == tool {
        tool.to_owned()
    } else {
        format!("{toolset}-{tool}")
    }
}

fn section<'a>(root: &'a Mapping, name: &'static str) -> ValidationResult<Option<&'a Mapping>> {
    match root.get(name) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(empty_mapping())),
        Some(Value::Mapping(mapping)) => Ok(Some(mapping)),
        Some(_) => Err(ConfigValidationError::InvalidSection { section: name }),
    }
}

fn empty_mapping() -> &'static Mapping {
    static EMPTY: std::sync::OnceLock<Mapping> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Mapping::new)
}

fn entry_name(kind: EntryKind, key: &Value) -> ValidationResult<String> {
    match key {
        Value::String(name) if !name.trim().is_empty() => Ok(name.clone()),
        Value::String(name) => Err(ConfigValidationError::invalid(
            kind,
            name.clone(),
            Defect::EmptyField {
                field: "name".into(),
            },
        )),
        other => Err(ConfigValidationError::invalid(
            kind,
            scalar_text(other).unwrap_or_else(|| "<non-scalar>".into()),
            Defect::InvalidName,
        )),
    }
}

fn claim(seen: &mut HashSet<String>, kind: EntryKind, name: &str) -> ValidationResult<()> {
    if seen.insert(name.to_owned()) {
        Ok(())
    } else {
        Err(ConfigValidationError::invalid(
            kind,
            name,
            Defect::DuplicateName(kind),
        ))
    }
}

/// Field accessors that attribute every problem to one entry.
struct Entry<'a> {
    kind: EntryKind,
    name: &'a str,
    fields: &'a Mapping,
}

impl<'a> Entry<'a> {
    fn new(kind: EntryKind, name: &'a str, value: &'a Value) -> ValidationResult<Self> {
        let fields = value.as_mapping().ok_or_else(|| {
            ConfigValidationError::invalid(
                kind,
                name,
                Defect::NotAMapping {
                    field: name.to_owned(),
                },
            )
        })?;
        Ok(Self { kind, name, fields })
    }

    fn fail(&self, defect: Defect) -> ConfigValidationError {
        ConfigValidationError::invalid(self.kind, self.name, defect)
    }

    fn required_text(&self, mapping: &'a Mapping, field: &str) -> ValidationResult<&'a str> {
        match mapping.get(field) {
            None | Some(Value::Null) => Err(self.fail(Defect::MissingField {
                field: field.to_owned(),
            })),
            Some(Value::String(text)) => Ok(text),
            Some(_) => Err(self.fail(Defect::WrongType {
                field: field.to_owned(),
                expected: "a string",
            })),
        }
    }

    fn non_empty_text(&self, mapping: &'a Mapping, field: &str) -> ValidationResult<&'a str> {
        let text = self.required_text(mapping, field)?;
        if text.trim().is_empty() {
            return Err(self.fail(Defect::EmptyField {
                field: field.to_owned(),
            }));
        }
        Ok(text)
    }

    fn optional_mapping(&self, mapping: &'a Mapping, field: &str) -> ValidationResult<Option<&'a Mapping>> {
        match mapping.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Mapping(inner)) => Ok(Some(inner)),
            Some(_) => Err(self.fail(Defect::NotAMapping {
                field: field.to_owned(),
            })),
        }
    }

    fn required_mapping(&self, mapping: &'a Mapping, field: &str) -> ValidationResult<&'a Mapping> {
        self.optional_mapping(mapping, field)?.ok_or_else(|| {
            self.fail(Defect::MissingField {
                field: field.to_owned(),
            })
        })
    }

    fn flag(&self, mapping: &Mapping, field: &str) -> ValidationResult<Option<bool>> {
        match mapping.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(_) => Err(self.fail(Defect::WrongType {
                field: field.to_owned(),
                expected: "a boolean",
            })),
        }
    }

    /// Iterates a `name → { description, required, ... }` block, yielding the
    /// member name, its fields, and its explicit required flag.
    fn members(
        &self,
        block: &'a str,
    ) -> ValidationResult<Vec<(String, &'a Mapping, bool)>> {
        let Some(members) = self.optional_mapping(self.fields, block)? else {
            return Ok(Vec::new());
        };

        let mut out = Vec::with_capacity(members.len());
        for (key, value) in members {
            let Value::String(member) = key else {
                return Err(self.fail(Defect::InvalidName));
            };
            let path = format!("{block}.{member}");
            let fields = value
                .as_mapping()
                .ok_or_else(|| self.fail(Defect::NotAMapping { field: path.clone() }))?;

            self.required_text(fields, "description").map_err(|err| prefix(err, &path))?;
            let required = self
                .flag(fields, "required")
                .map_err(|err| prefix(err, &path))?
                .ok_or_else(|| {
                    self.fail(Defect::MissingField {
                        field: format!("{path}.required"),
                    })
                })?;
            out.push((member.clone(), fields, required));
        }
        Ok(out)
    }
}

/// Rewrites a field-level defect so its path is relative to the entry.
fn prefix(err: ConfigValidationError, path: &str) -> ConfigValidationError {
    let ConfigValidationError::Invalid { kind, name, defect } = err else {
        return err;
    };
    let defect = match defect {
        Defect::MissingField { field } => Defect::MissingField {
            field: format!("{path}.{field}"),
        },
        Defect::WrongType { field, expected } => Defect::WrongType {
            field: format!("{path}.{field}"),
            expected,
        },
        other => other,
    };
    ConfigValidationError::Invalid { kind, name, defect }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn tool_descriptor(
    name: &str,
    toolset: Option<&str>,
    value: &Value,
    warnings: &mut Vec<ValidationWarning>,
) -> ValidationResult<ToolDescriptor> {
    let entry = Entry::new(EntryKind::Tool, name, value)?;
    let description = entry.non_empty_text(entry.fields, "description")?;

    let execution = entry.required_mapping(entry.fields, "execution")?;
    let command_field = if !execution.contains_key("command") && execution.contains_key("command_template") {
        "command_template"
    } else {
        "command"
    };
    let command = entry
        .non_empty_text(execution, command_field)
        .map_err(|err| prefix(err, "execution"))?;
    let uses_working_dir = entry
        .flag(execution, "uses_working_dir")
        .map_err(|err| prefix(err, "execution"))?
        .unwrap_or(false);

    let mut builder = ToolDescriptor::builder(name, command)
        .map_err(|err| entry.fail(err.into()))?
        .description(description)
        .uses_working_dir(uses_working_dir);
    if let Some(toolset) = toolset {
        builder = builder.toolset(toolset);
    }

    for (param, fields, required) in entry.members("parameters")? {
        if !is_placeholder_name(&param) {
            return Err(entry.fail(Defect::UnreferenceableName { name: param }));
        }
        let default = match fields.get("default") {
            None | Some(Value::Null) => None,
            Some(value) => Some(scalar_text(value).ok_or_else(|| {
                entry.fail(Defect::WrongType {
                    field: format!("parameters.{param}.default"),
                    expected: "a scalar",
                })
            })?),
        };
        let description = fields
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut spec = ParamSpec::new(param, description, required);
        if let Some(default) = default {
            spec = spec.with_default(default);
        }
        builder = builder.parameter(spec).map_err(|err| entry.fail(err.into()))?;
    }

    let tool = builder.build().map_err(|err| entry.fail(err.into()))?;

    let used = placeholders(tool.command_template());
    if let Some(dangling) = used.iter().find(|token| tool.parameter(token).is_none()) {
        return Err(entry.fail(Defect::DanglingPlaceholder {
            name: (*dangling).to_owned(),
        }));
    }
    for spec in tool.parameters() {
        if !used.contains(&spec.name()) && !is_working_dir(&tool, spec) {
            warnings.push(ValidationWarning {
                kind: EntryKind::Tool,
                name: tool.name().to_owned(),
                message: format!(
                    "parameter `{}` is declared but never used in the command template",
                    spec.name()
                ),
            });
        }
    }

    Ok(tool)
}

/// A declared `working_dir` is consumed by the executor even when the
/// template never mentions it.
fn is_working_dir(tool: &ToolDescriptor, spec: &ParamSpec) -> bool {
    tool.uses_working_dir() && spec.name() == forge_tools::WORKING_DIR_PARAMETER
}

fn prompt_descriptor(
    name: &str,
    value: &Value,
    warnings: &mut Vec<ValidationWarning>,
) -> ValidationResult<PromptDescriptor> {
    let entry = Entry::new(EntryKind::Prompt, name, value)?;
    let description = entry.non_empty_text(entry.fields, "description")?;
    let template = entry.non_empty_text(entry.fields, "template")?;
    let parsed = PromptTemplate::parse(template).map_err(|err| entry.fail(err.into()))?;

    let mut builder = PromptDescriptor::builder(name, template)
        .map_err(|err| entry.fail(err.into()))?
        .description(description);
    for (arg, fields, required) in entry.members("arguments")? {
        if !is_variable_name(&arg) {
            return Err(entry.fail(Defect::UnreferenceableName { name: arg }));
        }
        let description = fields
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        builder = builder
            .argument(ArgSpec::new(arg, description, required))
            .map_err(|err| entry.fail(err.into()))?;
    }
    let prompt = builder.build().map_err(|err| entry.fail(err.into()))?;

    let referenced = parsed.references();
    if let Some(dangling) = referenced.iter().find(|r| prompt.argument(r).is_none()) {
        return Err(entry.fail(Defect::DanglingVariable {
            name: (*dangling).to_owned(),
        }));
    }
    for spec in prompt.arguments() {
        if !referenced.contains(&spec.name()) {
            warnings.push(ValidationWarning {
                kind: EntryKind::Prompt,
                name: prompt.name().to_owned(),
                message: format!(
                    "argument `{}` is declared but never used in the template",
                    spec.name()
                ),
            });
        }
    }

    Ok(prompt)
}
