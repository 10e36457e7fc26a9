//! Prompt templates with `{{variable}}` substitution and conditional blocks.

use std::fmt;

use forge_primitives::{ArgSpec, Arguments, InvocationError, InvocationResult};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Result alias for template parsing.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Syntax errors in a prompt template.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A conditional was opened inside another conditional.
    #[error("conditional `{inner}` is nested inside conditional `{outer}`")]
    NestedConditional {
        /// Name tested by the enclosing block.
        outer: String,
        /// Name tested by the nested block.
        inner: String,
    },

    /// A conditional was never closed with `{{/if}}`.
    #[error("conditional `{name}` is missing its closing {{{{/if}}}}")]
    UnterminatedConditional {
        /// Name tested by the open block.
        name: String,
    },

    /// `{{/if}}` appeared with no open conditional.
    #[error("{{{{/if}}}} without a matching {{{{#if}}}}")]
    UnexpectedEndIf,

    /// `{{else}}` appeared with no open conditional.
    #[error("{{{{else}}}} outside of a conditional block")]
    UnexpectedElse,

    /// A conditional contained more than one `{{else}}`.
    #[error("conditional `{name}` has more than one {{{{else}}}}")]
    DuplicateElse {
        /// Name tested by the block.
        name: String,
    },

    /// `{{#if ...}}` did not name a single argument.
    #[error("malformed conditional tag `{tag}`")]
    MalformedConditional {
        /// Raw tag text between the braces.
        tag: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Text(String),
    Variable(String),
    Conditional {
        name: String,
        then: Vec<Segment>,
        otherwise: Vec<Segment>,
    },
}

enum Tag {
    Variable(String),
    If(String),
    Else,
    EndIf,
}

struct OpenBlock {
    name: String,
    then: Vec<Segment>,
    otherwise: Option<Vec<Segment>>,
}

impl OpenBlock {
    fn branch(&mut self) -> &mut Vec<Segment> {
        match &mut self.otherwise {
            Some(otherwise) => otherwise,
            None => &mut self.then,
        }
    }
}

/// A parsed prompt template.
///
/// # Examples
///
/// ```
/// use forge_primitives::Arguments;
/// use forge_prompts::PromptTemplate;
///
/// let template = PromptTemplate::parse("Hi {{name}}{{#if loud}}!!!{{/if}}").unwrap();
/// let args = Arguments::new().with("name", "Sam").with("loud", "yes");
/// assert_eq!(template.render_with(&args), "Hi Sam!!!");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parses template text in a single left-to-right scan.
    ///
    /// Brace sequences that do not form a recognised tag are kept as text.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] for nested, unterminated, or stray
    /// conditional tags.
    pub fn parse(source: impl Into<String>) -> TemplateResult<Self> {
        let source = source.into();
        let mut segments = Vec::new();
        let mut open: Option<OpenBlock> = None;
        let mut cursor = 0;
        let mut text_start = 0;

        while let Some(offset) = source[cursor..].find(OPEN) {
            let start = cursor + offset;
            let Some((tag, len)) = read_tag(&source[start..])? else {
                cursor = start + 1;
                continue;
            };

            push_text(target(&mut segments, &mut open), &source[text_start..start]);
            match tag {
                Tag::Variable(name) => {
                    target(&mut segments, &mut open).push(Segment::Variable(name));
                }
                Tag::If(name) => {
                    if let Some(block) = &open {
                        return Err(TemplateError::NestedConditional {
                            outer: block.name.clone(),
                            inner: name,
                        });
                    }
                    open = Some(OpenBlock {
                        name,
                        then: Vec::new(),
                        otherwise: None,
                    });
                }
                Tag::Else => {
                    let block = open.as_mut().ok_or(TemplateError::UnexpectedElse)?;
                    if block.otherwise.is_some() {
                        return Err(TemplateError::DuplicateElse {
                            name: block.name.clone(),
                        });
                    }
                    block.otherwise = Some(Vec::new());
                }
                Tag::EndIf => {
                    let block = open.take().ok_or(TemplateError::UnexpectedEndIf)?;
                    segments.push(Segment::Conditional {
                        name: block.name,
                        then: block.then,
                        otherwise: block.otherwise.unwrap_or_default(),
                    });
                }
            }

            cursor = start + len;
            text_start = cursor;
        }

        if let Some(block) = open {
            return Err(TemplateError::UnterminatedConditional { name: block.name });
        }
        push_text(&mut segments, &source[text_start..]);

        Ok(Self { source, segments })
    }

    /// Returns the original template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns every argument name the template references, as a variable or
    /// a condition, in order of first appearance.
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_references(&self.segments, &mut names);
        names
    }

    /// Renders the template against the supplied values.
    ///
    /// A conditional keeps its first branch when its argument is present and
    /// non-empty, otherwise its `{{else}}` branch (or nothing). Variables
    /// without a value render as empty text. Inserted values are never parsed
    /// again.
    #[must_use]
    pub fn render_with(&self, provided: &Arguments) -> String {
        let mut output = String::with_capacity(self.source.len());
        render_segments(&self.segments, provided, &mut output);
        output
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Renders `template` after checking the values against the declared arguments.
///
/// # Errors
///
/// Returns [`InvocationError::MissingRequiredArgument`] when a required
/// argument is absent, [`InvocationError::UnknownArgument`] when an undeclared
/// name is supplied, and [`InvocationError::Template`] when the template does
/// not parse.
pub fn render(template: &str, provided: &Arguments, specs: &[ArgSpec]) -> InvocationResult<String> {
    if let Some(missing) = specs
        .iter()
        .find(|spec| spec.is_required() && !provided.contains(spec.name()))
    {
        return Err(InvocationError::MissingRequiredArgument {
            name: missing.name().to_owned(),
        });
    }

    if let Some(unknown) = provided
        .names()
        .find(|name| !specs.iter().any(|spec| spec.name() == *name))
    {
        return Err(InvocationError::UnknownArgument {
            name: unknown.to_owned(),
        });
    }

    let parsed = PromptTemplate::parse(template).map_err(|err| InvocationError::Template {
        reason: err.to_string(),
    })?;
    Ok(parsed.render_with(provided))
}

/// Returns `true` when `text` can be referenced as `{{text}}` or
/// `{{#if text}}`.
#[must_use]
pub fn is_variable_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
}

/// Reads the tag at the start of `text`, which begins with `{{`.
///
/// Returns `Ok(None)` when the braces do not form a tag.
fn read_tag(text: &str) -> TemplateResult<Option<(Tag, usize)>> {
    let body = &text[OPEN.len()..];
    let Some(close) = body.find(CLOSE) else {
        return Ok(None);
    };
    let raw = &body[..close];
    let inner = raw.trim();
    let len = OPEN.len() + close + CLOSE.len();

    let conditional = inner
        .strip_prefix("#if")
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));

    let tag = if let Some(rest) = conditional {
        let name = rest.trim();
        if !is_variable_name(name) {
            return Err(TemplateError::MalformedConditional {
                tag: raw.to_owned(),
            });
        }
        Tag::If(name.to_owned())
    } else if inner == "/if" {
        Tag::EndIf
    } else if inner == "else" {
        Tag::Else
    } else if is_variable_name(inner) {
        Tag::Variable(inner.to_owned())
    } else {
        return Ok(None);
    };

    Ok(Some((tag, len)))
}

fn target<'a>(root: &'a mut Vec<Segment>, open: &'a mut Option<OpenBlock>) -> &'a mut Vec<Segment> {
    match open {
        Some(block) => block.branch(),
        None => root,
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_owned()));
    }
}

fn add_reference<'a>(name: &'a str, names: &mut Vec<&'a str>) {
    if !names.contains(&name) {
        names.push(name);
    }
}

fn collect_references<'a>(segments: &'a [Segment], names: &mut Vec<&'a str>) {
    for segment in segments {
        match segment {
            Segment::Text(_) => {}
            Segment::Variable(name) => add_reference(name, names),
            Segment::Conditional {
                name,
                then,
                otherwise,
            } => {
                add_reference(name, names);
                collect_references(then, names);
                collect_references(otherwise, names);
            }
        }
    }
}

fn render_segments(segments: &[Segment], provided: &Arguments, output: &mut String) {
    for segment in segments {
        match segment {
            Segment::Text(text) => output.push_str(text),
            Segment::Variable(name) => output.push_str(provided.get(name).unwrap_or_default()),
            Segment::Conditional {
                name,
                then,
                otherwise,
            } => {
                let truthy = provided.get(name).is_some_and(|value| !value.is_empty());
                render_segments(if truthy { then } else { otherwise }, provided, output);
            }
        }
    }
}
