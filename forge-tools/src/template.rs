//! `<<name>>` placeholder substitution for command templates.

use forge_primitives::{Arguments, InvocationError, InvocationResult, ParamSpec};

const OPEN: &str = "<<";
const CLOSE: &str = ">>";

/// A placeholder occurrence inside a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Token<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

fn is_name_char(ch: char) -> bool {
    !ch.is_whitespace() && ch != '<' && ch != '>'
}

/// Yields every `<<name>>` occurrence, left to right, without overlap.
fn tokens(template: &str) -> impl Iterator<Item = Token<'_>> {
    let mut cursor = 0;
    std::iter::from_fn(move || {
        while let Some(offset) = template[cursor..].find(OPEN) {
            let start = cursor + offset;
            let name_start = start + OPEN.len();
            let name_len: usize = template[name_start..]
                .chars()
                .take_while(|ch| is_name_char(*ch))
                .map(char::len_utf8)
                .sum();
            let name_end = name_start + name_len;

            if name_len > 0 && template[name_end..].starts_with(CLOSE) {
                let end = name_end + CLOSE.len();
                cursor = end;
                return Some(Token {
                    start,
                    end,
                    name: &template[name_start..name_end],
                });
            }
            // Not a placeholder; retry one byte further so `<<<x>>` still matches.
            cursor = start + 1;
        }
        cursor = template.len();
        None
    })
}

/// Returns the distinct placeholder names in order of first appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for token in tokens(template) {
        if !names.contains(&token.name) {
            names.push(token.name);
        }
    }
    names
}

/// Resolves the value a parameter takes for this call: the caller's value
/// when non-empty, else its default, else absent.
fn effective_value<'a>(spec: &'a ParamSpec, provided: &'a Arguments) -> Option<&'a str> {
    provided
        .get(spec.name())
        .filter(|value| !value.is_empty())
        .or_else(|| spec.default_value())
}

/// A required parameter is satisfied by any supplied value, empty included,
/// or by a default.
fn is_satisfied(spec: &ParamSpec, provided: &Arguments) -> bool {
    provided.contains(spec.name()) || spec.default_value().is_some()
}

/// Returns `true` when `name` can appear inside a `<<name>>` placeholder.
#[must_use]
pub fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_name_char)
}

/// Substitutes placeholders in `template` using the caller's values.
///
/// Non-empty values replace their token verbatim. An empty value counts as
/// not given: the default is used, or the token alone is deleted. The
/// template is scanned once, so text inserted from a value is never expanded
/// again. Tokens without a matching declaration are left untouched.
///
/// # Errors
///
/// Returns [`InvocationError::MissingRequiredParameter`] when a required
/// parameter has neither a value nor a default, and
/// [`InvocationError::UnknownParameter`] when a value is supplied for a name
/// that is not declared. Both are checked before any substitution happens.
pub fn substitute(
    template: &str,
    provided: &Arguments,
    specs: &[ParamSpec],
) -> InvocationResult<String> {
    if let Some(missing) = specs
        .iter()
        .find(|spec| spec.is_required() && !is_satisfied(spec, provided))
    {
        return Err(InvocationError::MissingRequiredParameter {
            name: missing.name().to_owned(),
        });
    }

    if let Some(unknown) = provided
        .names()
        .find(|name| !specs.iter().any(|spec| spec.name() == *name))
    {
        return Err(InvocationError::UnknownParameter {
            name: unknown.to_owned(),
        });
    }

    let mut output = String::with_capacity(template.len());
    let mut last = 0;
    for token in tokens(template) {
        output.push_str(&template[last..token.start]);
        match specs.iter().find(|spec| spec.name() == token.name) {
            Some(spec) => {
                if let Some(value) = effective_value(spec, provided) {
                    output.push_str(value);
                }
            }
            None => output.push_str(&template[token.start..token.end]),
        }
        last = token.end;
    }
    output.push_str(&template[last..]);

    Ok(output)
}
