//! `((name))` placeholder evaluation over a decoded YAML document.
//!
//! Placeholders are resolved inside string nodes only, so a bound value is never read back as
//! YAML syntax. A node made of exactly one placeholder takes the bound value as is: numbers,
//! booleans and mappings from vars files keep their shape.
use std::collections::{BTreeMap, BTreeSet};

use serde_yaml_ng::Value;
use thiserror::Error;

use super::value_to_string;

const OPEN: &str = "((";
const CLOSE: &str = "))";

pub type Bindings = BTreeMap<String, Value>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Expected to find variables: {}", join(.0))]
    MissingVariables(BTreeSet<String>),
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Replace every placeholder of the document with its binding.
///
/// A placeholder is `((name))`, optionally `((!name))`, with whitespace allowed inside the
/// parentheses. Text that looks like a placeholder but holds anything other than a variable
/// name is left untouched. All unresolved names are reported together.
pub fn evaluate(document: Value, bindings: &Bindings) -> Result<Value, TemplateError> {
    let mut evaluator = Evaluator {
        bindings,
        missing: BTreeSet::new(),
    };
    let document = evaluator.value(document);

    if evaluator.missing.is_empty() {
        Ok(document)
    } else {
        Err(TemplateError::MissingVariables(evaluator.missing))
    }
}

struct Evaluator<'a> {
    bindings: &'a Bindings,
    missing: BTreeSet<String>,
}

impl Evaluator<'_> {
    fn value(&mut self, value: Value) -> Value {
        match value {
            Value::String(text) => self.string(text),
            Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(|item| self.value(item)).collect())
            }
            Value::Mapping(mapping) => Value::Mapping(
                mapping
                    .into_iter()
                    .map(|(key, value)| (self.value(key), self.value(value)))
                    .collect(),
            ),
            Value::Tagged(mut tagged) => {
                tagged.value = self.value(tagged.value);
                Value::Tagged(tagged)
            }
            other => other,
        }
    }

    fn string(&mut self, text: String) -> Value {
        if let Some(name) = whole_placeholder(&text) {
            return match self.bindings.get(name) {
                Some(value) => value.clone(),
                None => {
                    self.missing.insert(name.to_string());
                    Value::String(text)
                }
            };
        }

        Value::String(self.interpolate(&text))
    }

    fn interpolate(&mut self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(OPEN) {
            output.push_str(&rest[..start]);
            let candidate = &rest[start..];

            match placeholder_at(candidate) {
                Some((name, len)) => {
                    match self.bindings.get(name) {
                        Some(value) => output.push_str(&value_to_string(value.clone())),
                        None => {
                            self.missing.insert(name.to_string());
                        }
                    }
                    rest = &candidate[len..];
                }
                None => {
                    // Keep a single parenthesis; a placeholder may start right after it.
                    output.push('(');
                    rest = &candidate[1..];
                }
            }
        }
        output.push_str(rest);

        output
    }
}

/// The name and length of the placeholder `text` starts with.
fn placeholder_at(text: &str) -> Option<(&str, usize)> {
    let inner = text.strip_prefix(OPEN)?;
    let end = inner.find(CLOSE)?;
    let name = variable_name(&inner[..end])?;

    Some((name, OPEN.len() + end + CLOSE.len()))
}

fn whole_placeholder(text: &str) -> Option<&str> {
    let text = text.trim();
    placeholder_at(text)
        .filter(|(_, len)| *len == text.len())
        .map(|(name, _)| name)
}

fn variable_name(inner: &str) -> Option<&str> {
    let inner = inner.trim();
    let name = inner.strip_prefix('!').unwrap_or(inner);
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'));

    valid.then_some(name)
}
