//! The mutable key-value scratch space threaded through one workflow run.
//!
//! Each `execute` call owns its own context; contexts are never shared
//! across executions. String parameter values may embed `{key}` references
//! that are substituted from the context at dispatch time; unknown
//! placeholders are left verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Mutable key→value map seeded by the caller and appended to by
/// successful actions.
///
/// Keys are ordered deterministically, matching how parameter maps are
/// rendered and compared elsewhere in the crate.
///
/// # Examples
///
/// ```
/// use barragan::workflow::domain::ExecutionContext;
///
/// let context = ExecutionContext::new()
///     .with("location", "Entrada principal")
///     .with("priority", "high");
///
/// assert_eq!(
///     context.render("Problema en {location} (prioridad {priority})"),
///     "Problema en Entrada principal (prioridad high)",
/// );
/// assert_eq!(context.render("sin {cambios}"), "sin {cambios}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext(BTreeMap<String, Value>);

impl ExecutionContext {
    /// Creates an empty context.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insertion for seeding a context.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the string stored under `key`, if the value is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if the context holds a value under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the context holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying ordered map.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    /// Substitutes `{key}` references in `template` with context values.
    ///
    /// Values render via [`display_value`]; placeholders naming absent keys
    /// are left verbatim.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        let mut rendered = template.to_owned();
        for (key, value) in &self.0 {
            let placeholder = format!("{{{key}}}");
            if rendered.contains(&placeholder) {
                rendered = rendered.replace(&placeholder, &display_value(value));
            }
        }
        rendered
    }

    /// Renders placeholder references inside a JSON value.
    ///
    /// Strings are rendered via [`Self::render`]; objects and arrays are
    /// traversed recursively; other values pass through unchanged.
    #[must_use]
    pub fn render_value(&self, value: &Value) -> Value {
        match value {
            Value::String(template) => Value::String(self.render(template)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.render_value(item)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.render_value(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Renders placeholder references in every value of a parameter map.
    #[must_use]
    pub fn render_fields(&self, fields: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        fields
            .iter()
            .map(|(key, value)| (key.clone(), self.render_value(value)))
            .collect()
    }
}

impl From<BTreeMap<String, Value>> for ExecutionContext {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl IntoIterator for ExecutionContext {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Renders a JSON value for substitution into text.
///
/// Strings render without surrounding quotes; other values use their
/// compact JSON form.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
