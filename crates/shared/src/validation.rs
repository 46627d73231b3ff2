//! ValidationResult - field-level errors collected for one operation attempt

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name -> error message mapping.
///
/// An empty result means the entity passed validation. Nested entities are
/// validated separately and folded in with [`ValidationResult::merge`], which
/// prefixes their keys so the caller sees one coherent error set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    invalid_inputs: BTreeMap<String, String>,
}

impl ValidationResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field.
    ///
    /// A second message for the same field is appended to the first one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        self.invalid_inputs
            .entry(field.into())
            .and_modify(|existing| {
                existing.push_str("; ");
                existing.push_str(&message);
            })
            .or_insert(message);
    }

    /// Builder form of [`ValidationResult::add`]
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    /// Fold another result in, keying every entry as `master_key.field`
    pub fn merge(&mut self, master_key: &str, errors: &ValidationResult) {
        for (field, message) in &errors.invalid_inputs {
            self.add(format!("{}.{}", master_key, field), message.clone());
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.invalid_inputs.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.invalid_inputs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.invalid_inputs.len()
    }

    /// Message recorded for a field, if any
    pub fn get(&self, field: &str) -> Option<&str> {
        self.invalid_inputs.get(field).map(|s| s.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.invalid_inputs.contains_key(field)
    }

    /// Iterate over `(field, message)` pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.invalid_inputs
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// Convert into `Ok(())` when empty, `Err(self)` otherwise
    pub fn into_result(self) -> Result<(), ValidationResult> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
