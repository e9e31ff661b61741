//! Task parameters and the merge-by-key contract used when subtasks are inlined.
//!
//! Conflict policy belongs to the parameter value type: `merge_into` only
//! decides between "delegate to the existing value" and "take the incoming
//! value verbatim".

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameters keyed by name, in declaration order.
pub type ParameterMap<P = Parameter> = IndexMap<String, P>;

/// A value that knows how to absorb another value of the same name.
pub trait Merge {
    fn merge(&mut self, other: &Self);
}

/// Merge every entry of `source` into `target`.
///
/// Existing entries absorb the incoming one through [`Merge::merge`]; missing
/// entries are inserted as-is, after the existing ones.
pub fn merge_into<P: Merge + Clone>(
    target: &mut IndexMap<String, P>,
    source: &IndexMap<String, P>,
) {
    for (name, incoming) in source {
        match target.get_mut(name) {
            Some(local) => local.merge(incoming),
            None => {
                target.insert(name.clone(), incoming.clone());
            }
        }
    }
}

/// How a parameter is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Checkbox,
    CheckboxList,
    Dropdown,
    Radio,
    TextArea,
    TextField,
}

/// A task parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (the map key; filled in by the loader)
    #[serde(default, skip_serializing)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParameterKind,

    /// Allowed values, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Parameter {
    pub fn new(name: &str, kind: ParameterKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            values: Vec::new(),
            default: None,
        }
    }

    pub fn with_values(mut self, values: &[&str]) -> Self {
        self.values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }
}

impl Merge for Parameter {
    /// Union of allowed values (local order first); the local default wins.
    fn merge(&mut self, other: &Self) {
        if self.kind != other.kind {
            tracing::debug!(
                parameter = %self.name,
                local = ?self.kind,
                incoming = ?other.kind,
                "parameter kind differs, keeping local kind"
            );
        }
        for value in &other.values {
            if !self.values.contains(value) {
                self.values.push(value.clone());
            }
        }
        if self.default.is_none() {
            self.default = other.default.clone();
        }
    }
}
