//! Task-list data model.
//!
//! A task owns an execution tree. A tree node holds an ordered list of steps
//! (observations or subtask references) followed by an ordered list of
//! conditional branches. All types derive Serialize/Deserialize for YAML
//! roundtripping.

use super::params::{Parameter, ParameterMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Localized text
// ============================================================================

/// Mapping from locale tag (`en`, `fr`, `zh-cn`, ...) to text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString {
    localizations: IndexMap<String, String>,
}

impl LocalizedString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the text for one locale.
    pub fn add_localization(&mut self, lang: &str, text: &str) {
        self.localizations.insert(lang.to_string(), text.to_string());
    }

    pub fn localization(&self, lang: &str) -> Option<&str> {
        self.localizations.get(lang).map(String::as_str)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.localizations.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.localizations.is_empty()
    }
}

// ============================================================================
// Tasks
// ============================================================================

/// A named, reusable workflow unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier (the registry key; filled in by the loader)
    #[serde(default, skip_serializing)]
    pub id: String,

    /// Localized long names
    #[serde(default, skip_serializing_if = "LocalizedString::is_empty")]
    pub name: LocalizedString,

    /// Localized descriptions
    #[serde(default, skip_serializing_if = "LocalizedString::is_empty")]
    pub description: LocalizedString,

    /// Parameters (order-preserving)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: ParameterMap,

    /// Unexpanded body
    #[serde(flatten)]
    pub root: ExecutionNode,
}

impl Task {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the task body.
    pub fn with_root(mut self, root: ExecutionNode) -> Self {
        self.root = root;
        self
    }

    /// Builder-style parameter registration.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.add_parameter(parameter);
        self
    }

    /// Long name in the requested locale, or an empty string.
    pub fn name(&self, lang: &str) -> &str {
        self.name.localization(lang).unwrap_or("")
    }

    /// Description in the requested locale, or an empty string.
    pub fn description(&self, lang: &str) -> &str {
        self.description.localization(lang).unwrap_or("")
    }

    pub fn add_name(&mut self, lang: &str, text: &str) {
        self.name.add_localization(lang, text);
    }

    pub fn add_description(&mut self, lang: &str, text: &str) {
        self.description.add_localization(lang, text);
    }

    /// Register a parameter under its own name, replacing any previous one.
    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.insert(parameter.name.clone(), parameter);
    }
}

// ============================================================================
// Execution tree
// ============================================================================

/// Expansion progress of one tree node within a single expansion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExpansionState {
    #[default]
    Unmarked,
    InProgress,
    Done,
}

impl fmt::Display for ExpansionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmarked => write!(f, "unmarked"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// A tree node: ordered steps, then ordered branches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionNode {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,
}

impl ExecutionNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            branches: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.branches.is_empty()
    }

    /// Move another node's steps and branches onto the end of this one.
    pub fn append(&mut self, other: ExecutionNode) {
        self.steps.extend(other.steps);
        self.branches.extend(other.branches);
    }

    /// Observation ids, depth-first: this node's steps, then each branch's
    /// `then` and `else` subtrees.
    pub fn observations(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk_steps(&mut |step| {
            if let Step::Observation(id) = step {
                out.push(id.as_str());
            }
        });
        out
    }

    /// Subtask references still present anywhere in the tree, depth-first.
    pub fn subtask_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk_steps(&mut |step| {
            if let Step::SubtaskRef(id) = step {
                out.push(id.as_str());
            }
        });
        out
    }

    fn walk_steps<'a>(&'a self, visit: &mut impl FnMut(&'a Step)) {
        for step in &self.steps {
            visit(step);
        }
        for branch in &self.branches {
            branch.on_true.walk_steps(visit);
            branch.on_false.walk_steps(visit);
        }
    }
}

/// One execution step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Step {
    /// Opaque observation, run by the downstream executor
    Observation(String),

    /// Reference to another task to inline here
    #[serde(rename = "subtask")]
    SubtaskRef(String),
}

impl Step {
    pub fn observation(id: &str) -> Self {
        Self::Observation(id.to_string())
    }

    pub fn subtask(task_id: &str) -> Self {
        Self::SubtaskRef(task_id.to_string())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observation(id) => write!(f, "observation {}", id),
            Self::SubtaskRef(id) => write!(f, "subtask {}", id),
        }
    }
}

/// An if/then/else over opaque conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub conditions: Vec<Condition>,

    /// Taken when the conditions hold
    #[serde(rename = "then", default, skip_serializing_if = "ExecutionNode::is_empty")]
    pub on_true: ExecutionNode,

    /// Taken otherwise
    #[serde(rename = "else", default, skip_serializing_if = "ExecutionNode::is_empty")]
    pub on_false: ExecutionNode,
}

impl Branch {
    pub fn new(
        conditions: Vec<Condition>,
        on_true: ExecutionNode,
        on_false: ExecutionNode,
    ) -> Self {
        Self {
            conditions,
            on_true,
            on_false,
        }
    }
}

/// Opaque condition. Never interpreted here; evaluated by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Condition kind (`mimetype`, `xpath`, `parameter`, ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Observation whose result the condition inspects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer: Option<String>,

    #[serde(default)]
    pub value: String,
}

impl Condition {
    pub fn new(kind: &str, value: &str) -> Self {
        Self {
            id: None,
            kind: kind.to_string(),
            observer: None,
            value: value.to_string(),
        }
    }

    pub fn with_observer(mut self, observer: &str) -> Self {
        self.observer = Some(observer.to_string());
        self
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.observer {
            Some(observer) => write!(f, "{}({}) = {}", self.kind, observer, self.value),
            None => write!(f, "{} = {}", self.kind, self.value),
        }
    }
}
