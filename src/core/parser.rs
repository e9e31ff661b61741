//! Task-list YAML loading and validation.
//!
//! Loads an already-parsed task list serialised as YAML into a
//! [`TaskRegistry`] and checks structural constraints:
//! - The map key is the task id, never empty (an explicit `id:` must match it)
//! - Subtask references should name registered tasks
//! - Tasks should not reference themselves or form reference cycles
//! - Branches should carry at least one condition

use super::registry::TaskRegistry;
use super::types::{ExecutionNode, Task};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root of a task-list file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskListFile {
    /// Tasks keyed by id (order-preserving)
    #[serde(default)]
    pub tasks: IndexMap<String, Task>,
}

/// Validation problem. Expansion tolerates all of these; `validate` reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a task-list file from disk.
pub fn parse_tasklist_file(path: &Path) -> Result<TaskRegistry> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tasklist(&content)
}

/// Parse a task list from a YAML string.
pub fn parse_tasklist(yaml: &str) -> Result<TaskRegistry> {
    let file: TaskListFile = serde_yaml_ng::from_str(yaml)?;
    build_registry(file)
}

/// Register every task of a parsed file, filling ids and parameter names
/// from their map keys.
pub fn build_registry(file: TaskListFile) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    for (key, mut task) in file.tasks {
        for (name, parameter) in task.parameters.iter_mut() {
            if parameter.name.is_empty() {
                parameter.name = name.clone();
            }
        }
        registry.insert(key, task)?;
    }
    tracing::debug!(tasks = registry.len(), "task list loaded");
    Ok(registry)
}

/// Serialise a registry back into task-list YAML.
pub fn to_yaml(registry: &TaskRegistry) -> Result<String> {
    let file = TaskListFile {
        tasks: registry
            .tasks()
            .map(|t| (t.id.clone(), t.clone()))
            .collect(),
    };
    Ok(serde_yaml_ng::to_string(&file)?)
}

/// Validate a registry. Returns a list of problems (empty = valid).
pub fn validate_registry(registry: &TaskRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for task in registry.tasks() {
        for reference in task.root.subtask_refs() {
            if reference == task.id {
                errors.push(ValidationError {
                    message: format!("task '{}' references itself", task.id),
                });
            } else if !registry.contains(reference) {
                errors.push(ValidationError {
                    message: format!(
                        "task '{}' references unknown task '{}'",
                        task.id, reference
                    ),
                });
            }
        }
        check_branches(&task.id, &task.root, &mut errors);
    }

    for cycle in registry.reference_cycles() {
        // self references are reported above
        if cycle.len() > 2 {
            errors.push(ValidationError {
                message: format!("reference cycle detected: {}", cycle.join(" -> ")),
            });
        }
    }

    errors
}

fn check_branches(task_id: &str, node: &ExecutionNode, errors: &mut Vec<ValidationError>) {
    for branch in &node.branches {
        if branch.conditions.is_empty() {
            errors.push(ValidationError {
                message: format!("task '{}' has a branch with no conditions", task_id),
            });
        }
        check_branches(task_id, &branch.on_true, errors);
        check_branches(task_id, &branch.on_false, errors);
    }
}
