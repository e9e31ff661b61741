//! Expansion engine: inline every subtask reference into one flattened tree.
//!
//! An [`Expander`] is one pass over a read-only [`TaskRegistry`]. Every tree
//! node it touches moves Unmarked → InProgress → Done at most once per pass,
//! so the work is bounded by the number of distinct nodes reachable. A node
//! reached again while still InProgress closes a reference cycle: it is
//! spliced as-is instead of being re-entered, and a
//! [`Diagnostic::CyclicReference`] is reported.
//!
//! Within one node the node's own observations come first, in order; the
//! bodies of its subtask references are appended after them, in reference
//! order; its own branches come last. A spliced body contributes its steps,
//! then its branches.

use super::diagnostics::{Diagnostic, DiagnosticSink};
use super::params::{merge_into, ParameterMap};
use super::registry::TaskRegistry;
use super::types::{Branch, ExecutionNode, ExpansionState, Step, Task};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Node identity within one pass. The registry is borrowed for the whole
/// pass, so addresses are stable.
type NodeKey = *const ExecutionNode;

fn node_key(node: &ExecutionNode) -> NodeKey {
    std::ptr::from_ref(node)
}

/// Outcome of expanding one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskExpansion {
    pub task_id: String,

    /// Flattened tree, ready for the executor
    pub tree: ExecutionNode,

    /// Own parameters merged with those of every transitively inlined subtask
    pub parameters: ParameterMap,

    /// Transitively inlined task ids, first-inlined order
    pub references: Vec<String>,
}

/// Single-threaded expansion pass over a registry.
pub struct Expander<'r, S> {
    registry: &'r TaskRegistry,
    sink: S,
    states: HashMap<NodeKey, ExpansionState>,
    expanded: HashMap<NodeKey, ExecutionNode>,
    including: Vec<&'r str>,
}

impl<'r, S: DiagnosticSink> Expander<'r, S> {
    pub fn new(registry: &'r TaskRegistry, sink: S) -> Self {
        Self {
            registry,
            sink,
            states: HashMap::new(),
            expanded: HashMap::new(),
            including: Vec::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Expansion state of `node` in this pass.
    pub fn state(&self, node: &ExecutionNode) -> ExpansionState {
        self.states
            .get(&node_key(node))
            .copied()
            .unwrap_or_default()
    }

    /// Expand the task registered under `task_id`.
    ///
    /// Only an unknown top-level id is an error; dangling and cyclic
    /// references inside the tree go to the sink.
    pub fn expand_task(&mut self, task_id: &str) -> Result<TaskExpansion> {
        let registry = self.registry;
        let task = registry
            .get(task_id)
            .ok_or_else(|| Error::UnknownTask(task_id.to_string()))?;

        tracing::debug!(task = %task.id, "expanding task");
        self.including.push(&task.id);
        let tree = self.expand(&task.root);
        self.including.pop();

        let references = registry.transitive_subtasks(&task.id);
        let mut parameters = task.parameters.clone();
        for id in &references {
            if let Some(sub) = registry.get(id) {
                merge_into(&mut parameters, &sub.parameters);
            }
        }

        tracing::debug!(
            task = %task.id,
            steps = tree.steps.len(),
            branches = tree.branches.len(),
            references = references.len(),
            "expanded task"
        );
        Ok(TaskExpansion {
            task_id: task.id.clone(),
            tree,
            parameters,
            references,
        })
    }

    /// Expand every registered task, in registration order.
    pub fn expand_all(&mut self) -> Vec<TaskExpansion> {
        let registry = self.registry;
        registry
            .tasks()
            .filter_map(|task| self.expand_task(&task.id).ok())
            .collect()
    }

    /// Expand one node into a fresh tree with its subtask references inlined.
    ///
    /// A node already Done yields its expansion from earlier in this pass; a
    /// node InProgress yields an unexpanded copy.
    pub fn expand(&mut self, node: &'r ExecutionNode) -> ExecutionNode {
        match self.state(node) {
            ExpansionState::Unmarked => {}
            // Only reachable from `splice_as_is`, which has already reported
            // the cycle.
            ExpansionState::InProgress => return node.clone(),
            ExpansionState::Done => return self.reuse(node),
        }
        let key = node_key(node);
        self.states.insert(key, ExpansionState::InProgress);

        let mut result = ExecutionNode::new();
        let mut subtasks = Vec::new();
        for step in &node.steps {
            match step {
                Step::Observation(_) => result.steps.push(step.clone()),
                Step::SubtaskRef(id) => subtasks.push(id.as_str()),
            }
        }
        for id in subtasks {
            self.splice_subtask(&mut result, id);
        }
        for branch in &node.branches {
            let branch = self.expand_branch(branch);
            result.branches.push(branch);
        }

        self.states.insert(key, ExpansionState::Done);
        self.expanded.insert(key, result.clone());
        result
    }

    fn expand_branch(&mut self, branch: &'r Branch) -> Branch {
        Branch {
            conditions: branch.conditions.clone(),
            on_true: self.expand(&branch.on_true),
            on_false: self.expand(&branch.on_false),
        }
    }

    /// Resolve `id` and append the referenced task's expanded body.
    fn splice_subtask(&mut self, result: &mut ExecutionNode, id: &str) {
        let registry = self.registry;
        let referenced_by = self.current_task();
        let Some(task) = registry.get(id) else {
            self.sink.report(Diagnostic::UnresolvedReference {
                task: id.to_string(),
                referenced_by,
            });
            return;
        };

        match self.state(&task.root) {
            ExpansionState::Unmarked => {
                self.including.push(&task.id);
                let body = self.expand(&task.root);
                self.including.pop();
                result.append(body);
            }
            ExpansionState::Done => result.append(self.reuse(&task.root)),
            ExpansionState::InProgress => {
                self.sink.report(Diagnostic::CyclicReference {
                    task: task.id.clone(),
                    referenced_by,
                });
                self.splice_as_is(result, task);
            }
        }
    }

    /// Append a task body that is still being expanded. Its observations are
    /// copied. A subtask whose root is also in progress is kept verbatim, since
    /// following it would re-enter the cycle; any other subtask is spliced as
    /// usual. Its branches are expanded under the guard.
    fn splice_as_is(&mut self, result: &mut ExecutionNode, task: &'r Task) {
        let registry = self.registry;
        self.including.push(&task.id);
        let mut subtasks = Vec::new();
        for step in &task.root.steps {
            match step {
                Step::Observation(_) => result.steps.push(step.clone()),
                Step::SubtaskRef(id) => subtasks.push(id.as_str()),
            }
        }
        for id in subtasks {
            let in_progress = registry
                .get(id)
                .is_some_and(|sub| self.state(&sub.root) == ExpansionState::InProgress);
            if in_progress {
                result.steps.push(Step::subtask(id));
            } else {
                self.splice_subtask(result, id);
            }
        }
        for branch in &task.root.branches {
            let branch = self.expand_branch(branch);
            result.branches.push(branch);
        }
        self.including.pop();
    }

    fn reuse(&self, node: &ExecutionNode) -> ExecutionNode {
        self.expanded
            .get(&node_key(node))
            .cloned()
            .unwrap_or_else(|| node.clone())
    }

    fn current_task(&self) -> Option<String> {
        self.including.last().map(|id| id.to_string())
    }
}

/// Expand one task with a fresh pass over `registry`.
pub fn expand_task<S: DiagnosticSink>(
    registry: &TaskRegistry,
    task_id: &str,
    sink: S,
) -> Result<TaskExpansion> {
    Expander::new(registry, sink).expand_task(task_id)
}
