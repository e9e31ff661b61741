//! Task registry: id → task lookup shared read-only by one expansion pass.
//!
//! Also answers graph questions over task references: the transitive set of
//! subtasks a task includes, and the reference cycles present in the list.

use super::types::Task;
use crate::error::{Error, Result};
use indexmap::{IndexMap, IndexSet};

/// Registered tasks, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: IndexMap<String, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under its own id.
    pub fn register(&mut self, task: Task) -> Result<()> {
        let key = task.id.clone();
        self.insert(key, task)
    }

    /// Register a task under `key`. A task with an empty id adopts the key;
    /// any other id must equal it.
    pub fn insert(&mut self, key: String, mut task: Task) -> Result<()> {
        if key.is_empty() {
            return Err(Error::EmptyTaskId);
        }
        if task.id.is_empty() {
            task.id = key.clone();
        } else if task.id != key {
            return Err(Error::IdMismatch { key, id: task.id });
        }
        if self.tasks.contains_key(&key) {
            return Err(Error::DuplicateTask(key));
        }
        self.tasks.insert(key, task);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Every task transitively included by `id`, in the order expansion
    /// first inlines them. Unknown ids and `id` itself are left out.
    pub fn transitive_subtasks(&self, id: &str) -> Vec<String> {
        let mut seen: IndexSet<&str> = IndexSet::new();
        if let Some(task) = self.tasks.get(id) {
            seen.insert(task.id.as_str());
            self.collect_subtasks(task, &mut seen);
        }
        seen.iter().skip(1).map(|s| s.to_string()).collect()
    }

    fn collect_subtasks<'a>(&'a self, task: &'a Task, seen: &mut IndexSet<&'a str>) {
        for reference in task.root.subtask_refs() {
            let Some(sub) = self.tasks.get(reference) else {
                continue;
            };
            if seen.insert(sub.id.as_str()) {
                self.collect_subtasks(sub, seen);
            }
        }
    }

    /// Reference cycles, each as the path of task ids that closes on itself
    /// (e.g. `[a, b, a]`). Found by depth-first search in registration order.
    pub fn reference_cycles(&self) -> Vec<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn visit<'a>(
            registry: &'a TaskRegistry,
            id: &'a str,
            colors: &mut IndexMap<&'a str, Color>,
            stack: &mut Vec<&'a str>,
            cycles: &mut Vec<Vec<String>>,
        ) {
            colors.insert(id, Color::Gray);
            stack.push(id);
            if let Some(task) = registry.tasks.get(id) {
                for reference in task.root.subtask_refs() {
                    let Some(sub) = registry.tasks.get(reference) else {
                        continue;
                    };
                    let next = sub.id.as_str();
                    match colors.get(next).copied().unwrap_or(Color::White) {
                        Color::White => visit(registry, next, colors, stack, cycles),
                        Color::Gray => {
                            if let Some(start) = stack.iter().position(|s| *s == next) {
                                let mut cycle: Vec<String> =
                                    stack[start..].iter().map(|s| s.to_string()).collect();
                                cycle.push(next.to_string());
                                cycles.push(cycle);
                            }
                        }
                        Color::Black => {}
                    }
                }
            }
            stack.pop();
            colors.insert(id, Color::Black);
        }

        let mut colors: IndexMap<&str, Color> = IndexMap::new();
        let mut stack = Vec::new();
        let mut cycles = Vec::new();
        for id in self.tasks.keys() {
            if colors.get(id.as_str()).copied().unwrap_or(Color::White) == Color::White {
                visit(self, id, &mut colors, &mut stack, &mut cycles);
            }
        }
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Branch, ExecutionNode, Step};

    fn task(id: &str, steps: Vec<Step>) -> Task {
        Task::new(id).with_root(ExecutionNode::from_steps(steps))
    }

    fn registry(tasks: Vec<Task>) -> TaskRegistry {
        let mut r = TaskRegistry::new();
        for t in tasks {
            r.register(t).unwrap();
        }
        r
    }

    #[test]
    fn test_registry_key_must_match_id() {
        let mut r = TaskRegistry::new();
        let err = r.insert("a".into(), Task::new("b")).unwrap_err();
        assert!(matches!(err, Error::IdMismatch { .. }));
    }

    #[test]
    fn test_registry_empty_id_adopts_key() {
        let mut r = TaskRegistry::new();
        r.insert("css".into(), Task::default()).unwrap();
        assert_eq!(r.get("css").unwrap().id, "css");
    }

    #[test]
    fn test_registry_rejects_duplicates_and_empty() {
        let mut r = TaskRegistry::new();
        r.register(Task::new("a")).unwrap();
        let duplicate = r.register(Task::new("a"));
        assert!(matches!(duplicate, Err(Error::DuplicateTask(_))));
        let empty = r.register(Task::default());
        assert!(matches!(empty, Err(Error::EmptyTaskId)));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_registry_transitive_subtasks_order() {
        let r = registry(vec![
            task("a", vec![Step::subtask("b"), Step::subtask("c")]),
            task("b", vec![Step::subtask("d")]),
            task("c", vec![Step::subtask("d"), Step::subtask("ghost")]),
            task("d", vec![Step::observation("o")]),
        ]);
        assert_eq!(r.transitive_subtasks("a"), vec!["b", "d", "c"]);
        assert!(r.transitive_subtasks("d").is_empty());
        assert!(r.transitive_subtasks("missing").is_empty());
    }

    #[test]
    fn test_registry_transitive_subtasks_excludes_self_on_cycle() {
        let r = registry(vec![
            task("a", vec![Step::subtask("b")]),
            task("b", vec![Step::subtask("a")]),
        ]);
        assert_eq!(r.transitive_subtasks("a"), vec!["b"]);
        assert_eq!(r.transitive_subtasks("b"), vec!["a"]);
    }

    #[test]
    fn test_registry_transitive_subtasks_follow_branches() {
        let root = ExecutionNode::new().with_branch(Branch::new(
            vec![],
            ExecutionNode::from_steps(vec![Step::subtask("b")]),
            ExecutionNode::new(),
        ));
        let r = registry(vec![Task::new("a").with_root(root), task("b", vec![])]);
        assert_eq!(r.transitive_subtasks("a"), vec!["b"]);
    }

    #[test]
    fn test_registry_reference_cycles() {
        let r = registry(vec![
            task("a", vec![Step::subtask("b")]),
            task("b", vec![Step::subtask("c")]),
            task("c", vec![Step::subtask("a")]),
            task("d", vec![Step::subtask("d")]),
            task("e", vec![Step::subtask("a")]),
        ]);
        let cycles = r.reference_cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0], vec!["a", "b", "c", "a"]);
        assert_eq!(cycles[1], vec!["d", "d"]);
    }

    #[test]
    fn test_registry_acyclic_has_no_cycles() {
        let r = registry(vec![
            task("a", vec![Step::subtask("b"), Step::subtask("b")]),
            task("b", vec![]),
        ]);
        assert!(r.reference_cycles().is_empty());
    }
}
