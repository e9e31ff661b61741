//! Human-readable rendering of execution trees and tasks, for `show` and
//! `expand --format tree`.

use super::expander::TaskExpansion;
use super::params::ParameterMap;
use super::types::{ExecutionNode, Task};

const INDENT: &str = "  ";

/// Render a tree: steps first, then each branch as `if` / `then` / `else`.
pub fn display_tree(node: &ExecutionNode) -> String {
    let mut lines = Vec::new();
    push_node(&mut lines, node, 0);
    lines.into_iter().map(|line| line + "\n").collect()
}

fn push_node(lines: &mut Vec<String>, node: &ExecutionNode, depth: usize) {
    let pad = INDENT.repeat(depth);
    for step in &node.steps {
        lines.push(format!("{}{}", pad, step));
    }
    for branch in &node.branches {
        let conditions: Vec<String> = branch.conditions.iter().map(|c| c.to_string()).collect();
        lines.push(format!("{}if [{}]", pad, conditions.join(", ")));
        lines.push(format!("{}then:", pad));
        push_node(lines, &branch.on_true, depth + 1);
        if !branch.on_false.is_empty() {
            lines.push(format!("{}else:", pad));
            push_node(lines, &branch.on_false, depth + 1);
        }
    }
}

/// Task summary: id, long name, parameters and the tasks it includes.
pub fn task_summary(task: &Task, lang: &str, references: &[String]) -> String {
    let mut lines = vec![format!("ID: {}", task.id)];
    let name = task.name(lang);
    if !name.is_empty() {
        lines.push(format!("name: {}", name));
    }
    lines.push(format!("parameters: {}", parameter_list(&task.parameters)));
    lines.push(format!("references: [{}]", references.join(", ")));
    lines.into_iter().map(|line| line + "\n").collect()
}

/// Expansion summary: id, effective parameters, inlined references.
pub fn expansion_summary(expansion: &TaskExpansion) -> String {
    format!(
        "ID: {}\nparameters: {}\nreferences: [{}]\n",
        expansion.task_id,
        parameter_list(&expansion.parameters),
        expansion.references.join(", ")
    )
}

fn parameter_list(parameters: &ParameterMap) -> String {
    let entries: Vec<String> = parameters
        .values()
        .map(|p| match &p.default {
            Some(default) => format!("{}={}", p.name, default),
            None => p.name.clone(),
        })
        .collect();
    format!("[{}]", entries.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{Parameter, ParameterKind};
    use crate::core::types::{Branch, Condition, Step};

    #[test]
    fn test_render_tree_layout() {
        let branch = Branch::new(
            vec![
                Condition::new("mimetype", "text/css").with_observer("http"),
                Condition::new("parameter", "strict"),
            ],
            ExecutionNode::from_steps(vec![Step::observation("css")]),
            ExecutionNode::from_steps(vec![Step::observation("links")]),
        );
        let steps = vec![Step::observation("http"), Step::subtask("markup")];
        let node = ExecutionNode::from_steps(steps).with_branch(branch);
        let expected = "\
observation http
subtask markup
if [mimetype(http) = text/css, parameter = strict]
then:
  observation css
else:
  observation links
";
        assert_eq!(display_tree(&node), expected);
    }

    #[test]
    fn test_render_empty_else_omitted() {
        let node = ExecutionNode::new().with_branch(Branch::new(
            vec![Condition::new("xpath", "//p")],
            ExecutionNode::new().with_branch(Branch::new(
                vec![Condition::new("xpath", "//a")],
                ExecutionNode::from_steps(vec![Step::observation("deep")]),
                ExecutionNode::new(),
            )),
            ExecutionNode::new(),
        ));
        let rendered = display_tree(&node);
        assert!(!rendered.contains("else"));
        assert!(rendered.contains("    observation deep\n"));
    }

    #[test]
    fn test_render_task_summary() {
        let mut task = Task::new("css")
            .with_parameter(Parameter::new("profile", ParameterKind::Radio).with_default("css3"))
            .with_parameter(Parameter::new("warning", ParameterKind::Checkbox));
        task.add_name("en", "CSS validation");
        let references = vec!["selectors".to_string(), "colors".to_string()];
        assert_eq!(
            task_summary(&task, "en", &references),
            "ID: css\nname: CSS validation\nparameters: [profile=css3, warning]\n\
             references: [selectors, colors]\n"
        );
        assert_eq!(
            task_summary(&task, "fr", &[]),
            "ID: css\nparameters: [profile=css3, warning]\nreferences: []\n"
        );
    }

    #[test]
    fn test_render_expansion_summary() {
        let expansion = TaskExpansion {
            task_id: "a".into(),
            tree: ExecutionNode::new(),
            parameters: ParameterMap::new(),
            references: vec!["b".into(), "c".into()],
        };
        assert_eq!(
            expansion_summary(&expansion),
            "ID: a\nparameters: []\nreferences: [b, c]\n"
        );
    }
}
