//! CLI subcommands: init, validate, expand, show.

use crate::core::diagnostics::TracingSink;
use crate::core::expander::{Expander, TaskExpansion};
use crate::core::{parser, registry::TaskRegistry, render};
use crate::error::{Error, Result};
use clap::{Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter task list
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Check a task list for dangling references, cycles and empty branches
    Validate {
        /// Path to the task list
        #[arg(short, long, default_value = "tasklist.yaml")]
        file: PathBuf,
    },

    /// Inline every subtask of one task and print the flattened tree
    Expand {
        /// Path to the task list
        #[arg(short, long, default_value = "tasklist.yaml")]
        file: PathBuf,

        /// Task to expand
        #[arg(short, long)]
        task: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,
    },

    /// Print tasks as authored, without expansion
    Show {
        /// Path to the task list
        #[arg(short, long, default_value = "tasklist.yaml")]
        file: PathBuf,

        /// Only this task
        #[arg(short, long)]
        task: Option<String>,

        /// Locale for task names
        #[arg(long, default_value = "en")]
        lang: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Tree,
    Yaml,
    Json,
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Expand { file, task, format } => cmd_expand(&file, &task, format),
        Commands::Show { file, task, lang } => cmd_show(&file, task.as_deref(), &lang),
    }
}

const STARTER_TASKLIST: &str = r#"tasks:
  conformance:
    name:
      en: "Conformance checks"
    steps:
      - type: observation
        value: http-headers
      - type: subtask
        value: markup
    branches:
      - conditions:
          - type: mimetype
            observer: http-headers
            value: text/css
        then:
          steps:
            - type: observation
              value: css-validator

  markup:
    parameters:
      charset:
        type: dropdown
        values: [utf-8, iso-8859-1]
        default: utf-8
    steps:
      - type: observation
        value: markup-validator
"#;

fn cmd_init(path: &Path) -> Result<()> {
    let file = path.join("tasklist.yaml");
    if file.exists() {
        return Err(Error::AlreadyExists(file));
    }
    std::fs::write(&file, STARTER_TASKLIST).map_err(|source| Error::Io {
        path: file.clone(),
        source,
    })?;
    println!("Created {}", file.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let registry = parser::parse_tasklist_file(file)?;
    let errors = parser::validate_registry(&registry);

    if errors.is_empty() {
        println!("OK: {} ({} tasks)", file.display(), registry.len());
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(Error::Validation(errors.len()))
    }
}

fn cmd_expand(file: &Path, task: &str, format: OutputFormat) -> Result<()> {
    let registry = parser::parse_tasklist_file(file)?;
    let mut sink = TracingSink::new();
    let expansion = Expander::new(&registry, &mut sink).expand_task(task)?;

    print!("{}", render_expansion(&expansion, format)?);
    if sink.total() > 0 {
        eprintln!(
            "{} unresolved reference(s), {} cyclic reference(s); expansion may be incomplete",
            sink.unresolved, sink.cyclic
        );
    }
    Ok(())
}

/// Render an expansion in the requested format.
pub fn render_expansion(expansion: &TaskExpansion, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Tree => Ok(format!(
            "{}\n{}",
            render::expansion_summary(expansion),
            render::display_tree(&expansion.tree)
        )),
        OutputFormat::Yaml => Ok(serde_yaml_ng::to_string(&expansion.tree)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&expansion.tree)? + "\n"),
    }
}

fn cmd_show(file: &Path, task: Option<&str>, lang: &str) -> Result<()> {
    let registry = parser::parse_tasklist_file(file)?;
    print!("{}", render_registry(&registry, task, lang)?);
    Ok(())
}

/// Summaries and unexpanded trees, for one task or all of them.
pub fn render_registry(registry: &TaskRegistry, task: Option<&str>, lang: &str) -> Result<String> {
    let tasks = match task {
        Some(id) => {
            let found = registry
                .get(id)
                .ok_or_else(|| Error::UnknownTask(id.to_string()))?;
            vec![found]
        }
        None => registry.tasks().collect(),
    };
    let sections: Vec<String> = tasks
        .into_iter()
        .map(|t| {
            let references = registry.transitive_subtasks(&t.id);
            format!(
                "{}\n{}",
                render::task_summary(t, lang, &references),
                render::display_tree(&t.root)
            )
        })
        .collect();
    Ok(sections.join("\n"))
}
