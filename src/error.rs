use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("task registered under '{key}' declares id '{id}'")]
    IdMismatch { key: String, id: String },

    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("task id must not be empty")]
    EmptyTaskId,

    #[error("task list has {0} validation problem(s)")]
    Validation(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
