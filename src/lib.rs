//! Tasklist: reusable workflow tasks and the engine that inlines them.
//!
//! A task's body is a tree of observations and conditional branches, some of
//! whose steps reference other tasks. Expansion replaces every reference with
//! the referenced task's own expanded tree, yielding one flattened tree for a
//! downstream executor.

pub mod cli;
pub mod core;
pub mod error;

pub use error::{Error, Result};
