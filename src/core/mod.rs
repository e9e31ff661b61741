//! Core task-list logic: types, parameters, registry, loading, expansion, rendering.

pub mod diagnostics;
pub mod expander;
pub mod params;
pub mod parser;
pub mod registry;
pub mod render;
pub mod types;
