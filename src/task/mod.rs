//! Named tasks and the task graph.
//!
//! Tasks are stored in an arena with index-based edges; composites
//! (sequential or parallel groups) reference members by id, never by
//! nested closures. The graph is validated for cycles at construction
//! and executed by a small scheduler tracking completion per node.

mod graph;
mod registry;
mod runner;

pub use graph::{GraphBuilder, TaskBody, TaskError, TaskGraph, TaskId, TaskKind};
pub use registry::build_graph;
pub use runner::run_task;
