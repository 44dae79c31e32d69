//! Task graph construction and validation.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::config::{BuildOptions, Config};
use crate::pipeline::Pipeline;

/// Index into the task arena.
pub type TaskId = usize;

/// Task execution errors.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("task not found: `{0}`")]
    NotFound(String),

    #[error("cyclic task dependency involving `{0}`")]
    Cycle(String),

    #[error("duplicate task name `{0}`")]
    Duplicate(String),

    #[error("task `{0}` references unknown task `{1}`")]
    UnknownReference(String, String),

    #[error("task `{task}` failed: {message}")]
    Failed { task: String, message: String },
}

/// What a leaf task does when executed.
pub enum TaskBody {
    /// Run an asset pipeline.
    Pipeline(Pipeline),
    /// Run an arbitrary action (clean, lint, watch, serve).
    Action(Box<dyn Fn(&Config, &BuildOptions) -> Result<(), TaskError> + Send + Sync>),
}

/// Task kind: a leaf body or a composite over other tasks.
pub enum TaskKind {
    Leaf(TaskBody),
    /// Members run strictly in order; each completes before the next starts.
    Seq(Vec<TaskId>),
    /// Members run concurrently; no ordering guarantee between them.
    Par(Vec<TaskId>),
}

pub(super) struct TaskNode {
    pub(super) name: String,
    pub(super) kind: TaskKind,
    /// Run to completion, in order, before this task's own body starts.
    pub(super) depends_on: Vec<TaskId>,
}

/// Validated, immutable task graph.
pub struct TaskGraph {
    pub(super) nodes: Vec<TaskNode>,
    index: FxHashMap<String, TaskId>,
}

impl TaskGraph {
    pub fn resolve(&self, name: &str) -> Result<TaskId, TaskError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| TaskError::NotFound(name.to_string()))
    }

    pub fn name(&self, id: TaskId) -> &str {
        &self.nodes[id].name
    }

    /// All registered task names (stable registration order).
    pub fn task_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Declares tasks by name; name references resolve and the graph is
/// cycle-checked in `build()`, so configuration errors surface before
/// anything runs.
#[derive(Default)]
pub struct GraphBuilder {
    tasks: Vec<(String, PendingKind, Vec<String>)>,
}

enum PendingKind {
    Leaf(TaskBody),
    Seq(Vec<String>),
    Par(Vec<String>),
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(&mut self, name: impl Into<String>, body: TaskBody) -> &mut Self {
        self.tasks.push((name.into(), PendingKind::Leaf(body), vec![]));
        self
    }

    pub fn leaf_with_deps(
        &mut self,
        name: impl Into<String>,
        body: TaskBody,
        deps: Vec<String>,
    ) -> &mut Self {
        self.tasks.push((name.into(), PendingKind::Leaf(body), deps));
        self
    }

    pub fn seq(&mut self, name: impl Into<String>, members: Vec<String>) -> &mut Self {
        self.tasks.push((name.into(), PendingKind::Seq(members), vec![]));
        self
    }

    pub fn par(&mut self, name: impl Into<String>, members: Vec<String>) -> &mut Self {
        self.tasks.push((name.into(), PendingKind::Par(members), vec![]));
        self
    }

    /// Resolve references and validate acyclicity.
    pub fn build(self) -> Result<TaskGraph, TaskError> {
        let mut index = FxHashMap::default();
        for (i, (name, _, _)) in self.tasks.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(TaskError::Duplicate(name.clone()));
            }
        }

        let resolve = |owner: &str, name: &str| -> Result<TaskId, TaskError> {
            index
                .get(name)
                .copied()
                .ok_or_else(|| TaskError::UnknownReference(owner.to_string(), name.to_string()))
        };

        let mut nodes = Vec::with_capacity(self.tasks.len());
        for (name, kind, deps) in self.tasks {
            let depends_on = deps
                .iter()
                .map(|d| resolve(&name, d))
                .collect::<Result<Vec<_>, _>>()?;
            let kind = match kind {
                PendingKind::Leaf(body) => TaskKind::Leaf(body),
                PendingKind::Seq(members) => TaskKind::Seq(
                    members
                        .iter()
                        .map(|m| resolve(&name, m))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                PendingKind::Par(members) => TaskKind::Par(
                    members
                        .iter()
                        .map(|m| resolve(&name, m))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
            };
            nodes.push(TaskNode {
                name,
                kind,
                depends_on,
            });
        }

        let graph = TaskGraph { nodes, index };
        graph.check_cycles()?;
        Ok(graph)
    }
}

impl TaskGraph {
    /// DFS coloring over dependency + membership edges.
    fn check_cycles(&self) -> Result<(), TaskError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn visit(
            graph: &TaskGraph,
            id: TaskId,
            colors: &mut [Color],
        ) -> Result<(), TaskError> {
            match colors[id] {
                Color::Black => return Ok(()),
                Color::Gray => {
                    return Err(TaskError::Cycle(graph.nodes[id].name.clone()));
                }
                Color::White => {}
            }
            colors[id] = Color::Gray;
            for &edge in graph.edges(id).iter() {
                visit(graph, edge, colors)?;
            }
            colors[id] = Color::Black;
            Ok(())
        }

        let mut colors = vec![Color::White; self.nodes.len()];
        for id in 0..self.nodes.len() {
            visit(self, id, &mut colors)?;
        }
        Ok(())
    }

    pub(super) fn edges(&self, id: TaskId) -> Vec<TaskId> {
        let node = &self.nodes[id];
        let mut edges = node.depends_on.clone();
        match &node.kind {
            TaskKind::Leaf(_) => {}
            TaskKind::Seq(members) | TaskKind::Par(members) => edges.extend(members),
        }
        edges
    }
}
