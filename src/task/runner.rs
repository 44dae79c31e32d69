//! Task graph execution.
//!
//! The scheduler tracks completion per node, so a task shared by several
//! parents (diamond) runs exactly once per invocation. Parallel group
//! members run on rayon; the first failure becomes the group's failure
//! after every started sibling finishes (no forced cancellation).

use parking_lot::{Condvar, Mutex};
use rayon::prelude::*;

use super::graph::{TaskBody, TaskError, TaskGraph, TaskId, TaskKind};
use crate::config::{BuildOptions, Config};
use crate::log;

#[derive(Clone)]
enum NodeState {
    NotStarted,
    Running,
    Done,
    Failed(TaskError),
}

struct Scheduler<'a> {
    graph: &'a TaskGraph,
    config: &'a Config,
    options: &'a BuildOptions,
    states: Vec<(Mutex<NodeState>, Condvar)>,
}

/// Run a task by name, resolving dependencies recursively.
pub fn run_task(
    graph: &TaskGraph,
    name: &str,
    config: &Config,
    options: &BuildOptions,
) -> Result<(), TaskError> {
    let id = graph.resolve(name)?;
    let scheduler = Scheduler {
        graph,
        config,
        options,
        states: (0..graph.nodes.len())
            .map(|_| (Mutex::new(NodeState::NotStarted), Condvar::new()))
            .collect(),
    };
    scheduler.run(id)
}

impl Scheduler<'_> {
    fn run(&self, id: TaskId) -> Result<(), TaskError> {
        // Claim the node, or wait for whoever already runs it.
        {
            let (lock, cvar) = &self.states[id];
            let mut state = lock.lock();
            loop {
                match &*state {
                    NodeState::Done => return Ok(()),
                    NodeState::Failed(err) => return Err(err.clone()),
                    NodeState::Running => cvar.wait(&mut state),
                    NodeState::NotStarted => {
                        *state = NodeState::Running;
                        break;
                    }
                }
            }
        }

        let result = self.execute(id);

        let (lock, cvar) = &self.states[id];
        let mut state = lock.lock();
        *state = match &result {
            Ok(()) => NodeState::Done,
            Err(err) => NodeState::Failed(err.clone()),
        };
        cvar.notify_all();
        result
    }

    fn execute(&self, id: TaskId) -> Result<(), TaskError> {
        let node = &self.graph.nodes[id];

        // dependsOn completes, in order, before the body starts
        for &dep in &node.depends_on {
            self.run(dep)?;
        }

        match &node.kind {
            TaskKind::Leaf(TaskBody::Pipeline(pipeline)) => pipeline
                .run(self.config, self.options)
                .map_err(|e| {
                    log!("error"; "{e}");
                    TaskError::Failed {
                        task: node.name.clone(),
                        message: e.to_string(),
                    }
                }),
            TaskKind::Leaf(TaskBody::Action(action)) => action(self.config, self.options),
            TaskKind::Seq(members) => {
                for &member in members {
                    self.run(member)?;
                }
                Ok(())
            }
            TaskKind::Par(members) => {
                // run everything; report the first failure afterwards
                let results: Vec<Result<(), TaskError>> =
                    members.par_iter().map(|&member| self.run(member)).collect();
                results.into_iter().collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::graph::GraphBuilder;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn fixtures() -> (Config, BuildOptions) {
        (crate::config::test_parse_config(""), BuildOptions::default())
    }

    fn write_action(path: PathBuf, body: &'static str) -> TaskBody {
        TaskBody::Action(Box::new(move |_, _| {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, body).unwrap();
            Ok(())
        }))
    }

    #[test]
    fn test_seq_ordering_contract() {
        // B reads a file only A writes; a sequential group must never
        // start B before A finished.
        let tmp = TempDir::new().unwrap();
        let handoff = tmp.path().join("handoff.txt");
        let out = tmp.path().join("out.txt");

        let mut b = GraphBuilder::new();
        b.leaf("a", write_action(handoff.clone(), "from-a"));
        let out_clone = out.clone();
        let handoff_clone = handoff.clone();
        b.leaf(
            "b",
            TaskBody::Action(Box::new(move |_, _| {
                let body = fs::read_to_string(&handoff_clone).map_err(|e| {
                    TaskError::Failed {
                        task: "b".into(),
                        message: e.to_string(),
                    }
                })?;
                fs::write(&out_clone, body).unwrap();
                Ok(())
            })),
        );
        b.seq("both", vec!["a".into(), "b".into()]);

        let graph = b.build().unwrap();
        let (config, options) = fixtures();
        for _ in 0..20 {
            fs::remove_file(&handoff).ok();
            fs::remove_file(&out).ok();
            run_task(&graph, "both", &config, &options).unwrap();
            assert_eq!(fs::read_to_string(&out).unwrap(), "from-a");
        }
    }

    #[test]
    fn test_par_disjoint_writes_succeed() {
        let tmp = TempDir::new().unwrap();

        let mut b = GraphBuilder::new();
        b.leaf("a", write_action(tmp.path().join("a/out.txt"), "a"));
        b.leaf("b", write_action(tmp.path().join("b/out.txt"), "b"));
        b.par("both", vec!["a".into(), "b".into()]);

        let graph = b.build().unwrap();
        let (config, options) = fixtures();
        run_task(&graph, "both", &config, &options).unwrap();

        assert!(tmp.path().join("a/out.txt").exists());
        assert!(tmp.path().join("b/out.txt").exists());
    }

    #[test]
    fn test_par_failure_lets_siblings_finish() {
        let tmp = TempDir::new().unwrap();

        let mut b = GraphBuilder::new();
        b.leaf(
            "bad",
            TaskBody::Action(Box::new(|_, _| {
                Err(TaskError::Failed {
                    task: "bad".into(),
                    message: "boom".into(),
                })
            })),
        );
        b.leaf("good", write_action(tmp.path().join("good.txt"), "ok"));
        b.par("both", vec!["bad".into(), "good".into()]);

        let graph = b.build().unwrap();
        let (config, options) = fixtures();
        let err = run_task(&graph, "both", &config, &options).unwrap_err();

        assert!(matches!(err, TaskError::Failed { .. }));
        // sibling still produced its output
        assert!(tmp.path().join("good.txt").exists());
    }

    #[test]
    fn test_diamond_runs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let mut b = GraphBuilder::new();
        b.leaf(
            "base",
            TaskBody::Action(Box::new(move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })),
        );
        b.leaf_with_deps(
            "left",
            TaskBody::Action(Box::new(|_, _| Ok(()))),
            vec!["base".into()],
        );
        b.leaf_with_deps(
            "right",
            TaskBody::Action(Box::new(|_, _| Ok(()))),
            vec!["base".into()],
        );
        b.par("top", vec!["left".into(), "right".into()]);

        let graph = b.build().unwrap();
        let (config, options) = fixtures();
        run_task(&graph, "top", &config, &options).unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_task_name() {
        let graph = GraphBuilder::new().build().unwrap();
        let (config, options) = fixtures();
        assert!(matches!(
            run_task(&graph, "nope", &config, &options),
            Err(TaskError::NotFound(_))
        ));
    }

    #[test]
    fn test_dependency_failure_propagates() {
        let mut b = GraphBuilder::new();
        b.leaf(
            "dep",
            TaskBody::Action(Box::new(|_, _| {
                Err(TaskError::Failed {
                    task: "dep".into(),
                    message: "no".into(),
                })
            })),
        );
        b.leaf_with_deps(
            "main",
            TaskBody::Action(Box::new(|_, _| Ok(()))),
            vec!["dep".into()],
        );

        let graph = b.build().unwrap();
        let (config, options) = fixtures();
        assert!(run_task(&graph, "main", &config, &options).is_err());
    }
}
