// ─── Task Executor ───
// Drives a task graph to completion on the tokio runtime:
//   - independent nodes run concurrently, bounded by a semaphore
//   - `Scheduler::Serial` nodes share one lane and never overlap
//   - a node's dependencies (static + prepared) settle before its body,
//     its dependents and continuation run after
//   - a failed `Major` node cancels the rest of the run
//   - a node that did not succeed skips its dependents, transitively
// Graphs must be acyclic.

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::future::{join_all, BoxFuture};
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tracing::{debug, info, instrument, warn};

use crate::core::config::EngineConfig;
use crate::core::error::{LauncherError, LauncherResult};

use super::cancel::CancelToken;
use super::node::{lock, Scheduler, Significance, TaskContext, TaskNode, TaskState};

/// Root nodes of one installation (or any other job).
#[derive(Default)]
pub struct TaskGraph {
    roots: Vec<TaskNode>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, node: TaskNode) -> Self {
        self.roots.push(node);
        self
    }

    pub fn push(&mut self, node: TaskNode) {
        self.roots.push(node);
    }

    pub fn roots(&self) -> &[TaskNode] {
        &self.roots
    }
}

impl From<TaskNode> for TaskGraph {
    fn from(node: TaskNode) -> Self {
        Self::new().with_root(node)
    }
}

#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub name: String,
    pub significance: Significance,
    pub error: Arc<LauncherError>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Every root succeeded.
    pub succeeded: bool,
    /// Nodes whose own body (or prepare step) failed, in completion order.
    pub failures: Vec<TaskFailure>,
    /// Nodes that never ran their body.
    pub skipped: Vec<String>,
    pub cancelled: bool,
}

impl ExecutionReport {
    pub fn failure(&self, name: &str) -> Option<&TaskFailure> {
        self.failures.iter().find(|f| f.name == name)
    }

    /// The first failure that aborted the run, if any.
    pub fn blocking_failure(&self) -> Option<&TaskFailure> {
        self.failures
            .iter()
            .find(|f| f.significance == Significance::Major)
    }
}

#[derive(Clone)]
pub struct TaskExecutor {
    inner: Arc<ExecutorInner>,
}

struct ExecutorInner {
    permits: Arc<Semaphore>,
    serial_lane: Arc<AsyncMutex<()>>,
    stop: CancelToken,
}

impl TaskExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            inner: Arc::new(ExecutorInner {
                permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
                serial_lane: Arc::new(AsyncMutex::new(())),
                stop: CancelToken::new(),
            }),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_concurrency)
    }

    /// Stop every current and future run. Idempotent.
    pub fn stop(&self) {
        if !self.inner.stop.is_cancelled() {
            info!("Task executor stopping");
        }
        self.inner.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stop.is_cancelled()
    }

    #[instrument(skip_all, fields(roots = graph.roots.len()))]
    pub async fn execute(&self, graph: TaskGraph) -> ExecutionReport {
        let run = Arc::new(Run {
            executor: Arc::clone(&self.inner),
            cancel: self.inner.stop.child(),
            log: Mutex::new(RunLog::default()),
        });

        let results = join_all(
            graph
                .roots
                .into_iter()
                .map(|root| Arc::clone(&run).drive(root)),
        )
        .await;

        let log = std::mem::take(&mut *lock(&run.log));
        let report = ExecutionReport {
            succeeded: results.iter().all(|ok| *ok),
            failures: log.failures,
            skipped: log.skipped,
            cancelled: run.cancel.is_cancelled(),
        };
        info!(
            "Run finished: succeeded={} failures={} skipped={}",
            report.succeeded,
            report.failures.len(),
            report.skipped.len()
        );
        report
    }
}

#[derive(Default)]
struct RunLog {
    failures: Vec<TaskFailure>,
    skipped: Vec<String>,
}

struct Run {
    executor: Arc<ExecutorInner>,
    cancel: CancelToken,
    log: Mutex<RunLog>,
}

impl Run {
    /// Settle `node`, running it if no one has yet.
    fn drive(self: Arc<Self>, node: TaskNode) -> BoxFuture<'static, bool> {
        Box::pin(async move {
            let runner = node.clone();
            let run = Arc::clone(&self);
            let succeeded = *node.inner.done.get_or_init(|| run.run(runner)).await;
            if !succeeded {
                self.skip_dependents(node).await;
            }
            succeeded
        })
    }

    /// Dependents of a node that did not succeed never run their body.
    fn skip_dependents(self: Arc<Self>, node: TaskNode) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            for dependent in node.dependents() {
                let name = dependent.name();
                let succeeded = *dependent
                    .inner
                    .done
                    .get_or_init(|| async { self.skip(&dependent, &name) })
                    .await;
                if !succeeded {
                    Arc::clone(&self).skip_dependents(dependent).await;
                }
            }
        })
    }

    fn run(self: Arc<Self>, node: TaskNode) -> BoxFuture<'static, bool> {
        Box::pin(async move {
            let task = Arc::clone(&node.inner.task);
            let name = task.name();

            if self.cancel.is_cancelled() {
                return self.skip(&node, &name);
            }

            // ── Prepare: may add dependencies ──
            let prepared = {
                let task = Arc::clone(&task);
                let cx = TaskContext::new(self.cancel.clone(), Vec::new());
                self.guarded(&name, task.scheduler(), async move { task.prepare(&cx).await })
                    .await
            };
            let prepared = match prepared {
                Ok(nodes) => nodes,
                Err(e) => return self.fail(&node, &name, task.significance(), e),
            };

            // ── Dependencies ──
            let mut dependencies = node.dependencies();
            dependencies.extend(prepared);
            let results = join_all(
                dependencies
                    .iter()
                    .cloned()
                    .map(|dep| Arc::clone(&self).drive(dep)),
            )
            .await;

            let failed: Vec<(String, Arc<LauncherError>)> = dependencies
                .iter()
                .zip(&results)
                .filter(|(_, ok)| !**ok)
                .map(|(dep, _)| {
                    let error = dep.error().unwrap_or_else(|| {
                        Arc::new(LauncherError::Other(format!("{} did not run", dep.name())))
                    });
                    (dep.name(), error)
                })
                .collect();

            if !failed.is_empty() && task.relies_on_dependencies() {
                debug!("Task {} aborted, {} dependencies failed", name, failed.len());
                return self.skip(&node, &name);
            }
            if self.cancel.is_cancelled() {
                return self.skip(&node, &name);
            }

            // ── Body ──
            node.set_state(TaskState::Running);
            let executed = {
                let task = Arc::clone(&task);
                let cx = TaskContext::new(self.cancel.clone(), failed);
                self.guarded(&name, task.scheduler(), async move { task.execute(&cx).await })
                    .await
            };
            let outcome = match executed {
                Ok(outcome) => outcome,
                Err(e) => return self.fail(&node, &name, task.significance(), e),
            };
            node.set_output(outcome.output);

            // ── Dependents + continuation ──
            let mut dependents = node.dependents();
            dependents.extend(outcome.then);
            let results = join_all(
                dependents
                    .into_iter()
                    .map(|dep| Arc::clone(&self).drive(dep)),
            )
            .await;

            if results.iter().any(|ok| !ok) && task.relies_on_dependents() {
                debug!("Task {} failed through its dependents", name);
                node.set_error(Arc::new(LauncherError::Other(format!(
                    "Dependent tasks of {} failed",
                    name
                ))));
                node.set_state(TaskState::Failed);
                node.finalize(false);
                return false;
            }

            debug!("Task {} succeeded", name);
            node.set_state(TaskState::Succeeded);
            node.finalize(true);
            true
        })
    }

    /// Run `body` on the pool (or the serial lane), aborting it on cancellation.
    async fn guarded<T, F>(&self, name: &str, scheduler: Scheduler, body: F) -> LauncherResult<T>
    where
        F: Future<Output = LauncherResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let _lane = match scheduler {
            Scheduler::Serial => Some(Arc::clone(&self.executor.serial_lane).lock_owned().await),
            Scheduler::Default => None,
        };
        let _permit = match scheduler {
            Scheduler::Default => Some(
                Arc::clone(&self.executor.permits)
                    .acquire_owned()
                    .await
                    .map_err(|_| LauncherError::Cancelled)?,
            ),
            Scheduler::Serial => None,
        };
        if self.cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        let handle = tokio::spawn(body);
        let abort = handle.abort_handle();
        tokio::select! {
            joined = handle => match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(LauncherError::TaskPanicked(name.to_string())),
                Err(_) => Err(LauncherError::Cancelled),
            },
            _ = self.cancel.cancelled() => {
                abort.abort();
                Err(LauncherError::Cancelled)
            }
        }
    }

    fn fail(&self, node: &TaskNode, name: &str, significance: Significance, error: LauncherError) -> bool {
        if matches!(error, LauncherError::Cancelled) {
            return self.skip(node, name);
        }

        let error = Arc::new(error);
        match significance {
            Significance::Major => {
                warn!("Task {} failed, aborting run: {}", name, error);
                self.cancel.cancel();
            }
            Significance::Minor => warn!("Task {} failed: {}", name, error),
        }

        node.set_error(Arc::clone(&error));
        node.set_state(TaskState::Failed);
        lock(&self.log).failures.push(TaskFailure {
            name: name.to_string(),
            significance,
            error,
        });
        node.finalize(false);
        false
    }

    fn skip(&self, node: &TaskNode, name: &str) -> bool {
        debug!("Task {} skipped", name);
        node.set_state(TaskState::Skipped);
        lock(&self.log).skipped.push(name.to_string());
        node.finalize(false);
        false
    }
}
