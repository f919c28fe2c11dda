// ─── Task Nodes ───
// A node wraps one unit of work plus its edges: dependencies run (to success
// or failure) before the body, dependents run after it. A node runs at most
// once, however many parents reach it.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::core::error::{LauncherError, LauncherResult};

use super::cancel::CancelToken;

/// How a failure of this node affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    /// Failure aborts the whole run.
    Major,
    /// Failure is recorded; unrelated work continues.
    Minor,
}

/// Where the body executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduler {
    /// Bounded worker pool.
    Default,
    /// Single serialized lane shared by every node tagged with it.
    Serial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Ready,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// What a finished body hands back: an optional typed result and a
/// continuation of nodes that must finish before this one counts as done.
#[derive(Default)]
pub struct Outcome {
    pub(crate) output: Option<Arc<dyn Any + Send + Sync>>,
    pub(crate) then: Vec<TaskNode>,
}

impl Outcome {
    pub fn done() -> Self {
        Self::default()
    }

    pub fn with_output<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            output: Some(Arc::new(value)),
            then: Vec::new(),
        }
    }

    pub fn then(mut self, node: TaskNode) -> Self {
        self.then.push(node);
        self
    }

    pub fn then_all(mut self, nodes: impl IntoIterator<Item = TaskNode>) -> Self {
        self.then.extend(nodes);
        self
    }
}

/// Passed to `prepare` and `execute`.
#[derive(Clone)]
pub struct TaskContext {
    cancel: CancelToken,
    failed_dependencies: Arc<Vec<(String, Arc<LauncherError>)>>,
}

impl TaskContext {
    pub(crate) fn new(cancel: CancelToken, failed_dependencies: Vec<(String, Arc<LauncherError>)>) -> Self {
        Self {
            cancel,
            failed_dependencies: Arc::new(failed_dependencies),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn dependencies_succeeded(&self) -> bool {
        self.failed_dependencies.is_empty()
    }

    /// `(name, error)` of every dependency that did not succeed.
    pub fn failed_dependencies(&self) -> &[(String, Arc<LauncherError>)] {
        &self.failed_dependencies
    }
}

#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> String;

    fn significance(&self) -> Significance {
        Significance::Major
    }

    fn scheduler(&self) -> Scheduler {
        Scheduler::Default
    }

    /// Skip the body when a dependency failed.
    fn relies_on_dependencies(&self) -> bool {
        true
    }

    /// Count as failed when a dependent (or continuation) failed.
    fn relies_on_dependents(&self) -> bool {
        true
    }

    /// Runs before dependencies are awaited; returned nodes join them.
    async fn prepare(&self, _cx: &TaskContext) -> LauncherResult<Vec<TaskNode>> {
        Ok(Vec::new())
    }

    async fn execute(&self, cx: &TaskContext) -> LauncherResult<Outcome>;
}

type Finalizer = Box<dyn FnOnce(bool) + Send>;

pub(crate) struct NodeInner {
    pub(crate) task: Arc<dyn Task>,
    dependencies: Mutex<Vec<TaskNode>>,
    dependents: Mutex<Vec<TaskNode>>,
    finalizers: Mutex<Vec<Finalizer>>,
    state: Mutex<TaskState>,
    error: Mutex<Option<Arc<LauncherError>>>,
    output: Mutex<Option<Arc<dyn Any + Send + Sync>>>,
    pub(crate) done: OnceCell<bool>,
}

/// Shared handle to a node; clones refer to the same node.
#[derive(Clone)]
pub struct TaskNode {
    pub(crate) inner: Arc<NodeInner>,
}

impl TaskNode {
    pub fn new(task: impl Task + 'static) -> Self {
        Self::from_arc(Arc::new(task))
    }

    pub fn from_arc(task: Arc<dyn Task>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                task,
                dependencies: Mutex::new(Vec::new()),
                dependents: Mutex::new(Vec::new()),
                finalizers: Mutex::new(Vec::new()),
                state: Mutex::new(TaskState::Ready),
                error: Mutex::new(None),
                output: Mutex::new(None),
                done: OnceCell::new(),
            }),
        }
    }

    pub fn with_dependency(self, dependency: TaskNode) -> Self {
        lock(&self.inner.dependencies).push(dependency);
        self
    }

    pub fn with_dependencies(self, dependencies: impl IntoIterator<Item = TaskNode>) -> Self {
        lock(&self.inner.dependencies).extend(dependencies);
        self
    }

    pub fn with_dependent(self, dependent: TaskNode) -> Self {
        lock(&self.inner.dependents).push(dependent);
        self
    }

    /// Register a callback run once the node settles, with its success flag.
    pub fn when_complete(self, finalizer: impl FnOnce(bool) + Send + 'static) -> Self {
        lock(&self.inner.finalizers).push(Box::new(finalizer));
        self
    }

    pub fn name(&self) -> String {
        self.inner.task.name()
    }

    pub fn significance(&self) -> Significance {
        self.inner.task.significance()
    }

    pub fn state(&self) -> TaskState {
        *lock(&self.inner.state)
    }

    pub fn error(&self) -> Option<Arc<LauncherError>> {
        lock(&self.inner.error).clone()
    }

    /// Typed view of the body's output.
    pub fn output<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let output = lock(&self.inner.output).clone()?;
        output.downcast::<T>().ok()
    }

    pub fn same_node(&self, other: &TaskNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn dependencies(&self) -> Vec<TaskNode> {
        lock(&self.inner.dependencies).clone()
    }

    pub(crate) fn dependents(&self) -> Vec<TaskNode> {
        lock(&self.inner.dependents).clone()
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        *lock(&self.inner.state) = state;
    }

    pub(crate) fn set_error(&self, error: Arc<LauncherError>) {
        *lock(&self.inner.error) = Some(error);
    }

    pub(crate) fn set_output(&self, output: Option<Arc<dyn Any + Send + Sync>>) {
        *lock(&self.inner.output) = output;
    }

    pub(crate) fn finalize(&self, success: bool) {
        let finalizers = std::mem::take(&mut *lock(&self.inner.finalizers));
        for finalizer in finalizers {
            finalizer(success);
        }
    }
}

impl fmt::Debug for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskNode")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
