use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::core::error::LauncherResult;

use super::node::{Outcome, Scheduler, Significance, Task, TaskContext, TaskNode};

type Body = Arc<dyn Fn(TaskContext) -> BoxFuture<'static, LauncherResult<Outcome>> + Send + Sync>;

/// A task built from a closure, for glue steps that need no state of their own.
pub struct SimpleTask {
    name: String,
    significance: Significance,
    scheduler: Scheduler,
    relies_on_dependencies: bool,
    relies_on_dependents: bool,
    body: Body,
}

impl SimpleTask {
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LauncherResult<Outcome>> + Send + 'static,
    {
        Self {
            name: name.into(),
            significance: Significance::Major,
            scheduler: Scheduler::Default,
            relies_on_dependencies: true,
            relies_on_dependents: true,
            body: Arc::new(move |cx| -> BoxFuture<'static, LauncherResult<Outcome>> {
                Box::pin(body(cx))
            }),
        }
    }

    pub fn with_significance(mut self, significance: Significance) -> Self {
        self.significance = significance;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn relying_on_dependencies(mut self, relies: bool) -> Self {
        self.relies_on_dependencies = relies;
        self
    }

    pub fn relying_on_dependents(mut self, relies: bool) -> Self {
        self.relies_on_dependents = relies;
        self
    }

    pub fn into_node(self) -> TaskNode {
        TaskNode::new(self)
    }
}

#[async_trait]
impl Task for SimpleTask {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn significance(&self) -> Significance {
        self.significance
    }

    fn scheduler(&self) -> Scheduler {
        self.scheduler
    }

    fn relies_on_dependencies(&self) -> bool {
        self.relies_on_dependencies
    }

    fn relies_on_dependents(&self) -> bool {
        self.relies_on_dependents
    }

    async fn execute(&self, cx: &TaskContext) -> LauncherResult<Outcome> {
        (self.body)(cx.clone()).await
    }
}
