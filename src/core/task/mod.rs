// ─── Task Engine ───
// Dependency-ordered async execution for installation steps.

mod cancel;
mod executor;
mod node;
mod simple;

pub use cancel::CancelToken;
pub use executor::{ExecutionReport, TaskExecutor, TaskFailure, TaskGraph};
pub use node::{Outcome, Scheduler, Significance, Task, TaskContext, TaskNode, TaskState};
pub use simple::SimpleTask;
