//! Schedulers decide when a unit of work runs.
//!
//! Every scheduler returns a `Subscription` for the work it accepted. Disposing
//! that subscription before the work starts guarantees it never runs.
//!
//! - [`ImmediateScheduler`] runs work on the calling stack.
//! - [`TokioScheduler`] runs work on a tokio runtime after an optional delay,
//!   without blocking the caller.
//! - [`TestScheduler`] runs work against a virtual clock advanced by hand.

mod immediate;
mod test_scheduler;
mod tokio_scheduler;

pub use immediate::ImmediateScheduler;
pub use test_scheduler::TestScheduler;
pub use tokio_scheduler::TokioScheduler;

use std::time::Duration;

use crate::subscribe::Subscription;

/// A unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send>;

pub trait Scheduler: Send + Sync {
    /// Runs `task` after `delay`, or as soon as the scheduler allows when `delay`
    /// is `None`.
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription;
}
