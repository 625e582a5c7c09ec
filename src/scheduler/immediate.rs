use std::time::Duration;

use super::{Scheduler, Task};
use crate::subscribe::Subscription;

/// Runs work synchronously on the calling thread.
///
/// A delay blocks the calling thread for its duration before the work runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription {
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        task();
        Subscription::empty()
    }
}
