use std::{
    cmp::Ordering as CmpOrdering,
    collections::BinaryHeap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use super::{Scheduler, Task};
use crate::subscribe::{Subscription, UnsubscribeLogic};

/// A virtual time scheduler for deterministic testing.
///
/// Work only runs when the clock is moved with [`advance_by`], [`advance_to`]
/// or [`flush`]. Tasks run in order of their due time, FIFO among tasks due at
/// the same instant. Work scheduled without a delay is due at the current
/// virtual time and runs on the next advance.
///
/// Clones share the same clock and queue.
///
/// [`advance_by`]: TestScheduler::advance_by
/// [`advance_to`]: TestScheduler::advance_to
/// [`flush`]: TestScheduler::flush
#[derive(Clone, Default)]
pub struct TestScheduler {
    state: Arc<Mutex<TestSchedulerState>>,
}

#[derive(Default)]
struct TestSchedulerState {
    now: Duration,
    next_id: u64,
    queue: BinaryHeap<ScheduledTask>,
}

struct ScheduledTask {
    due: Duration,
    id: u64,
    task: Task,
    cancelled: Arc<AtomicBool>,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    // Reversed so the max-heap pops the earliest task first.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl TestScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        crate::lock(&self.state).now
    }

    /// Number of tasks that are queued and not disposed.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        crate::lock(&self.state)
            .queue
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::Acquire))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_count() == 0
    }

    /// Advances virtual time by `duration`, running every task that falls due.
    pub fn advance_by(&self, duration: Duration) {
        let target = self.now() + duration;
        self.advance_to(target);
    }

    /// Advances virtual time to `target`, running every task due at or before it.
    ///
    /// Tasks scheduled by running tasks are picked up if they fall due in time.
    pub fn advance_to(&self, target: Duration) {
        while let Some(task) = self.pop_due(Some(target)) {
            Self::run(task);
        }
        let mut state = crate::lock(&self.state);
        if state.now < target {
            state.now = target;
        }
    }

    /// Runs every queued task, moving the clock to each task's due time.
    pub fn flush(&self) {
        while let Some(task) = self.pop_due(None) {
            Self::run(task);
        }
    }

    fn pop_due(&self, limit: Option<Duration>) -> Option<ScheduledTask> {
        let mut state = crate::lock(&self.state);
        let due = state.queue.peek()?.due;
        if limit.is_some_and(|limit| due > limit) {
            return None;
        }
        let task = state.queue.pop()?;
        if task.due > state.now {
            state.now = task.due;
        }
        Some(task)
    }

    fn run(task: ScheduledTask) {
        if task.cancelled.load(Ordering::Acquire) {
            return;
        }
        (task.task)();
    }
}

impl Scheduler for TestScheduler {
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription {
        let cancelled = Arc::new(AtomicBool::new(false));
        {
            let mut state = crate::lock(&self.state);
            let due = state.now + delay.unwrap_or_default();
            let id = state.next_id;
            state.next_id += 1;
            state.queue.push(ScheduledTask {
                due,
                id,
                task,
                cancelled: Arc::clone(&cancelled),
            });
        }

        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            cancelled.store(true, Ordering::Release);
        })))
    }
}
