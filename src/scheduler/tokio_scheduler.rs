use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::runtime::Handle;

use super::{Scheduler, Task};
use crate::{
    subscribe::{Subscription, UnsubscribeLogic},
    ObservableError, Result,
};

/// Runs work as tokio tasks on the bound runtime.
///
/// Delayed work sleeps on the runtime's timer, so the caller is never blocked.
/// Disposing the returned subscription aborts the task; the cancellation flag is
/// also checked right before the work runs, so work whose timer already fired
/// is still dropped if the task has not started it yet.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        TokioScheduler { handle }
    }

    /// Binds the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::NoRuntime`] when called outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| ObservableError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Option<Duration>, task: Task) -> Subscription {
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancelled_c = Arc::clone(&cancelled);

        let join_handle = self.handle.spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if cancelled_c.load(Ordering::Acquire) {
                return;
            }
            task();
        });

        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            cancelled.store(true, Ordering::Release);
            join_handle.abort();
        })))
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn runs_after_delay_without_blocking() {
        let ran = Arc::new(Mutex::new(false));
        let ran_c = Arc::clone(&ran);
        let scheduler = TokioScheduler::current().unwrap();

        let _s = scheduler.schedule(
            Some(Duration::from_millis(20)),
            Box::new(move || *ran_c.lock().unwrap() = true),
        );

        assert!(!*ran.lock().unwrap());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(*ran.lock().unwrap());
    }

    #[tokio::test]
    async fn disposed_work_never_runs() {
        let ran = Arc::new(Mutex::new(false));
        let ran_c = Arc::clone(&ran);
        let scheduler = TokioScheduler::current().unwrap();

        let s = scheduler.schedule(
            Some(Duration::from_millis(20)),
            Box::new(move || *ran_c.lock().unwrap() = true),
        );
        s.dispose();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!*ran.lock().unwrap());
    }

    #[test]
    fn current_outside_runtime_fails() {
        assert!(matches!(
            TokioScheduler::current(),
            Err(ObservableError::NoRuntime)
        ));
    }
}
