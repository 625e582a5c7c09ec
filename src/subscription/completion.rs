use std::{
    sync::{Arc, Condvar, Mutex, PoisonError},
    time::Duration,
};

use tokio::sync::watch;

use crate::{ObservableError, Result};

/// One-shot signal that is satisfied when an observable completes.
///
/// Cloned handles share the same signal. Waiting is always bounded: a wait that
/// outlives its timeout returns [`ObservableError::Timeout`].
///
/// ```no_run
/// use std::time::Duration;
/// use rxcore::{observable, subscribe::Subscriber, Completion, Subscribeable};
///
/// let done = Completion::new();
/// observable::just(1).subscribe(Subscriber::with_completion(|_| {}, &done));
/// done.wait(Duration::from_secs(1)).unwrap();
/// ```
#[derive(Clone)]
pub struct Completion {
    inner: Arc<CompletionInner>,
}

struct CompletionInner {
    fulfilled: Mutex<bool>,
    cond: Condvar,
    tx: watch::Sender<bool>,
}

impl Completion {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Completion {
            inner: Arc::new(CompletionInner {
                fulfilled: Mutex::new(false),
                cond: Condvar::new(),
                tx,
            }),
        }
    }

    /// Marks the signal as satisfied and wakes every waiter. Idempotent.
    pub fn fulfill(&self) {
        let mut fulfilled = crate::lock(&self.inner.fulfilled);
        if *fulfilled {
            return;
        }
        *fulfilled = true;
        self.inner.tx.send_replace(true);
        self.inner.cond.notify_all();
    }

    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        *crate::lock(&self.inner.fulfilled)
    }

    /// Blocks the current thread until the signal is fulfilled or `timeout` elapses.
    ///
    /// Do not call this from inside a tokio task, use [`wait_async`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::Timeout`] if the signal was not fulfilled in time.
    ///
    /// [`wait_async`]: Completion::wait_async
    pub fn wait(&self, timeout: Duration) -> Result<()> {
        let fulfilled = crate::lock(&self.inner.fulfilled);
        let (fulfilled, _) = self
            .inner
            .cond
            .wait_timeout_while(fulfilled, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);

        if *fulfilled {
            Ok(())
        } else {
            tracing::warn!(?timeout, "completion not fulfilled in time");
            Err(ObservableError::Timeout(timeout))
        }
    }

    /// Awaits the signal on the tokio runtime, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::Timeout`] if the signal was not fulfilled in time.
    pub async fn wait_async(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.inner.tx.subscribe();
        // The `Ref` returned by `wait_for` borrows `rx`; release it before matching.
        let outcome = tokio::time::timeout(timeout, rx.wait_for(|done| *done))
            .await
            .map(|r| r.map(|_| ()));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) | Err(_) => {
                tracing::warn!(?timeout, "completion not fulfilled in time");
                Err(ObservableError::Timeout(timeout))
            }
        }
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wait_returns_once_fulfilled_from_another_thread() {
        let done = Completion::new();
        let done_c = done.clone();

        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            done_c.fulfill();
        });

        assert!(done.wait(Duration::from_secs(2)).is_ok());
        assert!(done.is_fulfilled());
    }

    #[test]
    fn wait_times_out() {
        let done = Completion::new();

        let r = done.wait(Duration::from_millis(10));

        assert!(matches!(r, Err(ObservableError::Timeout(_))));
    }

    #[tokio::test]
    async fn wait_async_sees_earlier_fulfill() {
        let done = Completion::new();
        done.fulfill();
        done.fulfill();

        assert!(done.wait_async(Duration::from_millis(50)).await.is_ok());
    }

    #[tokio::test]
    async fn wait_async_wakes_on_later_fulfill() {
        let done = Completion::new();
        let done_c = done.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            done_c.fulfill();
        });

        assert!(done.wait_async(Duration::from_secs(2)).await.is_ok());
    }

    #[tokio::test]
    async fn wait_async_times_out() {
        let done = Completion::new();

        let r = done.wait_async(Duration::from_millis(10)).await;

        assert!(matches!(r, Err(ObservableError::Timeout(_))));
    }
}
