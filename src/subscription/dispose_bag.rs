use std::sync::Mutex;

use super::subscribe::Subscription;

/// Collects subscriptions and disposes all of them together.
///
/// Subscriptions are disposed in insertion order, exactly once, either by an
/// explicit call to [`dispose`](DisposeBag::dispose) or when the bag is dropped.
/// Inserting into a bag that was already disposed disposes the subscription
/// right away.
pub struct DisposeBag {
    subscriptions: Mutex<Option<Vec<Subscription>>>,
}

impl DisposeBag {
    #[must_use]
    pub fn new() -> Self {
        DisposeBag {
            subscriptions: Mutex::new(Some(Vec::new())),
        }
    }

    pub fn insert(&self, subscription: Subscription) {
        let mut subscriptions = crate::lock(&self.subscriptions);
        if let Some(s) = subscriptions.as_mut() {
            s.push(subscription);
            return;
        }
        drop(subscriptions);
        subscription.dispose();
    }

    /// Number of subscriptions waiting to be disposed.
    pub fn len(&self) -> usize {
        crate::lock(&self.subscriptions).as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_disposed(&self) -> bool {
        crate::lock(&self.subscriptions).is_none()
    }

    pub fn dispose(&self) {
        let Some(subscriptions) = crate::lock(&self.subscriptions).take() else {
            return;
        };
        tracing::trace!(count = subscriptions.len(), "disposing bag");
        for s in subscriptions {
            s.dispose();
        }
    }
}

impl Default for DisposeBag {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose();
    }
}
