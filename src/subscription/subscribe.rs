use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use crate::{observer::Observer, subscription::completion::Completion, DisposeBag, SharedError};

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the observable stream and specifies how to handle emitted values.
    ///
    /// The `Subscriber` parameter defines the behavior for processing values emitted
    /// by the observable stream. The implementation of this method should establish
    /// the subscription and manage the delivery of values to the subscriber.
    ///
    /// The returned `Subscription` allows the caller to dispose the subscription,
    /// after which no further events reach the subscriber.
    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, allowing the clean release of resources
/// associated with a subscription.
pub trait Unsubscribeable {
    /// Unsubscribes from a subscription and releases associated resources.
    ///
    /// The instance this method is called on is consumed, making it unusable after
    /// the `unsubscribe` operation.
    fn unsubscribe(self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(SharedError) + Send>;

/// A type that acts as an observer, allowing users to handle emitted values, errors,
/// and completion when subscribing to an `Observable` or a subject.
///
/// Once `complete` or `error` has been delivered, or the subscription created for
/// this subscriber has been disposed, every further event is dropped.
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    stopped: bool,
    cancelled: Arc<AtomicBool>,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` instance with custom handling functions for emitted
    /// values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(SharedError) + 'static + Send,
        complete_fn: impl FnMut() + 'static + Send,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            stopped: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new Subscriber with the provided `next` function.
    ///
    /// The `next` closure is called when the observable emits a new item.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            stopped: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a Subscriber whose completion fulfills `completion`.
    pub fn with_completion(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        completion: &Completion,
    ) -> Self {
        let mut s = Self::on_next(next_fn);
        let completion = completion.clone();
        s.on_complete(move || completion.fulfill());
        s
    }

    /// Set the completion function for the Subscriber.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Set the error-handling function for the Subscriber.
    pub fn on_error(&mut self, error_fn: impl FnMut(SharedError) + 'static + Send) {
        self.error_fn = Some(Box::new(error_fn));
    }

    /// Returns `true` once the subscriber has terminated or its subscription has
    /// been disposed. Producers can poll this to stop emitting early.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.stopped || self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.is_closed() {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.is_closed() {
            return;
        }
        self.stopped = true;
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }

    fn error(&mut self, observable_error: SharedError) {
        if self.is_closed() {
            return;
        }
        self.stopped = true;
        match &mut self.error_fn {
            Some(efn) => (efn)(observable_error),
            None => tracing::warn!(error = %observable_error, "unhandled observable error"),
        }
    }
}

/// Represents a subscription to an observable or a subject.
///
/// Disposing runs the unsubscribe logic exactly once; later calls are no-ops.
/// Dropping a `Subscription` does not dispose it, collect it in a [`DisposeBag`]
/// for scoped teardown.
pub struct Subscription {
    unsubscribe_logic: Mutex<UnsubscribeLogic>,
    disposed: AtomicBool,
}

impl Subscription {
    /// Creates a new Subscription with the specified unsubscribe logic.
    ///
    /// See [`UnsubscribeLogic`] for the available unsubscribe strategies.
    ///
    /// [`UnsubscribeLogic`]: enum.UnsubscribeLogic.html
    #[must_use]
    pub fn new(unsubscribe_logic: UnsubscribeLogic) -> Self {
        Subscription {
            unsubscribe_logic: Mutex::new(unsubscribe_logic),
            disposed: AtomicBool::new(false),
        }
    }

    /// A subscription with nothing to release.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(UnsubscribeLogic::Nil)
    }

    /// Runs the unsubscribe logic if it has not run yet.
    ///
    /// Safe to call from inside the subscriber's own callbacks.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let logic = std::mem::replace(
            &mut *crate::lock(&self.unsubscribe_logic),
            UnsubscribeLogic::Nil,
        );
        logic.unsubscribe();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Hands this subscription over to `bag`, which disposes it on teardown.
    pub fn disposed_by(self, bag: &DisposeBag) {
        bag.insert(self);
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(self) {
        self.dispose();
    }
}

/// Enumerates various unsubscribe logic options for a subscription.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),
}

impl UnsubscribeLogic {
    fn unsubscribe(self) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => subscription.dispose(),
        }
    }
}
