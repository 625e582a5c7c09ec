//! The `observable` module provides the building blocks for creating and manipulating
//! observables.
//!
//! Observables are cold: constructing one never runs producer logic. The subscribe
//! function runs once per `subscribe` call, so each subscription is independent.

mod create;
mod delay;
mod flatten;
mod merge;

pub use create::{empty, from_iter, just, throw};
pub use merge::merge;

use std::{
    sync::{atomic::Ordering, Arc, Mutex},
    time::Duration,
};

use crate::{
    observer::Observer,
    scheduler::Scheduler,
    subscription::subscribe::{Subscribeable, Subscriber, Subscription, UnsubscribeLogic},
};

/// The `Observable` struct represents a source of values that can be observed
/// and transformed.
///
/// An observable is identified by its subscribe function: a closure receiving
/// the `Subscriber` and returning the `Subscription` that tears the producer
/// down.
///
/// # Example
///
///```no_run
/// use rxcore::{
///     subscribe::{Subscriber, Subscription},
///     Observable, Observer, Subscribeable,
/// };
///
/// let mut observable = Observable::new(|mut o: Subscriber<_>| {
///     for i in 0..3 {
///         if o.is_closed() {
///             break;
///         }
///         o.next(i);
///     }
///     o.complete();
///     Subscription::empty()
/// });
///
/// observable.subscribe(Subscriber::on_next(|v: i32| println!("{v}")));
///```
pub struct Observable<T> {
    subscribe_fn: Box<dyn FnMut(Subscriber<T>) -> Subscription + Send + Sync>,
}

impl<T> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// `sf` is invoked on every subscription to deliver values to the `Subscriber`.
    /// It should return a `Subscription` that releases whatever the producer holds
    /// (registrations, timers, child subscriptions).
    pub fn new(sf: impl FnMut(Subscriber<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Observable {
            subscribe_fn: Box::new(sf),
        }
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<Self::ObsType>) -> Subscription {
        // Disposal closes the subscriber first, so nothing in flight reaches it
        // once `dispose` has returned.
        let cancelled = v.cancel_flag();
        let inner = (self.subscribe_fn)(v);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            cancelled.store(true, Ordering::Release);
            inner.dispose();
        })))
    }
}

/// Shares the downstream subscriber between the closures of an operator.
pub(crate) type SharedSubscriber<T> = Arc<Mutex<Subscriber<T>>>;

/// The `ObservableExt` trait provides a set of extension methods that can be applied
/// to observables and subjects to transform and combine them.
pub trait ObservableExt<T: 'static>: Subscribeable<ObsType = T> {
    /// Erases the source type, turning any subscribable (a subject, for example)
    /// into a plain `Observable`.
    fn into_observable(mut self) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        Observable::new(move |o| self.subscribe(o))
    }

    /// Transforms the items emitted by the observable using a transformation
    /// function.
    fn map<U, F>(mut self, f: F) -> Observable<U>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
        U: 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let u = Subscriber::new(
                move |v| {
                    let t = f(v);
                    crate::lock(&o_shared).next(t);
                },
                move |observable_error| crate::lock(&o_cloned_e).error(observable_error),
                move || crate::lock(&o_cloned_c).complete(),
            );
            self.subscribe(u)
        })
    }

    /// Filters the items emitted by the observable based on a predicate function.
    ///
    /// Only items for which the predicate function returns `true` will be emitted
    /// by the resulting observable.
    fn filter<P>(mut self, predicate: P) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let predicate = Arc::clone(&predicate);

            let u = Subscriber::new(
                move |v| {
                    if predicate(&v) {
                        crate::lock(&o_shared).next(v);
                    }
                },
                move |observable_error| crate::lock(&o_cloned_e).error(observable_error),
                move || crate::lock(&o_cloned_c).complete(),
            );
            self.subscribe(u)
        })
    }

    /// Suppresses consecutive duplicates.
    ///
    /// The first item is always emitted; each later item is emitted only when it
    /// differs from the previously emitted one.
    fn distinct_until_changed(self) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: PartialEq + Clone + Send,
    {
        self.distinct_until_changed_by(T::clone)
    }

    /// Suppresses consecutive items whose keys, as computed by `key`, are equal.
    fn distinct_until_changed_by<K, F>(mut self, key: F) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        K: PartialEq + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let key = Arc::clone(&key);

            let mut last: Option<K> = None;
            let u = Subscriber::new(
                move |v| {
                    let k = key(&v);
                    if last.as_ref() == Some(&k) {
                        return;
                    }
                    last = Some(k);
                    crate::lock(&o_shared).next(v);
                },
                move |observable_error| crate::lock(&o_cloned_e).error(observable_error),
                move || crate::lock(&o_cloned_c).complete(),
            );
            self.subscribe(u)
        })
    }

    /// Applies an accumulator to each item and emits every intermediate result.
    fn scan<A, F>(mut self, seed: A, f: F) -> Observable<A>
    where
        Self: Sized + Send + Sync + 'static,
        A: Clone + Send + Sync + 'static,
        F: Fn(A, T) -> A + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let mut acc = Some(seed.clone());
            let u = Subscriber::new(
                move |v| {
                    if let Some(a) = acc.take() {
                        let a = f(a, v);
                        acc = Some(a.clone());
                        crate::lock(&o_shared).next(a);
                    }
                },
                move |observable_error| crate::lock(&o_cloned_e).error(observable_error),
                move || crate::lock(&o_cloned_c).complete(),
            );
            self.subscribe(u)
        })
    }

    /// Folds every item into an accumulator and emits the final result once the
    /// source completes. An empty source emits `seed`.
    fn reduce<A, F>(mut self, seed: A, f: F) -> Observable<A>
    where
        Self: Sized + Send + Sync + 'static,
        A: Clone + Send + Sync + 'static,
        F: Fn(A, T) -> A + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let acc = Arc::new(Mutex::new(Some(seed.clone())));
            let acc_c = Arc::clone(&acc);
            let u = Subscriber::new(
                move |v| {
                    let mut acc = crate::lock(&acc);
                    if let Some(a) = acc.take() {
                        *acc = Some(f(a, v));
                    }
                },
                move |observable_error| crate::lock(&o_cloned_e).error(observable_error),
                move || {
                    let result = crate::lock(&acc_c).take();
                    let mut o = crate::lock(&o_shared);
                    if let Some(result) = result {
                        o.next(result);
                    }
                    o.complete();
                },
            );
            self.subscribe(u)
        })
    }

    /// Merges the current observable with `sources`, forwarding items from all of
    /// them in the order they arrive.
    ///
    /// Completes once every source completed; errors as soon as any source errors.
    fn merge(self, sources: Vec<Observable<T>>) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        let mut all = Vec::with_capacity(sources.len() + 1);
        all.push(self.into_observable());
        all.extend(sources);
        merge(all)
    }

    /// Projects each item into an inner observable and merges the emissions of
    /// every inner observable into a single stream.
    ///
    /// Inner observables are never cancelled by later items. The result completes
    /// once the source and all inner observables completed.
    fn flat_map<R, F>(self, project: F) -> Observable<R>
    where
        Self: Sized + Send + Sync + 'static,
        R: 'static,
        F: FnMut(T) -> Observable<R> + Send + Sync + 'static,
    {
        flatten::flat_map(self, project)
    }

    /// Projects each item into an inner observable, keeping only the latest one.
    ///
    /// Each new item disposes the previous inner subscription before subscribing
    /// to the next, and emissions of a superseded inner observable are never
    /// forwarded. The result completes once the source and the current inner
    /// observable completed.
    fn flat_map_latest<R, F>(self, project: F) -> Observable<R>
    where
        Self: Sized + Send + Sync + 'static,
        R: 'static,
        F: FnMut(T) -> Observable<R> + Send + Sync + 'static,
    {
        flatten::flat_map_latest(self, project)
    }

    /// Re-emits every item and the completion `duration` later on `scheduler`.
    ///
    /// Errors are forwarded immediately and drop any pending items. Disposing the
    /// subscription cancels every pending delivery.
    fn delay<S>(self, duration: Duration, scheduler: S) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Send,
        S: Scheduler + Clone + 'static,
    {
        delay::delay(self, duration, scheduler)
    }
}

impl<O, T: 'static> ObservableExt<T> for O where O: Subscribeable<ObsType = T> {}
