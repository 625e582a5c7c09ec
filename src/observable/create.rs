use crate::{observer::Observer, subscribe::Subscription, SharedError};

use super::Observable;

/// Emits every element of `iter`, in order, then completes.
///
/// Everything happens synchronously inside `subscribe`. The iterable is cloned
/// for each subscription, so every subscriber sees the full sequence. Emission
/// stops early once the subscriber is closed.
pub fn from_iter<I>(iter: I) -> Observable<I::Item>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
{
    Observable::new(move |mut o| {
        for v in iter.clone() {
            if o.is_closed() {
                return Subscription::empty();
            }
            o.next(v);
        }
        o.complete();
        Subscription::empty()
    })
}

/// Emits `value` once, then completes.
pub fn just<T>(value: T) -> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    Observable::new(move |mut o| {
        o.next(value.clone());
        o.complete();
        Subscription::empty()
    })
}

/// Completes immediately without emitting.
pub fn empty<T: 'static>() -> Observable<T> {
    Observable::new(|mut o| {
        o.complete();
        Subscription::empty()
    })
}

/// Errors immediately with `error`.
pub fn throw<T: 'static>(error: SharedError) -> Observable<T> {
    Observable::new(move |mut o| {
        o.error(error.clone());
        Subscription::empty()
    })
}
