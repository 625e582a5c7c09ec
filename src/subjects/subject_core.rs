use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, TryLockError,
    },
};

use crate::{
    observer::Observer,
    subscription::subscribe::{Subscriber, Subscription, UnsubscribeLogic},
    SharedError,
};

/// How a subject terminated. Replayed to every later subscriber.
#[derive(Clone)]
pub(crate) enum Terminal {
    Completed,
    Errored(SharedError),
}

/// An event waiting to be handed to a registered observer.
enum Delivery<T> {
    Next(T),
    Terminal(Terminal),
}

/// A registered observer plus the flag its subscription clears on disposal.
///
/// Events are queued and drained by whichever caller holds the subscriber
/// lock. A caller that finds the lock taken leaves its event in the queue, so
/// an observer that calls back into its own subject from a callback has the
/// nested event delivered after the current callback returns instead of
/// blocking on itself.
struct Registration<T> {
    active: AtomicBool,
    pending: Mutex<VecDeque<Delivery<T>>>,
    subscriber: Mutex<Subscriber<T>>,
}

impl<T> Registration<T> {
    fn new(subscriber: Subscriber<T>, replay: Option<T>) -> Self {
        Registration {
            active: AtomicBool::new(true),
            pending: Mutex::new(replay.map(Delivery::Next).into_iter().collect()),
            subscriber: Mutex::new(subscriber),
        }
    }

    fn deliver(&self, delivery: Delivery<T>) {
        crate::lock(&self.pending).push_back(delivery);
        self.drain();
    }

    fn drain(&self) {
        loop {
            let subscriber = match self.subscriber.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => {
                    tracing::warn!("mutex poisoned: recovering data");
                    poisoned.into_inner()
                }
                // The holder drains what we queued.
                Err(TryLockError::WouldBlock) => return,
            };
            if !self.flush(subscriber) {
                return;
            }
        }
    }

    /// Delivers queued events through the held subscriber lock, then releases
    /// it. Returns `true` when events were queued after the last pop, which the
    /// caller must pick up since their producers found the lock taken.
    fn flush(&self, mut subscriber: MutexGuard<'_, Subscriber<T>>) -> bool {
        loop {
            // Popped in its own statement so the queue is unlocked while the
            // callback runs.
            let delivery = crate::lock(&self.pending).pop_front();
            let Some(delivery) = delivery else {
                break;
            };
            // Re-checked per event; an earlier observer in the same fan-out, or
            // this observer's own callback, may have disposed it.
            if !self.active.load(Ordering::Acquire) {
                continue;
            }
            match delivery {
                Delivery::Next(v) => subscriber.next(v),
                Delivery::Terminal(Terminal::Completed) => subscriber.complete(),
                Delivery::Terminal(Terminal::Errored(e)) => subscriber.error(e),
            }
        }
        drop(subscriber);
        !crate::lock(&self.pending).is_empty()
    }
}

struct SubjectState<T> {
    observers: Vec<(u64, Arc<Registration<T>>)>,
    next_id: u64,
    value: Option<T>,
    terminal: Option<Terminal>,
}

impl<T> SubjectState<T> {
    fn remove(&mut self, id: u64) {
        if let Some(pos) = self.observers.iter().position(|(k, _)| *k == id) {
            let (_, registration) = self.observers.remove(pos);
            registration.active.store(false, Ordering::Release);
        }
    }

    fn snapshot(&self) -> Vec<Arc<Registration<T>>> {
        self.observers.iter().map(|(_, r)| Arc::clone(r)).collect()
    }
}

/// State shared by every handle of a subject.
///
/// Observers are kept in subscription order. Events are fanned out over a
/// snapshot taken under the lock and delivered after releasing it, so an
/// observer may dispose itself or others from inside its own callback.
pub(crate) struct SubjectCore<T>(Arc<Mutex<SubjectState<T>>>);

impl<T> Clone for SubjectCore<T> {
    fn clone(&self) -> Self {
        SubjectCore(Arc::clone(&self.0))
    }
}

impl<T: Clone + Send + 'static> SubjectCore<T> {
    /// `value` is replayed to every new subscriber when present.
    pub(crate) fn new(value: Option<T>) -> Self {
        SubjectCore(Arc::new(Mutex::new(SubjectState {
            observers: Vec::with_capacity(8),
            next_id: 0,
            value,
            terminal: None,
        })))
    }

    pub(crate) fn len(&self) -> usize {
        crate::lock(&self.0).observers.len()
    }

    pub(crate) fn value(&self) -> Option<T> {
        crate::lock(&self.0).value.clone()
    }

    pub(crate) fn terminal(&self) -> Option<Terminal> {
        crate::lock(&self.0).terminal.clone()
    }

    pub(crate) fn subscribe(&self, mut v: Subscriber<T>) -> Subscription {
        let mut state = crate::lock(&self.0);

        // A terminated subject replays its terminal event and registers nothing.
        if let Some(terminal) = state.terminal.clone() {
            drop(state);
            match terminal {
                Terminal::Completed => v.complete(),
                Terminal::Errored(e) => v.error(e),
            }
            return Subscription::empty();
        }

        let id = state.next_id;
        state.next_id += 1;
        // The replayed value is queued ahead of anything a concurrent `next`
        // adds, and the subscriber lock is taken before the registration is
        // visible, so the replay is delivered here before `subscribe` returns.
        let registration = Arc::new(Registration::new(v, state.value.clone()));
        let subscriber = crate::lock(&registration.subscriber);
        state.observers.push((id, Arc::clone(&registration)));
        drop(state);
        if registration.flush(subscriber) {
            registration.drain();
        }

        tracing::trace!(id, "subject observer registered");

        let source_cloned = Arc::clone(&self.0);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            crate::lock(&source_cloned).remove(id);
            tracing::trace!(id, "subject observer removed");
        })))
    }

    pub(crate) fn next(&self, v: T) {
        let targets = {
            let mut state = crate::lock(&self.0);
            if state.terminal.is_some() {
                return;
            }
            if let Some(current) = state.value.as_mut() {
                *current = v.clone();
            }
            state.snapshot()
        };

        let mut iter = targets.iter().peekable();
        while let Some(registration) = iter.next() {
            if iter.peek().is_some() {
                registration.deliver(Delivery::Next(v.clone()));
            } else {
                registration.deliver(Delivery::Next(v));
                break;
            }
        }
    }

    pub(crate) fn terminate(&self, terminal: Terminal) {
        let targets = {
            let mut state = crate::lock(&self.0);
            if state.terminal.is_some() {
                return;
            }
            state.terminal = Some(terminal.clone());
            state
                .observers
                .drain(..)
                .map(|(_, r)| r)
                .collect::<Vec<_>>()
        };

        tracing::debug!(observers = targets.len(), "subject terminated");

        for registration in targets {
            registration.deliver(Delivery::Terminal(terminal.clone()));
        }
    }
}
