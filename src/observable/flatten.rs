use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    observer::Observer,
    subscription::subscribe::{Subscribeable, Subscriber, Subscription, UnsubscribeLogic},
};

use super::{Observable, SharedSubscriber};

/// Per-subscription bookkeeping for `flat_map`.
struct FlatMapState {
    source: Option<Subscription>,
    // Reserved with `None` before the inner subscribe call returns.
    inner: HashMap<u64, Option<Subscription>>,
    next_id: u64,
    // The source counts as one active member until it completes.
    active: usize,
    stopped: bool,
}

impl FlatMapState {
    fn stop(&mut self) -> Vec<Subscription> {
        self.stopped = true;
        self.source
            .take()
            .into_iter()
            .chain(self.inner.drain().filter_map(|(_, s)| s))
            .collect()
    }
}

fn dispose_all(subscriptions: Vec<Subscription>) {
    for s in subscriptions {
        s.dispose();
    }
}

pub(super) fn flat_map<S, T, R, F>(mut source: S, project: F) -> Observable<R>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
    R: 'static,
    F: FnMut(T) -> Observable<R> + Send + Sync + 'static,
{
    let project = Arc::new(Mutex::new(project));
    Observable::new(move |o| {
        let o_shared: SharedSubscriber<R> = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);

        let state = Arc::new(Mutex::new(FlatMapState {
            source: None,
            inner: HashMap::new(),
            next_id: 0,
            active: 1,
            stopped: false,
        }));
        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let state_c = Arc::clone(&state);
        let project = Arc::clone(&project);

        let u = Subscriber::new(
            move |v| {
                let id = {
                    let mut st = crate::lock(&state_n);
                    if st.stopped {
                        return;
                    }
                    let id = st.next_id;
                    st.next_id += 1;
                    st.active += 1;
                    st.inner.insert(id, None);
                    id
                };

                let mut inner_observable = (*crate::lock(&project))(v);

                let o_next = Arc::clone(&o_shared);
                let o_error = Arc::clone(&o_shared);
                let o_complete = Arc::clone(&o_shared);
                let state_error = Arc::clone(&state_n);
                let state_complete = Arc::clone(&state_n);

                let inner_subscriber = Subscriber::new(
                    move |k| crate::lock(&o_next).next(k),
                    move |observable_error| {
                        let subscriptions = {
                            let mut st = crate::lock(&state_error);
                            if st.stopped {
                                return;
                            }
                            st.stop()
                        };
                        dispose_all(subscriptions);
                        crate::lock(&o_error).error(observable_error);
                    },
                    move || {
                        let done = {
                            let mut st = crate::lock(&state_complete);
                            st.inner.remove(&id);
                            st.active -= 1;
                            st.active == 0 && !st.stopped
                        };
                        if done {
                            crate::lock(&o_complete).complete();
                        }
                    },
                );

                let subscription = inner_observable.subscribe(inner_subscriber);

                let mut st = crate::lock(&state_n);
                if let Some(slot) = st.inner.get_mut(&id) {
                    *slot = Some(subscription);
                    return;
                }
                // Already completed or stopped while subscribing.
                drop(st);
                subscription.dispose();
            },
            move |observable_error| {
                let subscriptions = {
                    let mut st = crate::lock(&state_e);
                    if st.stopped {
                        return;
                    }
                    st.stop()
                };
                dispose_all(subscriptions);
                crate::lock(&o_cloned_e).error(observable_error);
            },
            move || {
                let done = {
                    let mut st = crate::lock(&state_c);
                    st.active -= 1;
                    st.active == 0 && !st.stopped
                };
                if done {
                    crate::lock(&o_cloned_c).complete();
                }
            },
        );

        let source_subscription = source.subscribe(u);
        store_source(&state, source_subscription, |st| st.stopped, |st, s| st.source = Some(s));

        let state = Arc::clone(&state);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            let subscriptions = crate::lock(&state).stop();
            dispose_all(subscriptions);
        })))
    })
}

/// Per-subscription bookkeeping for `flat_map_latest`.
struct FlatMapLatestState {
    source: Option<Subscription>,
    current: Option<Subscription>,
    // Bumped on every source item; inner events from older generations are dropped.
    generation: u64,
    inner_active: bool,
    source_done: bool,
    stopped: bool,
}

impl FlatMapLatestState {
    fn stop(&mut self) -> Vec<Subscription> {
        self.stopped = true;
        self.source
            .take()
            .into_iter()
            .chain(self.current.take())
            .collect()
    }
}

pub(super) fn flat_map_latest<S, T, R, F>(mut source: S, project: F) -> Observable<R>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: 'static,
    R: 'static,
    F: FnMut(T) -> Observable<R> + Send + Sync + 'static,
{
    let project = Arc::new(Mutex::new(project));
    Observable::new(move |o| {
        let o_shared: SharedSubscriber<R> = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);

        let state = Arc::new(Mutex::new(FlatMapLatestState {
            source: None,
            current: None,
            generation: 0,
            inner_active: false,
            source_done: false,
            stopped: false,
        }));
        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let state_c = Arc::clone(&state);
        let project = Arc::clone(&project);

        let u = Subscriber::new(
            move |v| {
                // The switch is recorded under the downstream lock, which inner
                // `next` holds across its generation check and delivery. Once the
                // generation is bumped no superseded inner observable can deliver.
                let (generation, previous) = {
                    let _o = crate::lock(&o_shared);
                    let mut st = crate::lock(&state_n);
                    if st.stopped {
                        return;
                    }
                    st.generation += 1;
                    st.inner_active = true;
                    (st.generation, st.current.take())
                };
                if let Some(previous) = previous {
                    tracing::debug!(generation, "flat_map_latest switching inner observable");
                    previous.dispose();
                }

                let mut inner_observable = (*crate::lock(&project))(v);

                let o_next = Arc::clone(&o_shared);
                let o_error = Arc::clone(&o_shared);
                let o_complete = Arc::clone(&o_shared);
                let state_next = Arc::clone(&state_n);
                let state_error = Arc::clone(&state_n);
                let state_complete = Arc::clone(&state_n);

                let inner_subscriber = Subscriber::new(
                    move |k| {
                        // Held through delivery; see the switch in the source `next`.
                        let mut o = crate::lock(&o_next);
                        {
                            let st = crate::lock(&state_next);
                            if st.stopped || st.generation != generation {
                                return;
                            }
                        }
                        o.next(k);
                    },
                    move |observable_error| {
                        let subscriptions = {
                            let mut st = crate::lock(&state_error);
                            if st.stopped || st.generation != generation {
                                return;
                            }
                            st.stop()
                        };
                        dispose_all(subscriptions);
                        crate::lock(&o_error).error(observable_error);
                    },
                    move || {
                        let done = {
                            let mut st = crate::lock(&state_complete);
                            if st.stopped || st.generation != generation {
                                return;
                            }
                            st.inner_active = false;
                            st.current = None;
                            st.source_done
                        };
                        if done {
                            crate::lock(&o_complete).complete();
                        }
                    },
                );

                let subscription = inner_observable.subscribe(inner_subscriber);

                let mut st = crate::lock(&state_n);
                if !st.stopped && st.generation == generation && st.inner_active {
                    st.current = Some(subscription);
                    return;
                }
                drop(st);
                subscription.dispose();
            },
            move |observable_error| {
                let subscriptions = {
                    let mut st = crate::lock(&state_e);
                    if st.stopped {
                        return;
                    }
                    st.stop()
                };
                dispose_all(subscriptions);
                crate::lock(&o_cloned_e).error(observable_error);
            },
            move || {
                let done = {
                    let mut st = crate::lock(&state_c);
                    if st.stopped {
                        return;
                    }
                    st.source_done = true;
                    !st.inner_active
                };
                if done {
                    crate::lock(&o_cloned_c).complete();
                }
            },
        );

        let source_subscription = source.subscribe(u);
        store_source(&state, source_subscription, |st| st.stopped, |st, s| st.source = Some(s));

        let state = Arc::clone(&state);
        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            let subscriptions = crate::lock(&state).stop();
            dispose_all(subscriptions);
        })))
    })
}

/// Keeps the source subscription unless the operator already stopped while the
/// source was still being subscribed, in which case it is disposed right away.
fn store_source<St>(
    state: &Mutex<St>,
    subscription: Subscription,
    stopped: impl Fn(&St) -> bool,
    store: impl FnOnce(&mut St, Subscription),
) {
    let mut st = crate::lock(state);
    if stopped(&st) {
        drop(st);
        subscription.dispose();
        return;
    }
    store(&mut st, subscription);
}
