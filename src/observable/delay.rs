use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{
    observer::Observer,
    scheduler::Scheduler,
    subscription::subscribe::{Subscribeable, Subscriber, Subscription, UnsubscribeLogic},
};

use super::{Observable, SharedSubscriber};

enum Notification<T> {
    Next(T),
    Complete,
}

struct DelayState<T> {
    source: Option<Subscription>,
    // Every scheduled task pops the front, so delivery keeps source order even
    // when the scheduler runs equally-due tasks out of order.
    queue: VecDeque<Notification<T>>,
    pending: HashMap<u64, Option<Subscription>>,
    next_id: u64,
    stopped: bool,
}

impl<T> DelayState<T> {
    fn stop(&mut self) -> Vec<Subscription> {
        self.stopped = true;
        self.queue.clear();
        self.source
            .take()
            .into_iter()
            .chain(self.pending.drain().filter_map(|(_, s)| s))
            .collect()
    }
}

fn enqueue<T, S>(
    state: &Arc<Mutex<DelayState<T>>>,
    o: &SharedSubscriber<T>,
    scheduler: &S,
    duration: Duration,
    notification: Notification<T>,
) where
    T: Send + 'static,
    S: Scheduler,
{
    let id = {
        let mut st = crate::lock(state);
        if st.stopped {
            return;
        }
        st.queue.push_back(notification);
        let id = st.next_id;
        st.next_id += 1;
        st.pending.insert(id, None);
        id
    };

    let state_task = Arc::clone(state);
    let o_task = Arc::clone(o);
    let subscription = scheduler.schedule(
        Some(duration),
        Box::new(move || {
            let mut o = crate::lock(&o_task);
            let notification = {
                let mut st = crate::lock(&state_task);
                if st.stopped {
                    return;
                }
                st.pending.remove(&id);
                st.queue.pop_front()
            };
            match notification {
                Some(Notification::Next(v)) => o.next(v),
                Some(Notification::Complete) => o.complete(),
                None => {}
            }
        }),
    );

    let mut st = crate::lock(state);
    if let Some(slot) = st.pending.get_mut(&id) {
        *slot = Some(subscription);
    }
}

pub(super) fn delay<S, T, SD>(mut source: S, duration: Duration, scheduler: SD) -> Observable<T>
where
    S: Subscribeable<ObsType = T> + Send + Sync + 'static,
    T: Send + 'static,
    SD: Scheduler + Clone + 'static,
{
    Observable::new(move |o| {
        let o_shared: SharedSubscriber<T> = Arc::new(Mutex::new(o));
        let o_cloned_e = Arc::clone(&o_shared);
        let o_cloned_c = Arc::clone(&o_shared);

        let state = Arc::new(Mutex::new(DelayState {
            source: None,
            queue: VecDeque::new(),
            pending: HashMap::new(),
            next_id: 0,
            stopped: false,
        }));
        let state_n = Arc::clone(&state);
        let state_e = Arc::clone(&state);
        let state_c = Arc::clone(&state);
        let scheduler_n = scheduler.clone();
        let scheduler_c = scheduler.clone();

        let u = Subscriber::new(
            move |v| {
                enqueue(
                    &state_n,
                    &o_shared,
                    &scheduler_n,
                    duration,
                    Notification::Next(v),
                );
            },
            move |observable_error| {
                let pending = {
                    let mut st = crate::lock(&state_e);
                    if st.stopped {
                        return;
                    }
                    st.stop()
                };
                tracing::debug!(dropped = pending.len(), "delay source errored");
                for s in pending {
                    s.dispose();
                }
                crate::lock(&o_cloned_e).error(observable_error);
            },
            move || {
                enqueue(
                    &state_c,
                    &o_cloned_c,
                    &scheduler_c,
                    duration,
                    Notification::Complete,
                );
            },
        );

        let source_subscription = source.subscribe(u);
        {
            let mut st = crate::lock(&state);
            if !st.stopped {
                st.source = Some(source_subscription);
            } else {
                drop(st);
                source_subscription.dispose();
            }
        }

        Subscription::new(UnsubscribeLogic::Logic(Box::new(move || {
            let subscriptions = crate::lock(&state).stop();
            for s in subscriptions {
                s.dispose();
            }
        })))
    })
}
