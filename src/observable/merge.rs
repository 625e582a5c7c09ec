use std::sync::{Arc, Mutex};

use crate::{
    observer::Observer,
    subscription::subscribe::{Subscribeable, Subscriber, Subscription, UnsubscribeLogic},
};

use super::Observable;

struct MergeState {
    subscriptions: Vec<Subscription>,
    active: usize,
    stopped: bool,
}

impl MergeState {
    /// Marks the merge as finished and hands back the source subscriptions.
    fn stop(&mut self) -> Vec<Subscription> {
        self.stopped = true;
        std::mem::take(&mut self.subscriptions)
    }
}

/// Combines `sources` into one observable.
///
/// Subscribing subscribes to every source immediately, in order. Items are
/// forwarded as they arrive, so the output interleaves sources in real emission
/// order. The result completes after all sources completed and errors on the
/// first source error, disposing the remaining sources at that point. Merging
/// no sources completes immediately.
pub fn merge<T: 'static>(mut sources: Vec<Observable<T>>) -> Observable<T> {
    Observable::new(move |o| {
        let o = Arc::new(Mutex::new(o));

        if sources.is_empty() {
            crate::lock(&o).complete();
            return Subscription::empty();
        }

        let state = Arc::new(Mutex::new(MergeState {
            subscriptions: Vec::with_capacity(sources.len()),
            active: sources.len(),
            stopped: false,
        }));

        for source in &mut sources {
            if crate::lock(&state).stopped {
                break;
            }

            let o_next = Arc::clone(&o);
            let o_error = Arc::clone(&o);
            let o_complete = Arc::clone(&o);
            let state_error = Arc::clone(&state);
            let state_complete = Arc::clone(&state);

            let subscription = source.subscribe(Subscriber::new(
                move |v| crate::lock(&o_next).next(v),
                move |e| {
                    let siblings = {
                        let mut state = crate::lock(&state_error);
                        if state.stopped {
                            return;
                        }
                        state.stop()
                    };
                    tracing::debug!(siblings = siblings.len(), "merge source errored");
                    for s in siblings {
                        s.dispose();
                    }
                    crate::lock(&o_error).error(e);
                },
                move || {
                    let done = {
                        let mut state = crate::lock(&state_complete);
                        state.active -= 1;
                        state.active == 0 && !state.stopped
                    };
                    if done {
                        crate::lock(&o_complete).complete();
                    }
                },
            ));

            let mut st = crate::lock(&state);
            if st.stopped {
                drop(st);
                subscription.dispose();
            } else {
                st.subscriptions.push(subscription);
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
