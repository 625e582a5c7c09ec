use crate::{
    observer::Observer,
    subscription::subscribe::{Subscribeable, Subscriber, Subscription},
    Observable, SharedError,
};

use super::subject_core::{SubjectCore, Terminal};

/// A `PublishSubject` represents a unique variant of an `Observable` that enables
/// multicasting values to multiple `Observers`.
///
/// Unlike regular `Observables`, which are unicast (each subscribed `Observer` has
/// its independent execution of the `Observable`), subjects are multicast.
/// Observers only receive values emitted after they subscribed.
///
/// If the subject completes or errors, later subscribers do not receive any
/// items; they are handed the stored terminal event instead.
///
/// Handles are cheap to clone and all clones drive the same subject.
///
/// # Examples
///
///```no_run
/// use rxcore::{subjects::PublishSubject, subscribe::Subscriber};
/// use rxcore::{Observer, Subscribeable};
///
/// let mut subject = PublishSubject::new();
///
/// subject.subscribe(Subscriber::new(
///     |v: i32| println!("next {v}"),
///     |e| eprintln!("error {e}"),
///     || println!("completed"),
/// ));
///
/// subject.next(1);
/// subject.next(2);
/// subject.complete();
///
/// // Only receives the completion.
/// subject.subscribe(Subscriber::new(|v: i32| println!("late {v}"), |_| {}, || {}));
///```
pub struct PublishSubject<T> {
    core: SubjectCore<T>,
}

impl<T: Clone + Send + 'static> PublishSubject<T> {
    #[must_use]
    pub fn new() -> Self {
        PublishSubject {
            core: SubjectCore::new(None),
        }
    }

    /// Returns the number of registered observers.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns `true` if no observers are registered, `false` otherwise.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once the subject has completed or errored.
    pub fn is_terminated(&self) -> bool {
        self.core.terminal().is_some()
    }
}

impl<T: Clone + Send + 'static> Default for PublishSubject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PublishSubject<T> {
    fn clone(&self) -> Self {
        PublishSubject {
            core: self.core.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Subscribeable for PublishSubject<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<Self::ObsType>) -> Subscription {
        self.core.subscribe(v)
    }
}

impl<T: Clone + Send + 'static> Observer for PublishSubject<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        self.core.next(v);
    }

    fn error(&mut self, e: SharedError) {
        self.core.terminate(Terminal::Errored(e));
    }

    fn complete(&mut self) {
        self.core.terminate(Terminal::Completed);
    }
}

impl<T: Clone + Send + 'static> From<PublishSubject<T>> for Subscriber<T> {
    fn from(value: PublishSubject<T>) -> Self {
        let mut vn = value.clone();
        let mut ve = value.clone();
        let mut vc = value;
        Subscriber::new(
            move |v| vn.next(v),
            move |e| ve.error(e),
            move || vc.complete(),
        )
    }
}

impl<T: Clone + Send + 'static> From<PublishSubject<T>> for Observable<T> {
    fn from(mut value: PublishSubject<T>) -> Self {
        Observable::new(move |subscriber| value.subscribe(subscriber))
    }
}

#[cfg(test)]
mod test {
    use std::{
        error::Error,
        sync::{Arc, Mutex},
    };

    use crate::{observer::Observer, subscribe::Subscriber, PublishSubject, Subscribeable};

    fn subject_value_registers() -> (
        Vec<impl FnOnce() -> Subscriber<usize>>,
        Arc<Mutex<Vec<usize>>>,
        Arc<Mutex<Vec<usize>>>,
        Arc<Mutex<Vec<usize>>>,
    ) {
        let nexts: Vec<usize> = Vec::with_capacity(5);
        let nexts = Arc::new(Mutex::new(nexts));
        let nexts_c = Arc::clone(&nexts);

        let completes: Vec<usize> = Vec::with_capacity(5);
        let completes = Arc::new(Mutex::new(completes));
        let completes_c = Arc::clone(&completes);

        let errors: Vec<usize> = Vec::with_capacity(5);
        let errors = Arc::new(Mutex::new(errors));
        let errors_c = Arc::clone(&errors);

        let make_subscriber = vec![
            move || {
                Subscriber::new(
                    move |n| {
                        // Track next() calls.
                        nexts_c.lock().unwrap().push(n);
                    },
                    move |_| {
                        // Track error() calls.
                        errors_c.lock().unwrap().push(1);
                    },
                    move || {
                        // Track complete() calls.
                        completes_c.lock().unwrap().push(1);
                    },
                )
            };
            10
        ];
        (make_subscriber, nexts, completes, errors)
    }

    #[test]
    fn subject_emit_than_complete() {
        let (mut make_subscriber, nexts, completes, errors) = subject_value_registers();

        let x = make_subscriber.pop().unwrap()();
        let mut subject = PublishSubject::new();

        // Emit but no registered subscribers yet.
        subject.next(1);

        assert_eq!(subject.len(), 0);
        assert_eq!(nexts.lock().unwrap().len(), 0);

        // Register subscriber.
        subject.subscribe(x); // 1st

        // Registered but nothing is emitted after.
        assert_eq!(subject.len(), 1);
        assert_eq!(nexts.lock().unwrap().len(), 0);

        // Emit once to one registered subscriber.
        subject.next(2);

        assert_eq!(nexts.lock().unwrap().len(), 1);

        // Register more subscribers.
        let y = make_subscriber.pop().unwrap()();
        let z = make_subscriber.pop().unwrap()();
        subject.subscribe(y); // 2nd
        subject.subscribe(z); // 3rd

        // Emit two more times on 3 registered subscribers.
        subject.next(5);
        subject.next(6);

        assert_eq!(subject.len(), 3);
        assert_eq!(*nexts.lock().unwrap(), vec![2, 5, 5, 5, 6, 6, 6]);
        assert_eq!(completes.lock().unwrap().len(), 0);
        assert_eq!(errors.lock().unwrap().len(), 0);

        // Complete subject.
        subject.complete();

        assert!(subject.is_terminated());
        assert_eq!(subject.len(), 0);
        assert_eq!(completes.lock().unwrap().len(), 3);

        // Register another subscriber and emit some values after complete.
        let z = make_subscriber.pop().unwrap()();
        subject.subscribe(z); // 4th
        subject.next(7);
        subject.next(8);
        subject.complete();

        assert_eq!(subject.len(), 0);
        assert_eq!(nexts.lock().unwrap().len(), 7);
        assert_eq!(completes.lock().unwrap().len(), 4);
        assert_eq!(errors.lock().unwrap().len(), 0);
    }

    #[test]
    fn subject_emit_than_error() {
        let (mut make_subscriber, nexts, completes, errors) = subject_value_registers();

        let x = make_subscriber.pop().unwrap()();
        let y = make_subscriber.pop().unwrap()();

        let mut subject = PublishSubject::new();

        subject.subscribe(x);
        subject.subscribe(y);

        subject.next(1);
        subject.next(2);

        #[derive(Debug)]
        struct MyErr;

        impl std::fmt::Display for MyErr {
            fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                Ok(())
            }
        }

        impl Error for MyErr {}

        // Invoke error on a subject.
        subject.error(Arc::new(MyErr));
        subject.complete();

        assert_eq!(subject.len(), 0);
        assert_eq!(nexts.lock().unwrap().len(), 4);
        assert_eq!(completes.lock().unwrap().len(), 0);
        assert_eq!(errors.lock().unwrap().len(), 2);

        // Register another subscriber and emit some values after error.
        let z = make_subscriber.pop().unwrap()();
        subject.subscribe(z);
        subject.next(4);

        assert_eq!(nexts.lock().unwrap().len(), 4);
        assert_eq!(errors.lock().unwrap().len(), 3);
    }

    #[test]
    fn disposed_observer_stops_receiving() {
        let (mut make_subscriber, nexts, _, _) = subject_value_registers();
        let mut subject = PublishSubject::new();

        let s = subject.subscribe(make_subscriber.pop().unwrap()());
        subject.next(1);
        s.dispose();
        s.dispose();
        subject.next(2);

        assert_eq!(*nexts.lock().unwrap(), vec![1]);
        assert!(subject.is_empty());
    }

    #[test]
    fn observer_can_dispose_itself_during_fan_out() {
        let mut subject = PublishSubject::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let own: Arc<Mutex<Option<crate::subscribe::Subscription>>> = Arc::new(Mutex::new(None));
        let own_c = Arc::clone(&own);
        let seen_a = Arc::clone(&seen);
        let a = subject.subscribe(Subscriber::on_next(move |v: usize| {
            seen_a.lock().unwrap().push(("a", v));
            if let Some(s) = own_c.lock().unwrap().as_ref() {
                s.dispose();
            }
        }));
        *own.lock().unwrap() = Some(a);

        let seen_b = Arc::clone(&seen);
        subject.subscribe(Subscriber::on_next(move |v: usize| {
            seen_b.lock().unwrap().push(("b", v));
        }));

        subject.next(1);
        subject.next(2);

        assert_eq!(*seen.lock().unwrap(), vec![("a", 1), ("b", 1), ("b", 2)]);
        assert_eq!(subject.len(), 1);
    }

    /// Runs `f` on a worker thread, failing instead of hanging if it never returns.
    fn within_deadline(f: impl FnOnce() + Send + 'static) {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            f();
            let _ = tx.send(());
        });
        rx.recv_timeout(std::time::Duration::from_secs(2))
            .expect("subject call did not return");
    }

    #[test]
    fn observer_can_complete_its_subject_from_a_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let completes = Arc::new(Mutex::new(0));
        let seen_c = Arc::clone(&seen);
        let completes_c = Arc::clone(&completes);

        within_deadline(move || {
            let mut subject = PublishSubject::new();
            let mut inner = subject.clone();

            let mut s = Subscriber::on_next(move |v: i32| {
                seen_c.lock().unwrap().push(v);
                if v == 2 {
                    inner.complete();
                }
            });
            s.on_complete(move || *completes_c.lock().unwrap() += 1);
            subject.subscribe(s);

            subject.next(1);
            subject.next(2);
            subject.next(3);

            assert!(subject.is_terminated());
            assert!(subject.is_empty());
        });

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(*completes.lock().unwrap(), 1);
    }

    #[test]
    fn observer_can_emit_into_its_subject_from_a_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_a = Arc::clone(&seen);
        let seen_b = Arc::clone(&seen);

        within_deadline(move || {
            let mut subject = PublishSubject::new();
            let mut inner = subject.clone();

            subject.subscribe(Subscriber::on_next(move |v: usize| {
                seen_a.lock().unwrap().push(("a", v));
                if v == 1 {
                    inner.next(10);
                }
            }));
            subject.subscribe(Subscriber::on_next(move |v: usize| {
                seen_b.lock().unwrap().push(("b", v));
            }));

            subject.next(1);
        });

        let seen = seen.lock().unwrap();
        let a: Vec<_> = seen.iter().filter(|(k, _)| *k == "a").map(|(_, v)| *v).collect();
        let mut b: Vec<_> = seen.iter().filter(|(k, _)| *k == "b").map(|(_, v)| *v).collect();
        b.sort_unstable();

        // The nested value reaches the emitting observer after its current callback.
        assert_eq!(a, vec![1, 10]);
        assert_eq!(b, vec![1, 10]);
    }
}
