use crate::{
    observer::Observer,
    subscription::subscribe::{Subscribeable, Subscriber, Subscription},
    Observable, SharedError,
};

use super::subject_core::{SubjectCore, Terminal};

/// A subject that stores its current value.
///
/// Every new subscriber receives the current value as its first `next`,
/// synchronously, before `subscribe` returns. Each `next` updates the stored
/// value before it is fanned out.
///
/// ```no_run
/// use rxcore::{subjects::BehaviorSubject, subscribe::Subscriber};
/// use rxcore::{Observer, Subscribeable};
///
/// let mut subject = BehaviorSubject::new(3);
/// subject.subscribe(Subscriber::on_next(|v: i32| println!("{v}"))); // prints 3
/// subject.next(1); // prints 1
/// ```
pub struct BehaviorSubject<T> {
    core: SubjectCore<T>,
}

impl<T: Clone + Send + 'static> BehaviorSubject<T> {
    pub fn new(value: T) -> Self {
        BehaviorSubject {
            core: SubjectCore::new(Some(value)),
        }
    }

    /// Returns the current value, or the error the subject terminated with.
    ///
    /// # Errors
    ///
    /// Returns the stored error once the subject has errored.
    pub fn value(&self) -> Result<T, SharedError> {
        if let Some(Terminal::Errored(e)) = self.core.terminal() {
            return Err(e);
        }
        // Always present for a behavior subject.
        self.core
            .value()
            .ok_or_else(|| crate::ObservableError::Info("BehaviorSubject".into()).into_shared())
    }

    /// Returns the number of registered observers.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns `true` if no observers are registered, `false` otherwise.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        BehaviorSubject {
            core: self.core.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Subscribeable for BehaviorSubject<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<Self::ObsType>) -> Subscription {
        self.core.subscribe(v)
    }
}

impl<T: Clone + Send + 'static> Observer for BehaviorSubject<T> {
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

impl<T: Clone + Send + 'static> From<BehaviorSubject<T>> for Subscriber<T> {
    fn from(value: BehaviorSubject<T>) -> Self {
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

impl<T: Clone + Send + 'static> From<BehaviorSubject<T>> for Observable<T> {
    fn from(mut value: BehaviorSubject<T>) -> Self {
        Observable::new(move |subscriber| value.subscribe(subscriber))
    }
}
