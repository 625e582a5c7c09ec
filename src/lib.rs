//! `rxcore` is a minimal reactive stream core: lazy push-based observables,
//! subjects, disposable subscriptions and the schedulers needed to defer work.
//!
//! # Example
//!
//! ```no_run
//! use rxcore::{observable, subscribe::Subscriber, DisposeBag, ObservableExt, Subscribeable};
//!
//! let bag = DisposeBag::new();
//!
//! observable::from_iter(vec![0, 0, 1, 1, 2, 1])
//!     .distinct_until_changed()
//!     .subscribe(Subscriber::on_next(|v| println!("{v}")))
//!     .disposed_by(&bag);
//! ```
//!
//! Subjects are both observers and sources:
//!
//! ```no_run
//! use rxcore::{subjects::PublishSubject, subscribe::Subscriber, Observer, Subscribeable};
//!
//! let mut subject = PublishSubject::new();
//! let subscription = subject.subscribe(Subscriber::on_next(|v: i32| println!("{v}")));
//!
//! subject.next(1);
//! subject.next(2);
//! subscription.dispose();
//! subject.next(3); // not delivered
//! ```

mod errors;
pub mod observable;
pub mod observer;
pub mod scheduler;
pub mod subjects;
pub mod subscription;

pub use errors::*;
pub use observable::{Observable, ObservableExt};
pub use observer::Observer;
pub use subjects::{BehaviorSubject, PublishSubject};
pub use subscription::completion::Completion;
pub use subscription::dispose_bag::DisposeBag;
pub use subscription::subscribe;
pub use subscription::subscribe::{Subscribeable, Unsubscribeable};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<MutexGuard<'_, T>>| {
        tracing::warn!("mutex poisoned: recovering data");
        poisoned.into_inner()
    })
}
