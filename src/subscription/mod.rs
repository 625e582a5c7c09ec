//! Provides structures and traits related to subscription management.
//!
//! This module includes types such as `Subscriber` for handling observed values,
//! errors, and completions, as well as `Subscription` for disposing subscriptions
//! to observables and subjects.
//!
//! Subscriptions can be collected in a `DisposeBag` for bulk teardown, and a
//! `Completion` signal lets callers wait, with a bound, for an observable to
//! complete.
pub mod completion;
pub mod dispose_bag;
pub mod subscribe;
