//! The `subjects` module provides subjects: types that are both observers and
//! observables. A subject lets external code push values with `next()`,
//! `error()` and `complete()`, and multicasts them to every observer currently
//! subscribed to it.
//!
//! - [`PublishSubject`] forwards only values emitted after an observer subscribed.
//! - [`BehaviorSubject`] additionally stores the most recent value and replays it
//!   to each new subscriber.
//!
//! Both replay their terminal event (completion or error) to observers that
//! subscribe after termination.

mod behavior_subject;
mod subject;
mod subject_core;

pub use behavior_subject::*;
pub use subject::*;
