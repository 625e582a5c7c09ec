use crate::SharedError;

/// A sink for the events pushed by an observable.
///
/// `next` may be called any number of times; `complete` and `error` are
/// terminal and mutually exclusive.
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: SharedError);
}
