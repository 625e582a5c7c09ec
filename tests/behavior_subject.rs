mod custom_error;
mod register_emissions;

use custom_error::CustomError;
use register_emissions::register_emissions_subscriber;
use rxcore::{BehaviorSubject, ObservableExt, Observer, Subscribeable};
use std::sync::Arc;

#[test]
fn behavior_subject_emit_than_complete() {
    let (mut make_subscriber, nexts, completes, errors) = register_emissions_subscriber();

    let x = make_subscriber.pop().unwrap()();
    let mut subject = BehaviorSubject::new(9);

    // The seed value is replayed on subscribe.
    subject.subscribe(x); // 1st

    assert_eq!(subject.len(), 1);
    assert_eq!(*nexts.lock().unwrap(), vec![9]);

    subject.next(1);
    subject.next(2);
    assert_eq!(subject.value().unwrap(), 2);

    // A late subscriber only gets the latest value.
    let y = make_subscriber.pop().unwrap()();
    subject.subscribe(y); // 2nd

    assert_eq!(subject.len(), 2);
    assert_eq!(*nexts.lock().unwrap(), vec![9, 1, 2, 2]);

    subject.complete();

    assert_eq!(subject.len(), 0);
    assert_eq!(completes.lock().unwrap().len(), 2);

    // After completion the stored value is not replayed anymore.
    let z = make_subscriber.pop().unwrap()();
    subject.subscribe(z); // 3rd
    subject.next(3);

    assert_eq!(nexts.lock().unwrap().len(), 4);
    assert_eq!(completes.lock().unwrap().len(), 3);
    assert_eq!(errors.lock().unwrap().len(), 0);
}

#[test]
fn behavior_subject_emit_than_error() {
    let (mut make_subscriber, nexts, completes, errors) = register_emissions_subscriber();

    let mut subject = BehaviorSubject::new(0);
    subject.subscribe(make_subscriber.pop().unwrap()());
    subject.next(1);

    subject.error(Arc::new(CustomError));

    assert!(subject.value().is_err());
    assert_eq!(
        subject.value().unwrap_err().to_string(),
        "sensor disconnected"
    );

    subject.subscribe(make_subscriber.pop().unwrap()());

    assert_eq!(*nexts.lock().unwrap(), vec![0, 1]);
    assert_eq!(completes.lock().unwrap().len(), 0);
    assert_eq!(errors.lock().unwrap().len(), 2);
}

#[test]
fn behavior_subject_feeds_distinct_until_changed() {
    let (mut make_subscriber, nexts, _, _) = register_emissions_subscriber();

    let mut subject = BehaviorSubject::new(1);
    subject
        .clone()
        .distinct_until_changed()
        .subscribe(make_subscriber.pop().unwrap()());

    subject.next(1);
    subject.next(2);
    subject.next(2);
    subject.next(1);

    assert_eq!(*nexts.lock().unwrap(), vec![1, 2, 1]);
}
