use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use rxcore::{
    subscribe::{Subscriber, Subscription},
    Observable, Observer,
};

/// Emits `0..=end` from a background thread, one value per millisecond.
///
/// `last_emit` records the last value handed to the subscriber, so tests can
/// check that emission stopped after disposal.
pub fn generate_u32_observable(end: u32, last_emit: Arc<AtomicU32>) -> Observable<u32> {
    Observable::new(move |mut o: Subscriber<_>| {
        let last_emit = Arc::clone(&last_emit);
        std::thread::spawn(move || {
            for i in 0..=end {
                if o.is_closed() {
                    return;
                }
                last_emit.store(i, Ordering::SeqCst);
                o.next(i);
                std::thread::sleep(Duration::from_millis(1));
            }
            o.complete();
        });

        Subscription::empty()
    })
}
