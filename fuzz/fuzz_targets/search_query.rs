#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use tasker_core::Tracker;
use tasker_core::model::NewTask;

fn tracker() -> Option<&'static Tracker> {
    static TRACKER: OnceLock<Option<Tracker>> = OnceLock::new();
    TRACKER
        .get_or_init(|| {
            let tracker = Tracker::open_in_memory().ok()?;
            tracker
                .tasks()
                .create(&NewTask::new("Deploy service").description("release notes"))?;
            tracker.tasks().create(&NewTask::new("Quarterly report"))?;
            Some(tracker)
        })
        .as_ref()
}

// Arbitrary FTS5 query text must yield a (possibly empty) result, never a
// panic or a poisoned handle.
fuzz_target!(|data: &[u8]| {
    let Ok(query) = std::str::from_utf8(data) else {
        return;
    };
    let Some(tracker) = tracker() else {
        return;
    };
    let hits = tracker.query().search(query);
    assert!(hits.len() <= 2);
});
