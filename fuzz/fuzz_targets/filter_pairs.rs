#![no_main]

use libfuzzer_sys::fuzz_target;
use tasker_core::query::TaskFilter;

// Lines of `key=value`; parsing must never panic and the compiled SQL must
// bind exactly one parameter per predicate.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let pairs: Vec<(&str, &str)> = text
        .lines()
        .filter_map(|line| line.split_once('='))
        .collect();
    if let Ok(filter) = TaskFilter::from_pairs(pairs) {
        let sql = filter.to_sql();
        assert_eq!(sql.params.len(), filter.predicates().len());
    }
});
