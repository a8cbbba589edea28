mod common;

use std::time::Duration;

use proptest::prelude::*;
use reloadwatch::engine::Debouncer;
use reloadwatch::watch::patterns::{LiteralMatch, PatternSet};
use reloadwatch::watch::throttle::EventLogThrottle;
use reloadwatch::watch::{FsOp, RawEvent, Verdict};
use reloadwatch_test_utils::WatchSettingsBuilder;
use tokio::time::Instant;

use crate::common::{classifier_for, p, root, sample_project};

proptest! {
    /// A write is a change exactly when the content differs from what the
    /// cache last saw; emptying a file is deferred instead.
    #[test]
    fn hashed_writes_signal_only_on_content_change(
        contents in proptest::collection::vec(
            prop_oneof![Just(String::new()), "[a-c]{1,3}"],
            1..30,
        )
    ) {
        let fs = sample_project();
        let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
        let now = Instant::now();
        let mut previous = "package main\n".to_string();

        for content in contents {
            fs.add_file(p("main.go"), content.clone());
            let verdict = classifier.classify(&RawEvent::new(FsOp::Write, p("main.go")), now);

            let expected = if content == previous {
                Verdict::NoOp
            } else if content.is_empty() {
                Verdict::Deferred
            } else {
                Verdict::Changed
            };
            prop_assert_eq!(verdict, expected);
            previous = content;
        }
    }

    /// Ignored files never produce anything but `Ignored`.
    #[test]
    fn temp_files_are_always_ignored(
        stem in "[a-z][a-z0-9_]{0,8}",
        dirs in proptest::collection::vec("[a-z]{1,5}", 0..3),
        op in prop_oneof![
            Just(FsOp::Create),
            Just(FsOp::Write),
            Just(FsOp::Remove),
            Just(FsOp::Rename),
        ],
    ) {
        let fs = sample_project();
        let settings = WatchSettingsBuilder::new(root()).ignore("*.tmp").build();
        let mut classifier = classifier_for(&fs, &settings);

        let mut rel = dirs.join("/");
        if !rel.is_empty() {
            rel.push('/');
        }
        rel.push_str(&stem);
        rel.push_str(".tmp");

        fs.add_file(p(&rel), "scratch");
        let verdict = classifier.classify(&RawEvent::new(op, p(&rel)), Instant::now());
        prop_assert_eq!(verdict, Verdict::Ignored);
    }

    /// Only the most recently armed generation may fire, and only once.
    #[test]
    fn debouncer_fires_only_latest_generation(changes in 1u64..20, probe in 0u64..25) {
        let mut d = Debouncer::new(Duration::from_millis(50));
        let mut last = 0;
        for _ in 0..changes {
            last = d.note_change();
        }
        prop_assert_eq!(last, changes);
        prop_assert_eq!(d.should_fire(probe), probe == last);

        d.finish();
        prop_assert!(!d.should_fire(last));
        prop_assert!(!d.is_pending());
    }

    /// Component-aligned literals never match inside a longer component;
    /// substring literals always do.
    #[test]
    fn literal_match_modes_differ_only_inside_components(
        lit in "[a-z]{2,6}",
        prefix in "[a-z]{1,3}",
        suffix in "[a-z]{1,3}",
    ) {
        let components = PatternSet::new([lit.as_str()]).unwrap();
        let substring =
            PatternSet::with_literal_match([lit.as_str()], LiteralMatch::Substring).unwrap();

        let glued = format!("{prefix}{lit}{suffix}");
        let rel = format!("x1/{glued}/main.go");
        prop_assert!(!components.is_match("main.go", &rel));
        prop_assert!(substring.is_match("main.go", &rel));

        let exact = format!("x1/{lit}/main.go");
        prop_assert!(components.is_match("main.go", &exact));
        prop_assert!(substring.is_match("main.go", &exact));
    }

    /// The log throttle lets the first few occurrences through, then samples.
    #[test]
    fn throttle_counts_every_occurrence(n in 1u32..200) {
        let mut throttle = EventLogThrottle::new();
        let mut logged = 0;
        for i in 1..=n {
            let (log, count) = throttle.observe(FsOp::Write, &p("main.go"));
            prop_assert_eq!(count, i);
            if log {
                logged += 1;
            }
        }
        prop_assert_eq!(logged, n.min(3) + n / 50);

        throttle.reset();
        prop_assert_eq!(throttle.observe(FsOp::Write, &p("main.go")), (true, 1));
    }
}
