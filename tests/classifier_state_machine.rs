mod common;

use std::error::Error;
use std::time::Duration;

use reloadwatch::watch::{FsOp, RawEvent, Verdict, SAVE_WINDOW};
use reloadwatch_test_utils::WatchSettingsBuilder;
use tokio::time::Instant;

use crate::common::{classifier_for, init_tracing, p, root, sample_project};

type TestResult = Result<(), Box<dyn Error>>;

fn write(rel: &str) -> RawEvent {
    RawEvent::new(FsOp::Write, p(rel))
}

#[test]
fn touching_a_hashed_file_without_changing_content_is_a_noop() -> TestResult {
    init_tracing();
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    let now = Instant::now();

    let before = classifier.cache().get(&p("main.go")).cloned().ok_or("tracked")?;
    assert!(before.content.is_digest());

    fs.touch(p("main.go"));
    assert_eq!(classifier.classify(&write("main.go"), now), Verdict::NoOp);

    // Cache refreshed with the new mtime, same digest.
    let after = classifier.cache().get(&p("main.go")).ok_or("still tracked")?;
    assert_ne!(before.mod_time, after.mod_time);
    assert_eq!(before.content, after.content);
    Ok(())
}

#[test]
fn unhashed_file_falls_back_to_mtime_and_size() -> TestResult {
    init_tracing();
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    let now = Instant::now();

    let state = classifier.cache().get(&p("README")).ok_or("tracked")?;
    assert!(!state.content.is_digest());

    // The mock clock moves one second per mutation, far beyond the tolerance.
    fs.touch(p("README"));
    assert_eq!(classifier.classify(&write("README"), now), Verdict::Changed);
    Ok(())
}

#[test]
fn unhashed_mtime_jitter_within_tolerance_is_a_noop() -> TestResult {
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    let now = Instant::now();
    let base = classifier.cache().get(&p("README")).ok_or("tracked")?.mod_time;

    fs.set_file(p("README"), "readme\n", base + Duration::from_millis(60));
    assert_eq!(classifier.classify(&write("README"), now), Verdict::NoOp);

    // Exactly on the boundary still counts as the same time.
    fs.set_file(p("README"), "readme\n", base + Duration::from_millis(160));
    assert_eq!(classifier.classify(&write("README"), now), Verdict::NoOp);

    fs.set_file(p("README"), "readme\n", base + Duration::from_millis(300));
    assert_eq!(classifier.classify(&write("README"), now), Verdict::Changed);
    Ok(())
}

#[test]
fn removing_a_directory_of_ignored_files_is_not_a_change() -> TestResult {
    init_tracing();
    let fs = sample_project();
    fs.add_file(p("logs/a.log"), "line\n");
    let settings = WatchSettingsBuilder::new(root()).ignore("*.log").build();
    let mut classifier = classifier_for(&fs, &settings);
    let now = Instant::now();

    fs.remove(p("logs"));
    let file = RawEvent::new(FsOp::Remove, p("logs/a.log"));
    let dir = RawEvent::new(FsOp::Remove, p("logs"));
    assert_eq!(classifier.classify(&file, now), Verdict::Ignored);
    assert_eq!(classifier.classify(&dir, now), Verdict::NoOp);
    assert!(!classifier.cache().contains(&p("logs/a.log")));
    Ok(())
}

#[test]
fn removing_a_directory_outside_the_allow_list_is_not_a_change() -> TestResult {
    let fs = sample_project();
    fs.add_file(p("docs/readme.txt"), "docs\n");
    let settings = WatchSettingsBuilder::new(root()).filter("*.go").build();
    let mut classifier = classifier_for(&fs, &settings);
    let now = Instant::now();

    fs.remove(p("docs"));
    let file = RawEvent::new(FsOp::Remove, p("docs/readme.txt"));
    let dir = RawEvent::new(FsOp::Remove, p("docs"));
    assert_eq!(classifier.classify(&file, now), Verdict::Ignored);
    assert_eq!(classifier.classify(&dir, now), Verdict::NoOp);
    Ok(())
}

#[test]
fn removing_a_directory_with_a_relevant_file_is_a_change() -> TestResult {
    let fs = sample_project();
    fs.add_file(p("pkg/debug.log"), "line\n");
    let settings = WatchSettingsBuilder::new(root()).ignore("*.log").build();
    let mut classifier = classifier_for(&fs, &settings);

    fs.remove(p("pkg"));
    let dir = RawEvent::new(FsOp::Remove, p("pkg"));
    assert_eq!(classifier.classify(&dir, Instant::now()), Verdict::Changed);
    assert!(!classifier.cache().contains(&p("pkg/util.go")));
    assert!(!classifier.cache().contains(&p("pkg/debug.log")));
    Ok(())
}

#[test]
fn content_change_on_hashed_file_is_a_change() -> TestResult {
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());

    fs.add_file(p("main.go"), "package main\n\nfunc main() {}\n");
    assert_eq!(
        classifier.classify(&write("main.go"), Instant::now()),
        Verdict::Changed
    );
    Ok(())
}

#[test]
fn truncate_then_write_signals_exactly_once() -> TestResult {
    init_tracing();
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    let t0 = Instant::now();

    fs.add_file(p("main.go"), "");
    assert_eq!(classifier.classify(&write("main.go"), t0), Verdict::Deferred);
    assert!(classifier.saves().is_pending(&p("main.go")));
    assert_eq!(classifier.cache().get(&p("main.go")).map(|s| s.size), Some(0));

    fs.add_file(p("main.go"), "package main // saved\n");
    let t1 = t0 + Duration::from_millis(40);
    assert_eq!(classifier.classify(&write("main.go"), t1), Verdict::Changed);
    assert!(classifier.saves().is_empty());

    // A duplicate notification for the same content adds nothing.
    assert_eq!(classifier.classify(&write("main.go"), t1), Verdict::NoOp);

    // The window check that was scheduled for the truncation finds nothing.
    assert_eq!(
        classifier.expire_save(&p("main.go"), t0 + SAVE_WINDOW),
        Verdict::NoOp
    );
    Ok(())
}

#[test]
fn truncation_never_followed_by_a_write_is_reported_after_the_window() -> TestResult {
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    let t0 = Instant::now();

    fs.add_file(p("go.mod"), "");
    assert_eq!(classifier.classify(&write("go.mod"), t0), Verdict::Deferred);

    // Too early: the entry stays.
    let early = t0 + Duration::from_millis(500);
    assert_eq!(classifier.expire_save(&p("go.mod"), early), Verdict::NoOp);
    assert!(classifier.saves().is_pending(&p("go.mod")));

    assert_eq!(
        classifier.expire_save(&p("go.mod"), t0 + SAVE_WINDOW),
        Verdict::Changed
    );
    assert!(classifier.saves().is_empty());
    Ok(())
}

#[test]
fn delete_then_recreate_is_classified_as_creation() -> TestResult {
    init_tracing();
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    let now = Instant::now();

    fs.remove(p("pkg/util.go"));
    let verdict = classifier.classify(&RawEvent::new(FsOp::Remove, p("pkg/util.go")), now);
    assert_eq!(verdict, Verdict::Changed);
    assert!(!classifier.cache().contains(&p("pkg/util.go")));

    // Deleting it again (duplicate event) is a no-op: it is not tracked.
    let again = classifier.classify(&RawEvent::new(FsOp::Remove, p("pkg/util.go")), now);
    assert_eq!(again, Verdict::NoOp);

    // A write notification for the recreated file is treated as a creation.
    fs.add_file(p("pkg/util.go"), "package pkg\n\nvar X = 1\n");
    assert_eq!(classifier.classify(&write("pkg/util.go"), now), Verdict::Changed);
    assert!(classifier.cache().contains(&p("pkg/util.go")));
    Ok(())
}

#[test]
fn deleting_an_untracked_path_is_a_noop() -> TestResult {
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());

    let verdict = classifier.classify(
        &RawEvent::new(FsOp::Remove, p("never-existed.go")),
        Instant::now(),
    );
    assert_eq!(verdict, Verdict::NoOp);
    Ok(())
}

#[test]
fn rename_of_a_path_that_still_exists_is_rederived_as_a_write() -> TestResult {
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    let now = Instant::now();

    // Atomic save: old name renamed away and immediately replaced with the
    // same content.
    let verdict = classifier.classify(&RawEvent::new(FsOp::Rename, p("main.go")), now);
    assert_eq!(verdict, Verdict::NoOp);
    assert!(classifier.cache().contains(&p("main.go")));

    fs.add_file(p("main.go"), "package main // replaced\n");
    let verdict = classifier.classify(&RawEvent::new(FsOp::Rename, p("main.go")), now);
    assert_eq!(verdict, Verdict::Changed);
    Ok(())
}

#[test]
fn write_to_a_vanished_file_is_treated_as_removal() -> TestResult {
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());

    fs.remove(p("main.go"));
    assert_eq!(
        classifier.classify(&write("main.go"), Instant::now()),
        Verdict::Changed
    );
    assert!(!classifier.cache().contains(&p("main.go")));
    Ok(())
}

#[test]
fn other_operations_never_change_anything() -> TestResult {
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());

    fs.add_file(p("main.go"), "package main // edited\n");
    let verdict = classifier.classify(&RawEvent::new(FsOp::Other, p("main.go")), Instant::now());
    assert_eq!(verdict, Verdict::NoOp);

    // The cache still holds the old state, so a real write is still seen.
    assert_eq!(
        classifier.classify(&write("main.go"), Instant::now()),
        Verdict::Changed
    );
    Ok(())
}

#[test]
fn new_directory_is_reported_only_in_recursive_mode() -> TestResult {
    let fs = sample_project();
    fs.add_dir(p("internal"));
    let create = RawEvent::new(FsOp::Create, p("internal"));

    let mut recursive = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    assert_eq!(
        recursive.classify(&create, Instant::now()),
        Verdict::DirectoryCreated(p("internal"))
    );

    let mut flat = classifier_for(
        &fs,
        &WatchSettingsBuilder::new(root()).recursive(false).build(),
    );
    assert_eq!(flat.classify(&create, Instant::now()), Verdict::NoOp);
    Ok(())
}

#[test]
fn removing_a_directory_drops_its_tracked_files() -> TestResult {
    let fs = sample_project();
    fs.add_file(p("pkg/sub/deep.go"), "package sub\n");
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());
    assert!(classifier.cache().contains(&p("pkg/sub/deep.go")));

    fs.remove(p("pkg"));
    let verdict = classifier.classify(&RawEvent::new(FsOp::Remove, p("pkg")), Instant::now());
    assert_eq!(verdict, Verdict::Changed);
    assert!(!classifier.cache().contains(&p("pkg/util.go")));
    assert!(!classifier.cache().contains(&p("pkg/sub/deep.go")));
    assert!(classifier.cache().contains(&p("main.go")));
    Ok(())
}

#[test]
fn ignored_paths_never_signal_or_touch_the_cache() -> TestResult {
    init_tracing();
    let fs = sample_project();
    let settings = WatchSettingsBuilder::new(root()).ignore("*.tmp").build();
    let mut classifier = classifier_for(&fs, &settings);
    let now = Instant::now();
    let tracked_before = classifier.cache().len();

    for (i, rel) in [
        "x.tmp",
        ".git/index",
        "node_modules/lib/index.js",
        "main.go.swp",
        "4913",
    ]
    .iter()
    .enumerate()
    {
        fs.add_file(p(rel), format!("content {i}"));
        for op in [FsOp::Create, FsOp::Write, FsOp::Remove, FsOp::Rename] {
            let verdict = classifier.classify(&RawEvent::new(op, p(rel)), now);
            assert_eq!(verdict, Verdict::Ignored, "{op} on {rel}");
        }
    }

    assert_eq!(classifier.cache().len(), tracked_before);
    Ok(())
}

#[test]
fn allow_list_excludes_everything_else() -> TestResult {
    let fs = sample_project();
    let settings = WatchSettingsBuilder::new(root()).filter("*.go").build();
    let mut classifier = classifier_for(&fs, &settings);

    fs.add_file(p("README"), "changed readme\n");
    assert_eq!(
        classifier.classify(&write("README"), Instant::now()),
        Verdict::Ignored
    );

    fs.add_file(p("main.go"), "package main // v2\n");
    assert_eq!(
        classifier.classify(&write("main.go"), Instant::now()),
        Verdict::Changed
    );
    Ok(())
}

#[test]
fn rebuild_replaces_the_incremental_cache() -> TestResult {
    let fs = sample_project();
    let mut classifier = classifier_for(&fs, &WatchSettingsBuilder::new(root()).build());

    // A file that appeared without any notification.
    fs.add_file(p("missed.go"), "package main\n");
    assert!(!classifier.cache().contains(&p("missed.go")));

    classifier.rebuild()?;
    assert!(classifier.cache().contains(&p("missed.go")));
    Ok(())
}
