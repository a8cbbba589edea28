mod common;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use reloadwatch::engine::{SessionCommand, SessionCore, SessionEvent};
use reloadwatch::fs::mock::MockFileSystem;
use reloadwatch::fs::FileSystem;
use reloadwatch::types::WatchSettings;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use reloadwatch::watch::{translate, FsOp, IgnoreEvaluator, RawEvent, SAVE_WINDOW};
use reloadwatch_test_utils::{
    created_dir, data_modified, metadata_changed, renamed, renamed_any, WatchSettingsBuilder,
};
use tokio::time::Instant;

use crate::common::{init_tracing, p, root, sample_project};

type TestResult = Result<(), Box<dyn Error>>;

fn core_for(fs: &MockFileSystem, settings: &WatchSettings) -> Result<SessionCore, Box<dyn Error>> {
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let ignore = IgnoreEvaluator::from_settings(shared.as_ref(), settings)?;
    Ok(SessionCore::start(settings, shared, ignore)?)
}

fn notify(event: notify::Event) -> SessionEvent {
    SessionEvent::Notify(event)
}

#[test]
fn each_real_change_rearms_with_a_new_generation() -> TestResult {
    init_tracing();
    let fs = sample_project();
    let settings = WatchSettingsBuilder::new(root()).debounce_ms(50).build();
    let mut core = core_for(&fs, &settings)?;
    let now = Instant::now();

    fs.add_file(p("main.go"), "package main // 1\n");
    let step = core.step(notify(data_modified(p("main.go"))), now);
    assert!(step.keep_running);
    assert_eq!(
        step.commands,
        vec![SessionCommand::ArmDebounce {
            generation: 1,
            after: Duration::from_millis(50)
        }]
    );
    assert!(core.is_pending());

    fs.add_file(p("main.go"), "package main // 2\n");
    let step = core.step(notify(data_modified(p("main.go"))), now);
    assert_eq!(
        step.commands,
        vec![SessionCommand::ArmDebounce {
            generation: 2,
            after: Duration::from_millis(50)
        }]
    );
    Ok(())
}

#[test]
fn non_positive_debounce_uses_the_default() -> TestResult {
    let fs = sample_project();
    for ms in [0, -5] {
        let settings = WatchSettingsBuilder::new(root()).debounce_ms(ms).build();
        let mut core = core_for(&fs, &settings)?;
        fs.add_file(p("main.go"), format!("package main // {ms}\n"));
        let step = core.step(notify(data_modified(p("main.go"))), Instant::now());
        assert!(matches!(
            step.commands.as_slice(),
            [SessionCommand::ArmDebounce { after, .. }] if *after == Duration::from_millis(300)
        ));
    }
    Ok(())
}

#[test]
fn noise_does_not_arm_the_timer() -> TestResult {
    let fs = sample_project();
    let mut core = core_for(&fs, &WatchSettingsBuilder::new(root()).build())?;
    let now = Instant::now();

    fs.touch(p("main.go"));
    let step = core.step(notify(metadata_changed(p("main.go"))), now);
    assert!(step.commands.is_empty());

    let step = core.step(notify(data_modified(p("main.go"))), now);
    assert!(step.commands.is_empty());
    assert!(!core.is_pending());
    Ok(())
}

#[test]
fn only_the_latest_generation_fires() -> TestResult {
    let fs = sample_project();
    let mut core = core_for(&fs, &WatchSettingsBuilder::new(root()).build())?;
    let now = Instant::now();

    fs.add_file(p("main.go"), "package main // a\n");
    core.step(notify(data_modified(p("main.go"))), now);
    fs.add_file(p("main.go"), "package main // b\n");
    core.step(notify(data_modified(p("main.go"))), now);

    let stale = core.step(SessionEvent::DebounceElapsed { generation: 1 }, now);
    assert!(stale.commands.is_empty());
    assert!(core.is_pending());

    let fire = core.step(SessionEvent::DebounceElapsed { generation: 2 }, now);
    assert_eq!(fire.commands, vec![SessionCommand::FireHook]);

    core.hook_finished();
    assert!(!core.is_pending());
    assert!(!core.is_armed());

    // A duplicate expiry after firing does nothing.
    let again = core.step(SessionEvent::DebounceElapsed { generation: 2 }, now);
    assert!(again.commands.is_empty());
    Ok(())
}

#[test]
fn firing_rebuilds_the_cache() -> TestResult {
    let fs = sample_project();
    let mut core = core_for(&fs, &WatchSettingsBuilder::new(root()).build())?;
    let now = Instant::now();

    fs.add_file(p("main.go"), "package main // c\n");
    core.step(notify(data_modified(p("main.go"))), now);
    // Created without a notification reaching the core.
    fs.add_file(p("pkg/extra.go"), "package pkg\n");

    core.step(SessionEvent::DebounceElapsed { generation: 1 }, now);
    assert!(core.cache().contains(&p("pkg/extra.go")));
    Ok(())
}

#[test]
fn truncation_schedules_a_save_window_check() -> TestResult {
    let fs = sample_project();
    let mut core = core_for(&fs, &WatchSettingsBuilder::new(root()).build())?;
    let t0 = Instant::now();

    fs.add_file(p("main.go"), "");
    let step = core.step(notify(data_modified(p("main.go"))), t0);
    assert_eq!(
        step.commands,
        vec![SessionCommand::ScheduleSaveCheck {
            path: p("main.go"),
            after: SAVE_WINDOW
        }]
    );
    assert!(!core.is_pending());

    // Nothing followed: the emptying is reported once the window closes.
    let step = core.step(SessionEvent::SaveWindowElapsed { path: p("main.go") }, t0 + SAVE_WINDOW);
    assert!(matches!(
        step.commands.as_slice(),
        [SessionCommand::ArmDebounce { generation: 1, .. }]
    ));
    assert!(core.is_pending());
    Ok(())
}

#[test]
fn new_directory_subscribes_it_and_its_subdirectories() -> TestResult {
    let fs = sample_project();
    let mut core = core_for(&fs, &WatchSettingsBuilder::new(root()).build())?;

    fs.add_dir(p("svc/api"));
    fs.add_dir(p("svc/node_modules/dep"));
    let step = core.step(notify(created_dir(p("svc"))), Instant::now());

    let mut watched: Vec<_> = step
        .commands
        .iter()
        .filter_map(|c| match c {
            SessionCommand::WatchDirectory(d) => Some(d.clone()),
            _ => None,
        })
        .collect();
    watched.sort();
    assert_eq!(watched, vec![p("svc"), p("svc/api")]);
    assert!(!core.is_pending());
    Ok(())
}

#[test]
fn shutdown_stops_the_loop() -> TestResult {
    let fs = sample_project();
    let mut core = core_for(&fs, &WatchSettingsBuilder::new(root()).build())?;
    let step = core.step(SessionEvent::ShutdownRequested, Instant::now());
    assert!(!step.keep_running);
    assert!(step.commands.is_empty());
    Ok(())
}

#[test]
fn rename_within_the_tree_moves_the_entry_and_arms_once() -> TestResult {
    init_tracing();
    let fs = sample_project();
    let mut core = core_for(&fs, &WatchSettingsBuilder::new(root()).debounce_ms(50).build())?;

    fs.remove(p("main.go"));
    fs.add_file(p("app.go"), "package main\n");
    let step = core.step(notify(renamed(p("main.go"), p("app.go"))), Instant::now());

    assert_eq!(
        step.commands,
        vec![SessionCommand::ArmDebounce {
            generation: 1,
            after: Duration::from_millis(50)
        }]
    );
    assert!(!core.cache().contains(&p("main.go")));
    assert!(core.cache().contains(&p("app.go")));
    Ok(())
}

#[test]
fn unpaired_rename_is_resolved_by_existence() -> TestResult {
    let fs = sample_project();
    let mut core = core_for(&fs, &WatchSettingsBuilder::new(root()).build())?;

    // Moved into the tree: tracked as a creation.
    fs.add_file(p("moved_in.go"), "package main\n");
    let step = core.step(notify(renamed_any(p("moved_in.go"))), Instant::now());
    assert!(matches!(
        step.commands.as_slice(),
        [SessionCommand::ArmDebounce { generation: 1, .. }]
    ));
    assert!(core.cache().contains(&p("moved_in.go")));

    // Moved out of the tree: dropped like a removal.
    fs.remove(p("pkg/util.go"));
    let step = core.step(notify(renamed_any(p("pkg/util.go"))), Instant::now());
    assert!(matches!(
        step.commands.as_slice(),
        [SessionCommand::ArmDebounce { generation: 2, .. }]
    ));
    assert!(!core.cache().contains(&p("pkg/util.go")));
    Ok(())
}

#[test]
fn rename_halves_translate_to_rename_away_and_create() {
    let fs = sample_project();
    let half = |mode: RenameMode, rel: &str| {
        Event::new(EventKind::Modify(ModifyKind::Name(mode))).add_path(p(rel))
    };

    assert_eq!(
        translate(&half(RenameMode::From, "old.go"), &fs),
        vec![RawEvent::new(FsOp::Rename, p("old.go"))]
    );
    assert_eq!(
        translate(&half(RenameMode::To, "new.go"), &fs),
        vec![RawEvent::new(FsOp::Create, p("new.go"))]
    );
    assert_eq!(
        translate(&renamed(p("a.go"), p("b.go")), &fs),
        vec![
            RawEvent::new(FsOp::Rename, p("a.go")),
            RawEvent::new(FsOp::Create, p("b.go")),
        ]
    );
    // Existing path under an unknown mode counts as the new name.
    assert_eq!(
        translate(&renamed_any(p("main.go")), &fs),
        vec![RawEvent::new(FsOp::Create, p("main.go"))]
    );
}
