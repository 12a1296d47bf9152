mod common;
use crate::common::{EventLog, FakeMonitor, init_tracing, mock_tree1, with_timeout};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use dirwatcher::errors::WatcherError;
use dirwatcher::fs::mock::MockFileSystem;
use dirwatcher::types::{EventKind, FileKind};
use dirwatcher::watch::{UpdateEvent, Watcher};

struct Setup {
    fs: MockFileSystem,
    monitor: FakeMonitor,
    watcher: Watcher,
    log: EventLog,
}

fn setup(matches: &[&str], ignores: &[&str]) -> Setup {
    let fs = mock_tree1();
    let monitor = FakeMonitor::new();
    let watcher = Watcher::builder(["/tree1"])
        .matches(matches)
        .ignores(ignores)
        .filesystem(Arc::new(fs.clone()))
        .monitor_backend(monitor.boxed())
        .build()
        .unwrap();
    let log = EventLog::attach(&watcher);
    Setup {
        fs,
        monitor,
        watcher,
        log,
    }
}

fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(PathBuf::from).collect()
}

#[tokio::test]
async fn scan_monitors_every_directory_it_enters() {
    init_tracing();
    let s = setup(&[], &["dir2"]);
    assert!(s.watcher.flags().monitor);

    with_timeout(s.watcher.scan(None).unwrap()).await.unwrap();

    assert_eq!(s.watcher.monitored_dirs(), paths(&["/tree1", "/tree1/dir1"]));
    assert_eq!(s.monitor.calls(), vec!["watch /tree1", "watch /tree1/dir1"]);
}

#[tokio::test]
async fn rescanning_does_not_watch_twice() {
    init_tracing();
    let s = setup(&[], &[]);

    with_timeout(s.watcher.scan(None).unwrap()).await.unwrap();
    with_timeout(s.watcher.scan(None).unwrap()).await.unwrap();

    assert_eq!(s.monitor.calls().len(), 3);
    assert_eq!(s.watcher.monitored_dirs().len(), 3);
}

#[tokio::test]
async fn monitor_failure_during_scan_is_fatal() {
    init_tracing();
    let s = setup(&[], &[]);
    s.monitor.fail_on("/tree1/dir2");

    let err = with_timeout(s.watcher.scan(None).unwrap()).await.unwrap_err();

    assert!(matches!(err, WatcherError::Io { .. }));
    assert_eq!(err.path(), Some(Path::new("/tree1/dir2")));
    assert!(s.log.files().iter().all(|p| !p.starts_with("/tree1/dir2")));
}

#[tokio::test]
async fn cancellation_keeps_monitors_already_installed() {
    init_tracing();
    let s = setup(&[], &[]);
    let token = CancellationToken::new();
    let trigger = token.clone();
    s.watcher
        .subscribe(move |e: &UpdateEvent| {
            if e.path == Path::new("/tree1/dir1") {
                trigger.cancel();
            }
        })
        .unwrap();

    let err = with_timeout(s.watcher.scan(Some(token)).unwrap())
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(s.watcher.monitored_dirs(), paths(&["/tree1", "/tree1/dir1"]));
}

#[tokio::test]
async fn created_directories_are_monitored_and_reported() {
    init_tracing();
    let s = setup(&[], &[]);
    with_timeout(s.watcher.scan(None).unwrap()).await.unwrap();
    s.log.clear();

    s.fs.add_dir("/tree1/dir3");
    s.watcher
        .handle_change(EventKind::Created, Path::new("/tree1/dir3"));

    assert!(s.watcher.monitored_dirs().contains(&PathBuf::from("/tree1/dir3")));
    assert_eq!(
        s.log.events(),
        vec![UpdateEvent::new(
            EventKind::Created,
            FileKind::Directory,
            "/tree1/dir3"
        )]
    );
}

#[tokio::test]
async fn deleted_directories_lose_their_monitor() {
    init_tracing();
    let s = setup(&[], &[]);
    with_timeout(s.watcher.scan(None).unwrap()).await.unwrap();
    s.log.clear();

    s.fs.remove("/tree1/dir1");
    s.watcher
        .handle_change(EventKind::Deleted, Path::new("/tree1/dir1"));

    assert_eq!(s.watcher.monitored_dirs(), paths(&["/tree1", "/tree1/dir2"]));
    assert!(s.monitor.calls().contains(&"unwatch /tree1/dir1".to_string()));
    assert_eq!(
        s.log.events(),
        vec![UpdateEvent::new(
            EventKind::Deleted,
            FileKind::Unknown,
            "/tree1/dir1"
        )]
    );
}

#[tokio::test]
async fn changes_go_through_the_current_patterns() {
    init_tracing();
    let s = setup(&[r"\.foo$"], &["dir2"]);

    s.watcher
        .handle_change(EventKind::Changed, Path::new("/tree1/dir1/file4.foo"));
    s.watcher
        .handle_change(EventKind::Changed, Path::new("/tree1/dir1/file5.bar"));
    s.watcher
        .handle_change(EventKind::Changed, Path::new("/tree1/dir2/file6.foo"));

    assert_eq!(
        s.log.events(),
        vec![UpdateEvent::new(
            EventKind::Changed,
            FileKind::Regular,
            "/tree1/dir1/file4.foo"
        )]
    );

    s.watcher.set_matches::<&str>(&[]).unwrap();
    s.log.clear();
    s.watcher
        .handle_change(EventKind::Changed, Path::new("/tree1/dir1/file5.bar"));
    assert_eq!(s.log.files(), paths(&["/tree1/dir1/file5.bar"]));
}

#[tokio::test]
async fn monitor_failure_on_change_is_not_fatal() {
    init_tracing();
    let s = setup(&[], &[]);
    s.fs.add_dir("/tree1/dir3");
    s.monitor.fail_on("/tree1/dir3");

    s.watcher
        .handle_change(EventKind::Created, Path::new("/tree1/dir3"));
    s.fs.add_dir("/tree1/dir4");
    s.watcher
        .handle_change(EventKind::Created, Path::new("/tree1/dir4"));

    assert_eq!(s.watcher.monitored_dirs(), paths(&["/tree1/dir4"]));
    assert_eq!(s.log.dirs(), paths(&["/tree1/dir3", "/tree1/dir4"]));
}

#[tokio::test]
async fn clear_monitors_and_drop_tear_everything_down() {
    init_tracing();
    let s = setup(&[], &[]);
    with_timeout(s.watcher.scan(None).unwrap()).await.unwrap();

    s.watcher.clear_monitors();
    assert!(s.watcher.monitored_dirs().is_empty());
    let unwatched = s
        .monitor
        .calls()
        .iter()
        .filter(|c| c.starts_with("unwatch"))
        .count();
    assert_eq!(unwatched, 3);

    // Scanning again restores them; dropping removes them once more.
    with_timeout(s.watcher.scan(None).unwrap()).await.unwrap();
    assert_eq!(s.watcher.monitored_dirs().len(), 3);

    let monitor = s.monitor.clone();
    drop(s);
    let unwatched = monitor
        .calls()
        .iter()
        .filter(|c| c.starts_with("unwatch"))
        .count();
    assert_eq!(unwatched, 6);
}

#[tokio::test]
async fn disabled_monitoring_installs_nothing() {
    init_tracing();
    let watcher = Watcher::builder(["/tree1"])
        .filesystem(Arc::new(mock_tree1()))
        .build()
        .unwrap();

    with_timeout(watcher.scan(None).unwrap()).await.unwrap();

    assert!(!watcher.flags().monitor);
    assert!(watcher.monitored_dirs().is_empty());
}
