mod common;
use crate::common::{
    EventLog, init_tracing, mock_tree1, tree1_watcher, under_tree1, watcher_on, with_timeout,
};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, mpsc as std_mpsc};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use dirwatcher::errors::WatcherError;
use dirwatcher::types::WatchFlags;
use dirwatcher::watch::{NO_PATTERNS, UpdateEvent, Watcher};

/// Blocks the scan worker right after `at` is reported, until released.
struct Gate {
    entered: mpsc::UnboundedReceiver<()>,
    release: std_mpsc::Sender<()>,
}

impl Gate {
    fn install(watcher: &Watcher, at: &str) -> Self {
        let (entered_tx, entered) = mpsc::unbounded_channel();
        let (release, release_rx) = std_mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let at = PathBuf::from(at);
        let fired = AtomicBool::new(false);

        watcher
            .subscribe(move |e: &UpdateEvent| {
                if e.path == at && !fired.swap(true, Ordering::SeqCst) {
                    let _ = entered_tx.send(());
                    let _ = release_rx.lock().unwrap().recv();
                }
            })
            .unwrap();

        Self { entered, release }
    }

    async fn wait_entered(&mut self) {
        with_timeout(self.entered.recv()).await;
    }

    fn open(&self) {
        self.release.send(()).unwrap();
    }
}

async fn wait_idle(watcher: &Watcher) {
    with_timeout(async {
        while watcher.is_scanning() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

#[test]
fn construction_errors() {
    let err = Watcher::new(Vec::<PathBuf>::new(), NO_PATTERNS, NO_PATTERNS, WatchFlags::NONE)
        .unwrap_err();
    assert!(matches!(err, WatcherError::NoRoots));

    let err = Watcher::new(["/tree1"], NO_PATTERNS, ["("], WatchFlags::NONE).unwrap_err();
    match err {
        WatcherError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "("),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_scan_is_busy_and_first_is_unaffected() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);
    let mut gate = Gate::install(&watcher, "/tree1");

    let first = watcher.scan(None).unwrap();
    gate.wait_entered().await;

    assert!(watcher.is_scanning());
    assert!(matches!(watcher.scan(None), Err(WatcherError::Busy)));
    assert!(matches!(
        watcher.scan(Some(CancellationToken::new())),
        Err(WatcherError::Busy)
    ));

    gate.open();
    let summary = with_timeout(first).await.unwrap();
    assert_eq!(summary.files, 6);
    assert_eq!(log.files().len(), 6);
    assert!(!watcher.is_scanning());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscriptions_cannot_change_while_scanning() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);
    let mut gate = Gate::install(&watcher, "/tree1");

    let handle = watcher.scan(None).unwrap();
    gate.wait_entered().await;

    assert!(matches!(watcher.subscribe(|_| {}), Err(WatcherError::Busy)));
    assert!(matches!(watcher.subscribe_channel(), Err(WatcherError::Busy)));
    let id = log.id().unwrap();
    assert!(matches!(watcher.unsubscribe(id), Err(WatcherError::Busy)));

    gate.open();
    with_timeout(handle).await.unwrap();

    assert!(watcher.unsubscribe(id).unwrap());
    assert!(!watcher.unsubscribe(id).unwrap());
}

#[tokio::test]
async fn unsubscribed_listeners_see_nothing() {
    init_tracing();
    let (watcher, first) = tree1_watcher(&[], &[]);
    let second = EventLog::attach(&watcher);
    watcher.unsubscribe(second.id().unwrap()).unwrap();

    with_timeout(watcher.scan(None).unwrap()).await.unwrap();

    assert_eq!(first.events().len(), 9);
    assert!(second.events().is_empty());
}

#[tokio::test]
async fn channel_subscribers_receive_the_same_stream() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[r"\.foo$"], &[]);
    let (_id, mut rx) = watcher.subscribe_channel().unwrap();

    with_timeout(watcher.scan(None).unwrap()).await.unwrap();

    let mut received = Vec::new();
    while let Ok(event) = rx.try_recv() {
        received.push(event);
    }
    assert_eq!(received, log.events());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_mid_scan_stops_promptly() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);
    let mut gate = Gate::install(&watcher, "/tree1/dir1");

    let handle = watcher.scan(None).unwrap();
    gate.wait_entered().await;
    handle.cancel();
    gate.open();

    let err = with_timeout(handle).await.unwrap_err();
    assert!(err.is_cancelled());

    let mut expected = vec![PathBuf::from("/tree1")];
    expected.extend(under_tree1(&["file1", "file2", "dir1"]));
    assert_eq!(log.paths(), expected);
    assert!(!watcher.is_scanning());
}

#[tokio::test]
async fn pre_cancelled_token_then_reuse() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);

    let token = CancellationToken::new();
    token.cancel();
    let err = with_timeout(watcher.scan(Some(token)).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, WatcherError::Cancelled));
    assert!(log.events().is_empty());

    let summary = with_timeout(watcher.scan(None).unwrap()).await.unwrap();
    assert_eq!(summary.files, 6);
}

#[tokio::test]
async fn failed_scan_leaves_the_watcher_reusable() {
    init_tracing();
    let fs = mock_tree1();
    fs.fail_open("/tree1/dir2", std::io::ErrorKind::PermissionDenied);
    let (watcher, log) = watcher_on(fs, &["/tree1"], &[], &[]);

    let err = with_timeout(watcher.scan(None).unwrap()).await.unwrap_err();
    assert!(matches!(err, WatcherError::PermissionDenied(_)));
    assert_eq!(err.path(), Some(Path::new("/tree1/dir2")));
    assert!(!watcher.is_scanning());

    watcher.set_ignores(&["dir2"]).unwrap();
    log.clear();
    let summary = with_timeout(watcher.scan(None).unwrap()).await.unwrap();
    assert_eq!(summary.files, 4);
}

#[tokio::test]
async fn missing_root_is_not_found() {
    init_tracing();
    let (watcher, _log) = watcher_on(mock_tree1(), &["/tree1", "/nope"], &[], &[]);

    let err = with_timeout(watcher.scan(None).unwrap()).await.unwrap_err();
    assert!(matches!(err, WatcherError::NotFound(ref p) if p == Path::new("/nope")));
}

#[tokio::test]
async fn set_ignores_applies_to_the_next_scan() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);

    with_timeout(watcher.scan(None).unwrap()).await.unwrap();
    assert_eq!(log.files().len(), 6);

    watcher.set_ignores(&["dir1"]).unwrap();
    assert_eq!(watcher.ignores(), vec!["dir1"]);
    log.clear();

    with_timeout(watcher.scan(None).unwrap()).await.unwrap();
    assert_eq!(
        log.files(),
        under_tree1(&["file1", "file2", "dir2/file6.foo", "dir2/file6.bar"])
    );
}

#[tokio::test]
async fn set_matches_applies_to_the_next_scan() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);

    with_timeout(watcher.scan(None).unwrap()).await.unwrap();
    watcher.set_matches(&[r"\.foo$"]).unwrap();
    log.clear();

    with_timeout(watcher.scan(None).unwrap()).await.unwrap();
    assert_eq!(log.files(), under_tree1(&["dir1/file4.foo", "dir2/file6.foo"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pattern_changes_reach_a_scan_in_flight() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);
    let mut gate = Gate::install(&watcher, "/tree1/dir1");

    let handle = watcher.scan(None).unwrap();
    gate.wait_entered().await;
    watcher.set_matches(&[r"\.bar$"]).unwrap();
    gate.open();

    with_timeout(handle).await.unwrap();
    assert_eq!(
        log.files(),
        under_tree1(&["file1", "file2", "dir1/file5.bar", "dir2/file6.bar"])
    );
}

#[tokio::test]
async fn invalid_patterns_keep_the_previous_set() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[r"\.foo$"], &["dir2"]);

    assert!(matches!(
        watcher.set_matches(&["("]),
        Err(WatcherError::InvalidPattern { .. })
    ));
    assert!(matches!(
        watcher.set_ignores(&["ok", ")"]),
        Err(WatcherError::InvalidPattern { .. })
    ));
    assert_eq!(watcher.matches(), vec![r"\.foo$"]);
    assert_eq!(watcher.ignores(), vec!["dir2"]);

    with_timeout(watcher.scan(None).unwrap()).await.unwrap();
    assert_eq!(log.files(), under_tree1(&["dir1/file4.foo"]));
}

#[tokio::test]
async fn dropping_the_handle_does_not_stop_the_scan() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);

    drop(watcher.scan(None).unwrap());
    wait_idle(&watcher).await;

    assert_eq!(log.events().len(), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_the_watcher_cancels_its_scan() {
    init_tracing();
    let (watcher, log) = tree1_watcher(&[], &[]);
    let mut gate = Gate::install(&watcher, "/tree1/dir1");

    let handle = watcher.scan(None).unwrap();
    gate.wait_entered().await;
    drop(watcher);
    gate.open();

    let err = with_timeout(handle).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(log.paths().iter().all(|p| !p.starts_with("/tree1/dir2")));
}
