pub mod builders;
pub mod fake_monitor;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};

use dirwatcher::types::FileKind;
use dirwatcher::watch::{SubscriptionId, UpdateEvent, Watcher};
use tracing_subscriber::{EnvFilter, fmt};

pub use builders::{ConfigFileBuilder, TREE1_FILES, TempTree, mock_tree1};
pub use fake_monitor::FakeMonitor;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Records every event a watcher emits, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<UpdateEvent>>>,
    id: Option<SubscriptionId>,
}

impl EventLog {
    /// Subscribe a fresh log to `watcher`. Panics if a scan is running.
    pub fn attach(watcher: &Watcher) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let id = watcher
            .subscribe(move |e: &UpdateEvent| sink.lock().unwrap().push(e.clone()))
            .expect("subscribe while idle");
        Self {
            events,
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.events().into_iter().map(|e| e.path).collect()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.of_kind(FileKind::Regular)
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.of_kind(FileKind::Directory)
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn of_kind(&self, kind: FileKind) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter(|e| e.file_kind == kind)
            .map(|e| e.path)
            .collect()
    }
}
