// src/watch/watcher.rs

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use anyhow::Context as _;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::{Result, WatcherError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::{EventKind, WatchFlags};
use crate::watch::dispatcher::ChangeDispatcher;
use crate::watch::event::{EventBus, SubscriptionId, UpdateEvent};
use crate::watch::filter::PathFilter;
use crate::watch::monitor::{DirectoryMonitor, NotifyMonitor, RawEvent};
use crate::watch::patterns::PatternSet;
use crate::watch::registry::MonitorRegistry;
use crate::watch::scanner::{ScanEngine, ScanSummary};

/// Convenience for "no patterns" arguments to [`Watcher::new`].
pub const NO_PATTERNS: [&str; 0] = [];

/// State shared between the API, the scan worker and the dispatch thread.
struct Shared {
    roots: Vec<PathBuf>,
    flags: WatchFlags,
    fs: Arc<dyn FileSystem>,
    filter: PathFilter,
    registry: MonitorRegistry,
    bus: EventBus,
    /// Token of the running scan; `Some` exactly while scanning.
    active: Mutex<Option<CancellationToken>>,
}

impl Shared {
    fn active(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatcher(&self) -> ChangeDispatcher<'_> {
        ChangeDispatcher::new(self.fs.as_ref(), &self.filter, &self.registry, &self.bus)
    }
}

/// Claim on the single scan slot.
///
/// Moved into the worker closure, so the slot is freed however the worker
/// ends, including when the runtime drops the closure without running it.
struct ScanSlot(Arc<Shared>);

impl ScanSlot {
    fn claim(shared: &Arc<Shared>, token: &CancellationToken) -> Result<Self> {
        let mut active = shared.active();
        if active.is_some() {
            debug!("scan requested while scanning");
            return Err(WatcherError::Busy);
        }
        *active = Some(token.clone());
        Ok(Self(Arc::clone(shared)))
    }

    fn shared(&self) -> &Shared {
        &self.0
    }
}

impl Drop for ScanSlot {
    fn drop(&mut self) {
        self.0.active().take();
    }
}

/// Asynchronous directory scanner with optional change monitoring.
///
/// A scan walks every root depth-first and reports each interesting file
/// and every non-ignored directory as an [`UpdateEvent`] with
/// [`EventKind::Created`]. With monitoring enabled, each directory seen
/// gets a change monitor, and later changes below the roots keep arriving
/// as update events after the scan is done.
///
/// Events are delivered on the thread that produced them (the scan worker
/// or the change-dispatch thread), so listeners must be `Send + Sync`.
/// Subscriptions cannot be added or removed while a scan is running.
///
/// Dropping the watcher cancels a running scan and removes every monitor.
pub struct Watcher {
    shared: Arc<Shared>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("roots", &self.shared.roots)
            .field("flags", &self.shared.flags)
            .field("filter", &self.shared.filter)
            .field("registry", &self.shared.registry)
            .field("scanning", &self.is_scanning())
            .finish()
    }
}

impl Watcher {
    /// Create a watcher for `roots`.
    ///
    /// Both pattern lists are compiled up front; an invalid pattern fails
    /// the whole construction.
    pub fn new<R, P, M, I>(roots: R, matches: M, ignores: I, flags: WatchFlags) -> Result<Self>
    where
        R: IntoIterator<Item = P>,
        P: Into<PathBuf>,
        M: IntoIterator,
        M::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        WatcherBuilder::new(roots)
            .matches(matches)
            .ignores(ignores)
            .flags(flags)
            .build()
    }

    pub fn builder<R, P>(roots: R) -> WatcherBuilder
    where
        R: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        WatcherBuilder::new(roots)
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        WatcherBuilder::new(cfg.roots.iter().cloned())
            .matches(&cfg.matches)
            .ignores(&cfg.ignores)
            .flags(cfg.flags())
            .build()
    }

    /// Start scanning in the background.
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// [`WatcherError::Busy`] if a scan is already running; that scan is
    /// not affected. When no token is given, the scan gets its own, which
    /// is reachable through the returned handle.
    pub fn scan(&self, cancel: Option<CancellationToken>) -> Result<ScanHandle> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let token = cancel.unwrap_or_default();
        let slot = ScanSlot::claim(&self.shared, &token)?;

        let worker_token = token.clone();
        let join = runtime.spawn_blocking(move || {
            let shared = slot.shared();
            ScanEngine::new(
                shared.fs.as_ref(),
                &shared.filter,
                &shared.registry,
                &shared.bus,
                &worker_token,
            )
            .run(&shared.roots)
        });

        Ok(ScanHandle {
            join,
            cancel: token,
        })
    }

    pub fn is_scanning(&self) -> bool {
        self.shared.active().is_some()
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.shared.roots
    }

    pub fn flags(&self) -> WatchFlags {
        self.shared.flags
    }

    pub fn matches(&self) -> Vec<String> {
        self.shared.filter.matches()
    }

    pub fn ignores(&self) -> Vec<String> {
        self.shared.filter.ignores()
    }

    /// Replace the match patterns. A running scan picks them up at its next
    /// directory or entry. On error the old patterns stay active.
    pub fn set_matches<S: AsRef<str>>(&self, patterns: &[S]) -> Result<()> {
        self.shared.filter.set_matches(patterns)
    }

    /// Replace the ignore patterns. A running scan picks them up at its next
    /// directory. On error the old patterns stay active.
    pub fn set_ignores<S: AsRef<str>>(&self, patterns: &[S]) -> Result<()> {
        self.shared.filter.set_ignores(patterns)
    }

    pub fn subscribe<F>(&self, listener: F) -> Result<SubscriptionId>
    where
        F: Fn(&UpdateEvent) + Send + Sync + 'static,
    {
        let active = self.shared.active();
        if active.is_some() {
            return Err(WatcherError::Busy);
        }
        Ok(self.shared.bus.subscribe(Arc::new(listener)))
    }

    pub fn subscribe_channel(&self) -> Result<(SubscriptionId, mpsc::UnboundedReceiver<UpdateEvent>)> {
        let active = self.shared.active();
        if active.is_some() {
            return Err(WatcherError::Busy);
        }
        Ok(self.shared.bus.subscribe_channel())
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        let active = self.shared.active();
        if active.is_some() {
            return Err(WatcherError::Busy);
        }
        Ok(self.shared.bus.unsubscribe(id))
    }

    /// Feed a change notification from an external notifier through the
    /// same filtering and bookkeeping as the built-in monitors.
    pub fn handle_change(&self, kind: EventKind, path: &Path) {
        self.shared.dispatcher().dispatch(kind, path);
    }

    /// Directories currently carrying a change monitor, sorted.
    pub fn monitored_dirs(&self) -> Vec<PathBuf> {
        self.shared.registry.paths()
    }

    /// Remove every change monitor. A later scan installs them again.
    pub fn clear_monitors(&self) {
        self.shared.registry.teardown();
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        if let Some(token) = self.shared.active().as_ref() {
            token.cancel();
        }
        self.shared.registry.teardown();
    }
}

/// Handle to a running scan. Resolves to the scan's outcome.
///
/// Dropping the handle does not stop the scan.
#[derive(Debug)]
pub struct ScanHandle {
    join: JoinHandle<Result<ScanSummary>>,
    cancel: CancellationToken,
}

impl ScanHandle {
    /// Ask the scan to stop at its next directory or entry.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Future for ScanHandle {
    type Output = Result<ScanSummary>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.join).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(err)) => Poll::Ready(Err(WatcherError::Other(
                anyhow::Error::new(err).context("scan worker failed"),
            ))),
        }
    }
}

/// Builder for [`Watcher`], also used to swap in a custom filesystem or
/// monitor backend.
pub struct WatcherBuilder {
    roots: Vec<PathBuf>,
    matches: Vec<String>,
    ignores: Vec<String>,
    flags: WatchFlags,
    fs: Option<Arc<dyn FileSystem>>,
    monitor: Option<Box<dyn DirectoryMonitor>>,
}

impl fmt::Debug for WatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherBuilder")
            .field("roots", &self.roots)
            .field("matches", &self.matches)
            .field("ignores", &self.ignores)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl WatcherBuilder {
    pub fn new<R, P>(roots: R) -> Self
    where
        R: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            matches: Vec::new(),
            ignores: Vec::new(),
            flags: WatchFlags::NONE,
            fs: None,
            monitor: None,
        }
    }

    pub fn matches<M>(mut self, patterns: M) -> Self
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        self.matches = patterns.into_iter().map(|p| p.as_ref().to_string()).collect();
        self
    }

    pub fn ignores<I>(mut self, patterns: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.ignores = patterns.into_iter().map(|p| p.as_ref().to_string()).collect();
        self
    }

    pub fn flags(mut self, flags: WatchFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn monitor(mut self, enabled: bool) -> Self {
        self.flags.monitor = enabled;
        self
    }

    pub fn filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Use `monitor` instead of the `notify` backend. This turns monitoring
    /// on; notifications then have to be fed in with
    /// [`Watcher::handle_change`].
    pub fn monitor_backend(mut self, monitor: Box<dyn DirectoryMonitor>) -> Self {
        self.flags.monitor = true;
        self.monitor = Some(monitor);
        self
    }

    pub fn build(self) -> Result<Watcher> {
        if self.roots.is_empty() {
            return Err(WatcherError::NoRoots);
        }
        let roots = self
            .roots
            .iter()
            .map(|root| std::path::absolute(root).map_err(|e| WatcherError::from_io(root, e)))
            .collect::<Result<Vec<_>>>()?;

        let filter = PathFilter::new(
            PatternSet::compile(&self.matches)?,
            PatternSet::compile(&self.ignores)?,
        );
        let fs = self.fs.unwrap_or_else(|| Arc::new(RealFileSystem));

        let (monitor, raw_rx) = match (self.flags.monitor, self.monitor) {
            (false, _) => (None, None),
            (true, Some(custom)) => (Some(custom), None),
            (true, None) => {
                let (raw_tx, raw_rx) = mpsc::unbounded_channel();
                let notify: Box<dyn DirectoryMonitor> = Box::new(NotifyMonitor::new(raw_tx)?);
                (Some(notify), Some(raw_rx))
            }
        };

        let shared = Arc::new(Shared {
            roots,
            flags: self.flags,
            registry: MonitorRegistry::new(Arc::clone(&fs), monitor),
            fs,
            filter,
            bus: EventBus::new(),
            active: Mutex::new(None),
        });

        if let Some(raw_rx) = raw_rx {
            spawn_dispatch_thread(Arc::downgrade(&shared), raw_rx)?;
        }

        info!(roots = ?shared.roots, flags = ?shared.flags, "watcher created");
        Ok(Watcher { shared })
    }
}

/// Drain raw notifications on a dedicated thread. The loop ends once the
/// OS watcher (and with it the sending side) is gone.
fn spawn_dispatch_thread(
    shared: Weak<Shared>,
    mut raw_rx: mpsc::UnboundedReceiver<RawEvent>,
) -> Result<()> {
    std::thread::Builder::new()
        .name("dirwatcher-dispatch".to_string())
        .spawn(move || {
            while let Some(raw) = raw_rx.blocking_recv() {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.dispatcher().dispatch_raw(raw);
            }
            debug!("change dispatch loop finished");
        })
        .context("spawning change dispatch thread")?;
    Ok(())
}
