// src/watch/mod.rs

//! Directory scanning and change monitoring.
//!
//! This module is responsible for:
//! - Compiling the match / ignore regular expressions.
//! - Walking the roots and reporting every interesting entry.
//! - Keeping one change monitor per scanned directory (`notify`).
//! - Turning raw change notifications into [`UpdateEvent`]s.
//!
//! [`Watcher`] ties all of it together and is the only type most callers
//! need.

pub mod dispatcher;
pub mod event;
pub mod filter;
pub mod monitor;
pub mod patterns;
pub mod registry;
pub mod scanner;
pub mod watcher;

pub use event::{EventBus, Listener, SubscriptionId, UpdateEvent};
pub use monitor::{DirectoryMonitor, NotifyMonitor};
pub use patterns::PatternSet;
pub use scanner::ScanSummary;
pub use watcher::{NO_PATTERNS, ScanHandle, Watcher, WatcherBuilder};
