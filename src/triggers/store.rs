// src/triggers/store.rs - Active rule set with serialized, all-or-nothing refreshes

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::compiler::compile;
use super::fetcher::RuleSource;
use super::CompiledRuleSet;
use crate::error::RefreshError;

/// Whether a refresh is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Summary of a successful refresh
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub server_count: usize,
    pub completed_at: DateTime<Utc>,
}

/// Holds the active [`CompiledRuleSet`] and replaces it on successful refreshes.
///
/// Readers never block: [`RuleStore::current`] is a single atomic load. Refreshes
/// are serialized; a second caller waits for the running one to finish.
pub struct RuleStore {
    current: ArcSwap<CompiledRuleSet>,
    source: Arc<dyn RuleSource>,
    refresh_lock: Mutex<()>,
    refreshing: AtomicBool,
}

impl RuleStore {
    /// Create a store with no rules loaded yet
    pub fn new(source: Arc<dyn RuleSource>) -> Self {
        Self {
            current: ArcSwap::from_pointee(CompiledRuleSet::empty()),
            source,
            refresh_lock: Mutex::new(()),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Snapshot of the active rule set
    pub fn current(&self) -> Arc<CompiledRuleSet> {
        self.current.load_full()
    }

    pub fn state(&self) -> RefreshState {
        if self.refreshing.load(Ordering::SeqCst) {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// Fetch and compile a new rule set, swapping it in only if both succeed
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let _permit = self.refresh_lock.lock().await;
        let _refreshing = RefreshingFlag::raise(&self.refreshing);

        debug!("Refreshing trigger rules");

        let servers = self.source.fetch_document().await?;
        let compiled = match compile(&servers) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!("Discarding trigger document: {}", e);
                return Err(e.into());
            }
        };

        let report = RefreshReport {
            server_count: compiled.len(),
            completed_at: Utc::now(),
        };
        self.current.store(Arc::new(compiled));

        info!("Loaded trigger rules for {} server keys", report.server_count);
        Ok(report)
    }
}

/// Marks the store as refreshing until dropped, including when the refresh future is abandoned
struct RefreshingFlag<'a>(&'a AtomicBool);

impl<'a> RefreshingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
