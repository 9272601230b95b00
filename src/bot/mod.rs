use log::{info, warn};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use crate::config::SettingsManager;
use crate::error::RefreshError;
use crate::platforms::{ChatSender, Notifier};
use crate::triggers::{CompiledRuleSet, RefreshReport, RefreshState, RuleSource, RuleStore};
use crate::types::LineAction;

pub mod handler;
pub mod worker;

use handler::ChatHandler;
use worker::{RefreshHandle, RefreshWorker};

/// How long shutdown waits for an in-flight refresh before abandoning it
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The AutoGG engine: rule store, refresh worker, settings and chat handling
pub struct AutoGg {
    store: Arc<RuleStore>,
    settings: SettingsManager,
    handler: ChatHandler,
    refresh: RefreshHandle,
    worker: JoinHandle<()>,
    server: RwLock<Option<String>>,
}

impl AutoGg {
    /// Start the refresh worker and queue the initial trigger download
    pub fn start(
        source: Arc<dyn RuleSource>,
        settings: SettingsManager,
        sender: Arc<dyn ChatSender>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = Arc::new(RuleStore::new(source));
        let (refresh, worker) = RefreshWorker::spawn(store.clone(), notifier);
        let handler = ChatHandler::new(store.clone(), settings.clone(), sender);

        refresh.request_refresh();
        info!("AutoGG started");

        Self {
            store,
            settings,
            handler,
            refresh,
            worker,
            server: RwLock::new(None),
        }
    }

    /// Manual "refresh cache" action; returns immediately
    pub fn request_refresh(&self) -> bool {
        self.refresh.request_refresh()
    }

    /// Refresh through the worker and wait for the result
    pub async fn refresh_now(&self) -> Option<Result<RefreshReport, RefreshError>> {
        self.refresh.refresh_and_wait().await
    }

    pub fn rules(&self) -> Arc<CompiledRuleSet> {
        self.store.current()
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.store.state()
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    /// Record the server the player is now on
    pub async fn join_server(&self, server_context: &str) {
        let rules = self.store.current();
        let matching = rules.resolve_all(server_context);

        match matching.as_slice() {
            [] => info!("No trigger rules for server '{}'", server_context),
            [only] => info!("Using trigger rules '{}' for '{}'", only.key_source(), server_context),
            [first, ..] => warn!(
                "Server keys overlap for '{}': {:?}; using '{}'",
                server_context,
                matching.iter().map(|s| s.key_source()).collect::<Vec<_>>(),
                first.key_source()
            ),
        }

        *self.server.write().await = Some(server_context.to_string());
    }

    pub async fn leave_server(&self) {
        *self.server.write().await = None;
    }

    pub async fn current_server(&self) -> Option<String> {
        self.server.read().await.clone()
    }

    /// Handle a chat line on the current server
    pub async fn handle_chat(&self, line: &str) -> LineAction {
        let server = self.server.read().await.clone();
        match server {
            Some(server) => self.handler.handle_line(&server, line).await,
            None => LineAction::Show,
        }
    }

    /// Stop the worker, letting an in-flight refresh finish within a short grace period
    pub async fn shutdown(self) {
        let AutoGg { handler, refresh, worker, .. } = self;
        drop(refresh);

        handler.flush().await;

        let abort = worker.abort_handle();
        if timeout(SHUTDOWN_GRACE, worker).await.is_err() {
            warn!("Abandoning in-flight trigger refresh");
            abort.abort();
        }
        info!("AutoGG stopped");
    }
}
