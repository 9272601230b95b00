// src/bot/worker.rs - Background task that runs trigger refreshes one at a time

use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::RefreshError;
use crate::platforms::Notifier;
use crate::triggers::{RefreshReport, RuleStore};

/// Shown to the player when the trigger document could not be fetched
pub const FETCH_ERROR_NOTICE: &str = "Error while fetching AutoGG data.";

/// Shown to the player when the fetched document could not be compiled
pub const MALFORMED_RULES_NOTICE: &str = "AutoGG data is invalid, keeping the previous triggers.";

/// Pending requests beyond the one running; extras are coalesced
const QUEUE_CAPACITY: usize = 1;

pub type RefreshResult = Result<RefreshReport, RefreshError>;

struct RefreshRequest {
    respond_to: Option<oneshot::Sender<RefreshResult>>,
}

/// Submits refreshes to the worker without waiting on the network
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<RefreshRequest>,
}

impl RefreshHandle {
    /// Queue a refresh and return immediately.
    ///
    /// Returns `false` when one is already queued or the worker has stopped.
    pub fn request_refresh(&self) -> bool {
        match self.tx.try_send(RefreshRequest { respond_to: None }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Refresh already queued, skipping request");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Refresh worker is not running");
                false
            }
        }
    }

    /// Queue a refresh and wait for its outcome. `None` if the worker has stopped.
    pub async fn refresh_and_wait(&self) -> Option<RefreshResult> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(RefreshRequest {
                respond_to: Some(respond_to),
            })
            .await
            .ok()?;
        response.await.ok()
    }
}

/// The single background worker that owns all refresh execution
pub struct RefreshWorker;

impl RefreshWorker {
    /// Spawn the worker. It stops once every [`RefreshHandle`] is dropped.
    pub fn spawn(store: Arc<RuleStore>, notifier: Arc<dyn Notifier>) -> (RefreshHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<RefreshRequest>(QUEUE_CAPACITY);

        let handle = tokio::spawn(async move {
            info!("Trigger refresh worker started");

            while let Some(request) = rx.recv().await {
                let result = store.refresh().await;

                if let Err(e) = &result {
                    error!("Trigger refresh failed: {}", e);
                    let notice = match e {
                        RefreshError::Fetch(_) => FETCH_ERROR_NOTICE,
                        RefreshError::Malformed(_) => MALFORMED_RULES_NOTICE,
                    };
                    notifier.display_message(notice).await;
                }

                if let Some(respond_to) = request.respond_to {
                    let _ = respond_to.send(result);
                }
            }

            info!("Trigger refresh worker stopped");
        });

        (RefreshHandle { tx }, handle)
    }
}
