use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::config::{AutoGgSettings, SettingsManager};
use crate::platforms::ChatSender;
use crate::triggers::RuleStore;
use crate::types::{Classification, LineAction, MatchMode};

/// Decides, per incoming chat line, whether to hide it and whether to say gg
pub struct ChatHandler {
    store: Arc<RuleStore>,
    settings: SettingsManager,
    sender: Arc<dyn ChatSender>,
    response_pending: Arc<AtomicBool>,
    response_task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatHandler {
    pub fn new(store: Arc<RuleStore>, settings: SettingsManager, sender: Arc<dyn ChatSender>) -> Self {
        Self {
            store,
            settings,
            sender,
            response_pending: Arc::new(AtomicBool::new(false)),
            response_task: Mutex::new(None),
        }
    }

    /// Handle one chat line received while on `server_context`
    pub async fn handle_line(&self, server_context: &str, line: &str) -> LineAction {
        let settings = self.settings.current().await;
        if !settings.enabled {
            return LineAction::Show;
        }

        let rules = self.store.current();

        let hide = (settings.anti_gg && rules.should_suppress_gg(server_context, line))
            || (settings.anti_karma && rules.should_suppress_karma(server_context, line));

        let mode = MatchMode::from_casual_flag(settings.casual_gg);
        if let Classification::Triggered { message_prefix } = rules.classify(server_context, line, mode) {
            self.schedule_response(message_prefix, &settings).await;
        }

        if hide {
            debug!("Hiding line: {}", line);
            LineAction::Hide
        } else {
            LineAction::Show
        }
    }

    /// Whether a gg response is waiting to be sent
    pub fn is_response_pending(&self) -> bool {
        self.response_pending.load(Ordering::SeqCst)
    }

    /// Wait for a scheduled response, if any, to finish sending
    pub async fn flush(&self) {
        let task = self.response_task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("GG response task failed: {}", e);
            }
        }
    }

    async fn schedule_response(&self, prefix: String, settings: &AutoGgSettings) {
        // One response per game end, even if several trigger lines arrive
        if self.response_pending.swap(true, Ordering::SeqCst) {
            debug!("GG response already pending, ignoring trigger");
            return;
        }

        let mut messages = vec![(
            Duration::from_millis(settings.message_delay_ms),
            format!("{}{}", prefix, settings.message.message()),
        )];
        if settings.second_message {
            messages.push((
                Duration::from_millis(settings.second_message_settings.message_delay_ms),
                format!("{}{}", prefix, settings.second_message_settings.message.message()),
            ));
        }

        let sender = self.sender.clone();
        let pending = self.response_pending.clone();

        let task = tokio::spawn(async move {
            for (delay, message) in messages {
                sleep(delay).await;
                match sender.send_chat(&message).await {
                    Ok(()) => info!("Sent '{}'", message),
                    Err(e) => {
                        warn!("Failed to send '{}': {}", message, e);
                        break;
                    }
                }
            }
            pending.store(false, Ordering::SeqCst);
        });

        *self.response_task.lock().await = Some(task);
    }
}
