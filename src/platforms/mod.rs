use anyhow::Result;
use async_trait::async_trait;

pub mod console;

/// Outgoing chat, used for the gg responses
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send a message to the game chat as the local player
    async fn send_chat(&self, message: &str) -> Result<()>;
}

/// Local, client-only notices (never sent to the server)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a message to the local player only
    async fn display_message(&self, message: &str);
}
