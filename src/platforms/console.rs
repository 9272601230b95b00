use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::platforms::{ChatSender, Notifier};

/// Terminal stand-in for a game client: chat and notices go to stdout
pub struct ConsoleConnection {
    stdout: Mutex<Stdout>,
}

impl ConsoleConnection {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}

impl Default for ConsoleConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatSender for ConsoleConnection {
    async fn send_chat(&self, message: &str) -> Result<()> {
        debug!("Sending chat message: {}", message);
        self.write_line(&format!("> {}", message))
            .await
            .context("Failed to write chat message to stdout")
    }
}

#[async_trait]
impl Notifier for ConsoleConnection {
    async fn display_message(&self, message: &str) {
        if let Err(e) = self.write_line(&format!("[AutoGG] {}", message)).await {
            warn!("Failed to display notice: {}", e);
        }
    }
}
