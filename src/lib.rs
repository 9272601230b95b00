//! # AutoGG
//!
//! Detects end-of-game announcements in game chat and answers them with "gg",
//! using per-server regex trigger rules downloaded from a shared trigger document.
//!
//! ## Features
//!
//! - **Remote Trigger Rules**: Server-specific gg, casual, anti-gg and anti-karma patterns
//! - **Safe Refresh**: Rules compile all-or-nothing and swap in atomically
//! - **Chat Handling**: Delayed gg responses, optional second message, hidden gg/karma spam
//! - **Hot-Reload Settings**: YAML settings file watched for changes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autogg::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = SettingsManager::new("config/autogg.yaml");
//!     settings.initialize().await?;
//!
//!     let fetcher = Arc::new(HttpRuleFetcher::new(FetcherConfig::from_env())?);
//!     let console = Arc::new(ConsoleConnection::new());
//!     let autogg = AutoGg::start(fetcher, settings, console.clone(), console);
//!
//!     autogg.join_server("mc.hypixel.net").await;
//!     let action = autogg.handle_chat("1st Killer - Steve").await;
//!     println!("{:?}", action);
//!
//!     autogg.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod platforms;
pub mod triggers;
pub mod types;

// Re-export commonly used items
pub mod prelude {
    pub use crate::bot::{handler::ChatHandler, AutoGg};
    pub use crate::config::{AutoGgSettings, SettingsChangeEvent, SettingsManager};
    pub use crate::error::{FetchError, MalformedRuleError, RefreshError};
    pub use crate::platforms::{console::ConsoleConnection, ChatSender, Notifier};
    pub use crate::triggers::{
        CompiledRuleSet, FetcherConfig, HttpRuleFetcher, RefreshReport, RefreshState, RuleSource, RuleStore,
        ServerRules,
    };
    pub use crate::types::{AdditionalMessage, Classification, GameEndMessage, LineAction, MatchMode};
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
