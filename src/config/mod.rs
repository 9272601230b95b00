// src/config/mod.rs - User settings with hot-reload support

use anyhow::{Context, Result};
use log::{debug, error, info};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Deserializer, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{timeout, Duration};

use crate::types::{AdditionalMessage, GameEndMessage};

pub const DEFAULT_SETTINGS_FILE: &str = "autogg.yaml";

/// Quiet period after the last file event before the settings are re-read
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(300);

/// User-facing AutoGG settings. Keys match the addon's config names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoGgSettings {
    pub enabled: bool,

    /// Also respond to casual (non-karma) events
    #[serde(rename = "casualGG")]
    pub casual_gg: bool,

    /// Hide gg messages of other players (and our own)
    #[serde(rename = "antigg")]
    pub anti_gg: bool,

    /// Hide karma messages
    #[serde(rename = "antikarma")]
    pub anti_karma: bool,

    /// Delay before the gg message, in milliseconds
    #[serde(rename = "messagedelay")]
    pub message_delay_ms: u64,

    #[serde(deserialize_with = "lenient_game_end_message")]
    pub message: GameEndMessage,

    #[serde(rename = "secondmessage")]
    pub second_message: bool,

    #[serde(rename = "secondmessagesettings")]
    pub second_message_settings: SecondMessageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondMessageSettings {
    /// Delay after the first message, in milliseconds
    #[serde(rename = "messagedelay")]
    pub message_delay_ms: u64,

    #[serde(deserialize_with = "lenient_additional_message")]
    pub message: AdditionalMessage,
}

impl Default for AutoGgSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            casual_gg: false,
            anti_gg: false,
            anti_karma: false,
            message_delay_ms: 1000,
            message: GameEndMessage::default(),
            second_message: false,
            second_message_settings: SecondMessageSettings::default(),
        }
    }
}

impl Default for SecondMessageSettings {
    fn default() -> Self {
        Self {
            message_delay_ms: 1000,
            message: AdditionalMessage::default(),
        }
    }
}

fn lenient_game_end_message<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GameEndMessage, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(GameEndMessage::from_config_name(&name))
}

fn lenient_additional_message<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AdditionalMessage, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(AdditionalMessage::from_config_name(&name))
}

/// Events broadcast when the settings file changes
#[derive(Debug, Clone)]
pub enum SettingsChangeEvent {
    Updated(AutoGgSettings),
    ReloadFailed { error: String },
}

/// Loads, saves and watches the settings file
#[derive(Clone)]
pub struct SettingsManager {
    path: PathBuf,
    settings: Arc<RwLock<AutoGgSettings>>,
    watcher: Arc<RwLock<Option<RecommendedWatcher>>>,
    change_notifier: broadcast::Sender<SettingsChangeEvent>,
}

impl SettingsManager {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let (tx, _) = broadcast::channel(16);

        Self {
            path: path.as_ref().to_path_buf(),
            settings: Arc::new(RwLock::new(AutoGgSettings::default())),
            watcher: Arc::new(RwLock::new(None)),
            change_notifier: tx,
        }
    }

    /// In-memory settings only; nothing is read, written or watched
    pub fn detached(settings: AutoGgSettings) -> Self {
        let manager = Self::new(PathBuf::new());
        if let Ok(mut guard) = manager.settings.try_write() {
            *guard = settings;
        }
        manager
    }

    /// Load the settings file (creating it with defaults) and start watching it
    pub async fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
                info!("Created settings directory: {}", parent.display());
            }
        }

        if self.path.exists() {
            let settings = Self::read_settings(&self.path).await?.unwrap_or_default();
            *self.settings.write().await = settings;
            info!("Loaded settings from {}", self.path.display());
        } else {
            let defaults = AutoGgSettings::default();
            self.save(defaults).await?;
            info!("Created default settings: {}", self.path.display());
        }

        self.setup_file_watcher().await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn current(&self) -> AutoGgSettings {
        self.settings.read().await.clone()
    }

    pub fn subscribe_to_changes(&self) -> broadcast::Receiver<SettingsChangeEvent> {
        self.change_notifier.subscribe()
    }

    /// Persist and apply new settings
    pub async fn save(&self, settings: AutoGgSettings) -> Result<()> {
        let content = serde_yaml::to_string(&settings)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;

        *self.settings.write().await = settings;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    /// Re-read the settings file and broadcast the result.
    ///
    /// An empty file is treated as a save in progress: the current settings stay.
    pub async fn reload(&self) -> Result<AutoGgSettings> {
        Self::apply_reload(&self.path, &self.settings, &self.change_notifier).await
    }

    /// `None` when the file has no content yet
    async fn read_settings(path: &Path) -> Result<Option<AutoGgSettings>> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_yaml::from_str(&content)
            .map(Some)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    async fn apply_reload(
        path: &Path,
        settings: &Arc<RwLock<AutoGgSettings>>,
        change_notifier: &broadcast::Sender<SettingsChangeEvent>,
    ) -> Result<AutoGgSettings> {
        match Self::read_settings(path).await {
            Ok(None) => {
                debug!("Settings file {} is empty, keeping current settings", path.display());
                Ok(settings.read().await.clone())
            }
            Ok(Some(loaded)) => {
                *settings.write().await = loaded.clone();
                let _ = change_notifier.send(SettingsChangeEvent::Updated(loaded.clone()));
                debug!("Reloaded settings from {}", path.display());
                Ok(loaded)
            }
            Err(e) => {
                let _ = change_notifier.send(SettingsChangeEvent::ReloadFailed { error: e.to_string() });
                Err(e)
            }
        }
    }

    async fn setup_file_watcher(&self) -> Result<()> {
        let watch_dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let (tx, mut rx) = tokio::sync::mpsc::channel(32);

        let mut watcher = notify::recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res {
                if let Err(e) = tx.blocking_send(event) {
                    error!("Failed to forward settings file event: {}", e);
                }
            }
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        *self.watcher.write().await = Some(watcher);

        let path = self.path.clone();
        let settings = self.settings.clone();
        let change_notifier = self.change_notifier.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if !is_settings_event(&event, &file_name) {
                    continue;
                }

                // Editors often emit several events per save; reload once they stop
                while let Ok(Some(_)) = timeout(RELOAD_DEBOUNCE, rx.recv()).await {}

                info!("Settings file changed, reloading...");
                if let Err(e) = Self::apply_reload(&path, &settings, &change_notifier).await {
                    error!("Failed to reload settings: {}", e);
                }
            }

            debug!("Settings watcher stopped");
        });

        info!("Watching {} for changes", self.path.display());
        Ok(())
    }
}

fn is_settings_event(event: &Event, file_name: &Option<OsString>) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name().map(|n| n.to_os_string()) == *file_name)
}
