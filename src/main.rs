use anyhow::Result;
use log::{error, info, warn};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use autogg::config::DEFAULT_SETTINGS_FILE;
use autogg::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("Starting AutoGG v{}", autogg::VERSION);

    // =================================================================
    // SETTINGS
    // =================================================================

    let settings_path = env::var("AUTOGG_SETTINGS").unwrap_or_else(|_| format!("config/{}", DEFAULT_SETTINGS_FILE));
    let settings = SettingsManager::new(&settings_path);

    if let Err(e) = settings.initialize().await {
        error!("Failed to initialize settings: {}", e);
        return Err(e);
    }

    let mut settings_changes = settings.subscribe_to_changes();
    tokio::spawn(async move {
        while let Ok(event) = settings_changes.recv().await {
            match event {
                SettingsChangeEvent::Updated(s) => info!(
                    "Settings updated (enabled: {}, casual: {}, antigg: {}, antikarma: {})",
                    s.enabled, s.casual_gg, s.anti_gg, s.anti_karma
                ),
                SettingsChangeEvent::ReloadFailed { error } => warn!("Settings reload failed: {}", error),
            }
        }
    });

    // =================================================================
    // TRIGGER ENGINE
    // =================================================================

    let fetcher = Arc::new(HttpRuleFetcher::new(FetcherConfig::from_env())?);
    let console = Arc::new(ConsoleConnection::new());
    let autogg = AutoGg::start(fetcher, settings, console.clone(), console);

    let server = env::var("AUTOGG_SERVER").unwrap_or_else(|_| "mc.hypixel.net".to_string());

    // Wait for the initial download so the server lookup sees real rules
    match autogg.refresh_now().await {
        Some(Ok(report)) => info!("Initial trigger rules loaded ({} server keys)", report.server_count),
        Some(Err(e)) => warn!("Starting without trigger rules: {}", e),
        None => warn!("Refresh worker unavailable"),
    }
    autogg.join_server(&server).await;

    // =================================================================
    // CHAT LOOP
    // =================================================================

    info!("Reading chat lines from stdin (/refresh, /server <host>, /leave, /status; Ctrl-C to exit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim_end();
                        if line == "/refresh" {
                            if !autogg.request_refresh() {
                                info!("A refresh is already queued");
                            }
                            continue;
                        }
                        if let Some(next) = line.strip_prefix("/server ") {
                            autogg.join_server(next.trim()).await;
                            continue;
                        }
                        if line == "/leave" {
                            autogg.leave_server().await;
                            info!("Left server");
                            continue;
                        }
                        if line == "/status" {
                            let settings = autogg.settings().current().await;
                            info!(
                                "Server: {}, server keys: {}, refresh: {:?}, enabled: {}",
                                autogg.current_server().await.as_deref().unwrap_or("none"),
                                autogg.rules().len(),
                                autogg.refresh_state(),
                                settings.enabled
                            );
                            continue;
                        }
                        match autogg.handle_chat(line).await {
                            LineAction::Show => println!("{}", line),
                            LineAction::Hide => println!("[hidden] {}", line),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read chat input: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    autogg.shutdown().await;
    Ok(())
}
