#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use autogg::error::FetchError;
use autogg::platforms::{ChatSender, Notifier};
use autogg::triggers::RuleSource;

/// Rule source that replays queued documents; an exhausted queue times out
pub struct QueuedSource {
    responses: Mutex<VecDeque<Result<Value, FetchError>>>,
    pub calls: AtomicUsize,
}

impl QueuedSource {
    pub fn new(responses: Vec<Result<Value, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuleSource for QueuedSource {
    async fn fetch_document(&self) -> Result<Map<String, Value>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(Value::Object(servers))) => Ok(servers),
            Some(Ok(_)) => Err(FetchError::MissingServers),
            Some(Err(e)) => Err(e),
            None => Err(FetchError::Timeout(20_000)),
        }
    }
}

/// Records everything sent to chat and every local notice
#[derive(Default)]
pub struct RecordingConnection {
    pub sent: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<String>>,
}

impl RecordingConnection {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSender for RecordingConnection {
    async fn send_chat(&self, message: &str) -> Result<()> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingConnection {
    async fn display_message(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

/// A trigger rule entry shaped like the public document
pub fn hypixel_entry() -> Value {
    json!({
        "gg_triggers": {
            "triggers": ["^ +1st Killer - ", "^ +Winner: "],
            "casual_triggers": ["^The Mythological event is over"]
        },
        "other_patterns": {
            "antigg": "/^(?:\\\\[[A-Z+]+\\\\] )?\\\\w{1,16}: (?:gg|${antigg_strings})$/",
            "anti_karma": "/^\\\\+\\\\d+ Karma!$/"
        },
        "other": { "msg": "/ac " }
    })
}

pub fn hypixel_document() -> Value {
    json!({ "^mc\\\\.hypixel\\\\.net$": hypixel_entry() })
}
