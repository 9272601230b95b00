//! Server-specific trigger rules: fetching, compiling, storing and matching.
//!
//! A rule document maps server-key patterns to gg triggers, anti patterns and a
//! message prefix. [`compiler::compile`] turns it into an immutable
//! [`CompiledRuleSet`], which [`store::RuleStore`] swaps in atomically.

use regex::Regex;

pub mod compiler;
pub mod fetcher;
pub mod matcher;
pub mod reformat;
pub mod self_messages;
pub mod store;

pub use compiler::compile;
pub use fetcher::{FetcherConfig, HttpRuleFetcher, RuleSource};
pub use store::{RefreshReport, RefreshState, RuleStore};

/// Every compiled pattern that applies to one server key
#[derive(Debug, Clone)]
pub struct ServerRules {
    /// Matched against the server context to select these rules
    pub key: Regex,
    pub normal: Vec<Regex>,
    pub casual: Vec<Regex>,
    pub anti_gg: Regex,
    pub anti_karma: Regex,
    /// Prepended to outgoing messages on this server
    pub message_prefix: String,
}

impl ServerRules {
    /// Raw source of the server key
    pub fn key_source(&self) -> &str {
        self.key.as_str()
    }
}

/// Immutable snapshot of all server rules, in document order
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    servers: Vec<ServerRules>,
}

impl CompiledRuleSet {
    pub fn new(servers: Vec<ServerRules>) -> Self {
        Self { servers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn servers(&self) -> &[ServerRules] {
        &self.servers
    }

    /// Source strings of all server keys, in document order
    pub fn server_keys(&self) -> Vec<&str> {
        self.servers.iter().map(ServerRules::key_source).collect()
    }
}
