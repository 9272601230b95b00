use log::debug;
use regex::Regex;

use super::{CompiledRuleSet, ServerRules};
use crate::types::{Classification, MatchMode};

impl CompiledRuleSet {
    /// First server (document order) whose key matches `server_context`
    pub fn resolve(&self, server_context: &str) -> Option<&ServerRules> {
        self.servers().iter().find(|s| s.key.is_match(server_context))
    }

    /// All servers whose key matches `server_context`. More than one means overlapping keys.
    pub fn resolve_all(&self, server_context: &str) -> Vec<&ServerRules> {
        self.servers()
            .iter()
            .filter(|s| s.key.is_match(server_context))
            .collect()
    }

    /// Decide whether `line` announces the end of a game on `server_context`
    pub fn classify(&self, server_context: &str, line: &str, mode: MatchMode) -> Classification {
        let Some(server) = self.resolve(server_context) else {
            return Classification::NoServerRules;
        };

        let triggered = any_match(&server.normal, line)
            || (mode.includes_casual() && any_match(&server.casual, line));

        if triggered {
            debug!("Line '{}' triggered on server key '{}'", line, server.key_source());
            Classification::Triggered {
                message_prefix: server.message_prefix.clone(),
            }
        } else {
            Classification::NotTriggered
        }
    }

    /// Whether `line` is a gg message that should be hidden
    pub fn should_suppress_gg(&self, server_context: &str, line: &str) -> bool {
        self.resolve(server_context)
            .map(|s| s.anti_gg.is_match(line))
            .unwrap_or(false)
    }

    /// Whether `line` is a karma message that should be hidden
    pub fn should_suppress_karma(&self, server_context: &str, line: &str) -> bool {
        self.resolve(server_context)
            .map(|s| s.anti_karma.is_match(line))
            .unwrap_or(false)
    }
}

fn any_match(patterns: &[Regex], line: &str) -> bool {
    patterns.iter().any(|p| p.is_match(line))
}
