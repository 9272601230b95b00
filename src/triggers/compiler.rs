// src/triggers/compiler.rs - Turns the fetched trigger document into a CompiledRuleSet

use log::debug;
use regex::Regex;
use serde_json::{Map, Value};

use super::reformat::{reformat_template, unescape_doubled};
use super::self_messages::{all_self_messages, build_anti_gg_pattern};
use super::{CompiledRuleSet, ServerRules};
use crate::error::MalformedRuleError;

/// Compile the `servers` object of a trigger document.
///
/// All or nothing: the first problem aborts the whole compile.
pub fn compile(servers: &Map<String, Value>) -> Result<CompiledRuleSet, MalformedRuleError> {
    compile_with_messages(servers, &all_self_messages())
}

/// Compile with an explicit set of self messages for the anti-gg placeholder
pub fn compile_with_messages<I, S>(
    servers: &Map<String, Value>,
    self_messages: I,
) -> Result<CompiledRuleSet, MalformedRuleError>
where
    I: IntoIterator<Item = S> + Clone,
    S: AsRef<str>,
{
    let mut compiled = Vec::with_capacity(servers.len());

    for (raw_key, entry) in servers {
        compiled.push(compile_server(raw_key, entry, self_messages.clone())?);
    }

    debug!("Compiled trigger rules for {} server keys", compiled.len());
    Ok(CompiledRuleSet::new(compiled))
}

fn compile_server<I, S>(raw_key: &str, entry: &Value, self_messages: I) -> Result<ServerRules, MalformedRuleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ctx = EntryContext { server: raw_key };
    let entry = ctx.as_object(entry, "<entry>")?;

    let key = ctx.pattern(&unescape_doubled(raw_key), "<server key>")?;

    let gg_triggers = ctx.object(entry, "gg_triggers")?;
    let normal = ctx.trigger_list(gg_triggers, "gg_triggers.triggers", "triggers")?;
    let casual = ctx.trigger_list(gg_triggers, "gg_triggers.casual_triggers", "casual_triggers")?;

    let other_patterns = ctx.object(entry, "other_patterns")?;
    let anti_gg_template = reformat_template(ctx.string(other_patterns, "other_patterns.antigg", "antigg")?)?;
    let anti_gg = build_anti_gg_pattern(&anti_gg_template, self_messages)?;

    let anti_karma_source =
        reformat_template(ctx.string(other_patterns, "other_patterns.anti_karma", "anti_karma")?)?;
    let anti_karma = ctx.pattern(&anti_karma_source, "other_patterns.anti_karma")?;

    let other = ctx.object(entry, "other")?;
    let message_prefix = ctx.string(other, "other.msg", "msg")?.to_string();

    Ok(ServerRules {
        key,
        normal,
        casual,
        anti_gg,
        anti_karma,
        message_prefix,
    })
}

/// Field lookups that report which server entry they failed in
struct EntryContext<'a> {
    server: &'a str,
}

impl<'a> EntryContext<'a> {
    fn missing(&self, field: &str) -> MalformedRuleError {
        MalformedRuleError::MissingField {
            server: self.server.to_string(),
            field: field.to_string(),
        }
    }

    fn wrong_type(&self, field: &str, expected: &'static str) -> MalformedRuleError {
        MalformedRuleError::WrongType {
            server: self.server.to_string(),
            field: field.to_string(),
            expected,
        }
    }

    fn as_object<'v>(&self, value: &'v Value, field: &str) -> Result<&'v Map<String, Value>, MalformedRuleError> {
        value.as_object().ok_or_else(|| self.wrong_type(field, "an object"))
    }

    fn object<'v>(&self, parent: &'v Map<String, Value>, field: &str) -> Result<&'v Map<String, Value>, MalformedRuleError> {
        let value = parent.get(field).ok_or_else(|| self.missing(field))?;
        self.as_object(value, field)
    }

    fn string<'v>(
        &self,
        parent: &'v Map<String, Value>,
        path: &str,
        field: &str,
    ) -> Result<&'v str, MalformedRuleError> {
        parent
            .get(field)
            .ok_or_else(|| self.missing(path))?
            .as_str()
            .ok_or_else(|| self.wrong_type(path, "a string"))
    }

    fn trigger_list(
        &self,
        parent: &Map<String, Value>,
        path: &str,
        field: &str,
    ) -> Result<Vec<Regex>, MalformedRuleError> {
        let items = parent
            .get(field)
            .ok_or_else(|| self.missing(path))?
            .as_array()
            .ok_or_else(|| self.wrong_type(path, "an array of strings"))?;

        items
            .iter()
            .map(|item| {
                let raw = item.as_str().ok_or_else(|| self.wrong_type(path, "an array of strings"))?;
                self.pattern(&unescape_doubled(raw), path)
            })
            .collect()
    }

    fn pattern(&self, source: &str, field: &str) -> Result<Regex, MalformedRuleError> {
        Regex::new(source).map_err(|source| MalformedRuleError::InvalidPattern {
            server: self.server.to_string(),
            field: field.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, MatchMode};
    use serde_json::json;

    fn servers(doc: Value) -> Map<String, Value> {
        doc.as_object().unwrap().clone()
    }

    fn hypixel_entry() -> Value {
        json!({
            "gg_triggers": {
                "triggers": ["\\bgg\\b", "^ +1st Killer - "],
                "casual_triggers": ["^The event is over"]
            },
            "other_patterns": {
                "antigg": "/^(gg|${antigg_strings})$/",
                "anti_karma": "/^\\\\+\\\\d+ Karma!$/"
            },
            "other": { "msg": "/ac " }
        })
    }

    #[test]
    fn test_compiles_complete_entry() {
        let doc = servers(json!({ "^hypixel$": hypixel_entry() }));
        let set = compile_with_messages(&doc, ["GG!", "<3"]).unwrap();

        assert_eq!(set.len(), 1);
        let rules = &set.servers()[0];
        assert_eq!(rules.key_source(), "^hypixel$");
        assert_eq!(rules.normal.len(), 2);
        assert_eq!(rules.casual.len(), 1);
        assert_eq!(rules.anti_karma.as_str(), r"^\+\d+ Karma!$");
        assert_eq!(rules.message_prefix, "/ac ");
    }

    #[test]
    fn test_end_to_end_hypixel_document() {
        let doc = servers(json!({
            "^hypixel$": {
                "gg_triggers": { "triggers": ["\\bgg\\b"], "casual_triggers": [] },
                "other_patterns": {
                    "antigg": "/^(gg|${antigg_strings})$/",
                    "anti_karma": "/^\\+\\d+ Karma!$/"
                },
                "other": { "msg": "" }
            }
        }));
        let set = compile_with_messages(&doc, ["GG!", "<3"]).unwrap();

        assert!(set.classify("hypixel", "gg wp", MatchMode::Normal).is_triggered());
        assert!(set.should_suppress_gg("hypixel", "GG!"));
        assert!(!set.should_suppress_gg("hypixel", "random chat"));
        assert_eq!(set.classify("mineplex", "gg wp", MatchMode::Normal), Classification::NoServerRules);
    }

    #[test]
    fn test_doubled_escapes_in_keys_and_triggers() {
        let doc = servers(json!({ "mc\\\\.hypixel\\\\.net": hypixel_entry() }));
        let set = compile(&doc).unwrap();

        assert_eq!(set.servers()[0].key_source(), r"mc\.hypixel\.net");
        assert!(set.resolve("mc.hypixel.net").is_some());
        assert!(set.resolve("mcXhypixelXnet").is_none());
    }

    #[test]
    fn test_document_order_is_preserved() {
        let doc = servers(json!({
            "zeta": hypixel_entry(),
            "alpha": hypixel_entry(),
            "mid": hypixel_entry()
        }));
        let set = compile(&doc).unwrap();
        assert_eq!(set.server_keys(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_missing_field_aborts_whole_compile() {
        let mut broken = hypixel_entry();
        broken["other"].as_object_mut().unwrap().remove("msg");
        let doc = servers(json!({ "good": hypixel_entry(), "bad": broken }));

        match compile(&doc) {
            Err(MalformedRuleError::MissingField { server, field }) => {
                assert_eq!(server, "bad");
                assert_eq!(field, "other.msg");
            }
            other => panic!("expected missing field, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        let mut broken = hypixel_entry();
        broken["gg_triggers"]["triggers"] = json!("not a list");
        assert!(matches!(
            compile(&servers(json!({ "x": broken }))),
            Err(MalformedRuleError::WrongType { .. })
        ));

        let mut broken = hypixel_entry();
        broken["gg_triggers"]["casual_triggers"] = json!([1, 2]);
        assert!(matches!(
            compile(&servers(json!({ "x": broken }))),
            Err(MalformedRuleError::WrongType { .. })
        ));

        assert!(matches!(
            compile(&servers(json!({ "x": [] }))),
            Err(MalformedRuleError::WrongType { .. })
        ));
    }

    #[test]
    fn test_invalid_regex_is_malformed() {
        let mut broken = hypixel_entry();
        broken["gg_triggers"]["triggers"] = json!(["(unclosed"]);
        assert!(matches!(
            compile(&servers(json!({ "x": broken }))),
            Err(MalformedRuleError::InvalidPattern { .. })
        ));

        assert!(matches!(
            compile(&servers(json!({ "[bad": hypixel_entry() }))),
            Err(MalformedRuleError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_short_anti_template_is_malformed() {
        let mut broken = hypixel_entry();
        broken["other_patterns"]["anti_karma"] = json!("/");
        assert!(matches!(
            compile(&servers(json!({ "x": broken }))),
            Err(MalformedRuleError::UnwrappableTemplate(_))
        ));
    }

    #[test]
    fn test_empty_servers_object_compiles_to_empty_set() {
        assert!(compile(&Map::new()).unwrap().is_empty());
    }
}
