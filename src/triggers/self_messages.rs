use regex::Regex;
use std::collections::BTreeSet;

use crate::error::MalformedRuleError;
use crate::types::{AdditionalMessage, GameEndMessage};

/// Placeholder in the anti-gg template replaced by our own messages
pub const ANTI_GG_PLACEHOLDER: &str = "${antigg_strings}";

/// Every message body this crate can send itself, deduplicated
pub fn all_self_messages() -> BTreeSet<String> {
    GameEndMessage::ALL
        .iter()
        .map(|m| m.message())
        .chain(AdditionalMessage::ALL.iter().map(|m| m.message()))
        .map(str::to_string)
        .collect()
}

/// Substitute unescaped placeholders in `template` with an alternation of `self_messages`.
///
/// A placeholder preceded by a backslash stays as written. Messages are escaped so
/// they only ever match literally.
pub fn build_anti_gg_pattern<I, S>(template: &str, self_messages: I) -> Result<Regex, MalformedRuleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let alternation = self_messages
        .into_iter()
        .map(|m| regex::escape(m.as_ref()))
        .collect::<Vec<_>>()
        .join("|");

    let source = substitute_placeholder(template, &alternation);
    Regex::new(&source).map_err(MalformedRuleError::InvalidAntiGgTemplate)
}

fn substitute_placeholder(template: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(template.len() + replacement.len());
    let mut rest = template;

    while let Some(pos) = rest.find(ANTI_GG_PLACEHOLDER) {
        let escaped = rest[..pos].ends_with('\\');
        result.push_str(&rest[..pos]);
        if escaped {
            result.push_str(ANTI_GG_PLACEHOLDER);
        } else {
            result.push_str(replacement);
        }
        rest = &rest[pos + ANTI_GG_PLACEHOLDER.len()..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contains_both_message_kinds() {
        let messages = all_self_messages();
        assert!(messages.contains("GG"));
        assert!(messages.contains("<3"));
        assert_eq!(
            messages.len(),
            GameEndMessage::ALL.len() + AdditionalMessage::ALL.len()
        );
    }

    #[test]
    fn test_unescaped_placeholder_is_substituted() {
        let pattern = build_anti_gg_pattern("^(gg|${antigg_strings})$", ["GG!", "<3"]).unwrap();
        assert!(pattern.is_match("GG!"));
        assert!(pattern.is_match("<3"));
        assert!(pattern.is_match("gg"));
        assert!(!pattern.is_match("random chat"));
    }

    #[test]
    fn test_escaped_placeholder_is_left_alone() {
        let source = substitute_placeholder(r"a\${antigg_strings}|${antigg_strings}", "X|Y");
        assert_eq!(source, r"a\${antigg_strings}|X|Y");
    }

    #[test]
    fn test_messages_match_literally() {
        let pattern = build_anti_gg_pattern("^(${antigg_strings})$", ["Good Round! :D", "a.b"]).unwrap();
        assert!(pattern.is_match("Good Round! :D"));
        assert!(pattern.is_match("a.b"));
        assert!(!pattern.is_match("axb"));
    }

    #[test]
    fn test_invalid_result_is_malformed() {
        let result = build_anti_gg_pattern("^(${antigg_strings}", ["GG"]);
        assert!(matches!(result, Err(MalformedRuleError::InvalidAntiGgTemplate(_))));
    }
}
