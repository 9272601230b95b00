use crate::error::MalformedRuleError;

/// Collapse doubled backslashes (`\\` -> `\`), left to right, non-overlapping.
pub fn unescape_doubled(raw: &str) -> String {
    raw.replace("\\\\", "\\")
}

/// Strip the one-character wrapper from both ends of a template and unescape it.
///
/// The trigger document wraps anti patterns in delimiters, e.g. `/^gg$/`.
pub fn reformat_template(raw: &str) -> Result<String, MalformedRuleError> {
    let mut chars = raw.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return Err(MalformedRuleError::UnwrappableTemplate(raw.to_string()));
    }
    Ok(unescape_doubled(chars.as_str()))
}
