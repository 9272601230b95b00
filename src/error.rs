//! Error types for trigger fetching, compilation and refresh

/// Failure to obtain the trigger document
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, TLS or body transfer failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Connect or read took longer than configured
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Server answered with a non-success status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Body was not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Document has no `servers` object at the top level
    #[error("document has no 'servers' object")]
    MissingServers,
}

/// The document was fetched but cannot be turned into a rule set
#[derive(Debug, thiserror::Error)]
pub enum MalformedRuleError {
    #[error("server '{server}': missing field '{field}'")]
    MissingField { server: String, field: String },

    #[error("server '{server}': field '{field}' should be {expected}")]
    WrongType {
        server: String,
        field: String,
        expected: &'static str,
    },

    #[error("server '{server}': invalid pattern in '{field}': {source}")]
    InvalidPattern {
        server: String,
        field: String,
        #[source]
        source: regex::Error,
    },

    /// Template too short to carry its wrapper characters
    #[error("template '{0}' is too short to strip its wrapper")]
    UnwrappableTemplate(String),

    #[error("anti-gg template does not compile: {0}")]
    InvalidAntiGgTemplate(#[source] regex::Error),
}

/// Why a refresh left the previous rule set in place
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("malformed rules: {0}")]
    Malformed(#[from] MalformedRuleError),
}
