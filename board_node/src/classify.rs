//! Classification of write-client errors.
//!
//! Testnet writes fail in two recoverable ways: the RPC provider throttles
//! us, or the transaction is broadcast but its receipt is not found before
//! the client gives up. Both are told apart from hard failures by looking
//! only at the error's code and message.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::store::WriteError;

/// Provider-specific JSON-RPC code for "over rate limit".
pub const RPC_RATE_LIMIT_CODE: i64 = -32016;
pub const HTTP_TOO_MANY_REQUESTS: i64 = 429;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please wait a moment and try again.";
pub const PENDING_MESSAGE: &str =
    "Transaction submitted but confirmation pending. Please wait a moment and refresh.";

const RATE_LIMIT_PHRASES: &[&str] = &["rate limit", "over rate limit", "too many requests"];
const PENDING_PHRASES: &[&str] = &[
    "transaction receipt",
    "confirmation pending",
    "transaction submitted",
];

static TX_HASH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0x[a-fA-F0-9]{40,64}").expect("Invalid tx hash regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    RateLimited,
    /// Broadcast, receipt not yet located. Carries the hash when the error
    /// message contained one.
    TimeoutPending { tx_hash: Option<String> },
    /// Carries the raw error message, possibly empty.
    Failed { message: String },
}

impl Classification {
    /// Classification of a submission that outlived its bounded wait.
    pub fn timed_out() -> Self {
        Classification::TimeoutPending { tx_hash: None }
    }

    /// Message shown to the user for this outcome.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Classification::RateLimited => RATE_LIMIT_MESSAGE.to_string(),
            Classification::TimeoutPending { tx_hash: Some(hash) } => format!(
                "Transaction submitted ({}...) but confirmation pending. Please wait a moment and refresh.",
                abbreviate_hash(hash)
            ),
            Classification::TimeoutPending { tx_hash: None } => PENDING_MESSAGE.to_string(),
            Classification::Failed { message } if !message.trim().is_empty() => message.clone(),
            Classification::Failed { .. } => fallback.to_string(),
        }
    }
}

/// First ten characters of a hash, `0x` included.
pub fn abbreviate_hash(hash: &str) -> &str {
    hash.char_indices()
        .nth(10)
        .map_or(hash, |(end, _)| &hash[..end])
}

pub fn is_rate_limited(error: &WriteError) -> bool {
    if matches!(error.code, Some(HTTP_TOO_MANY_REQUESTS) | Some(RPC_RATE_LIMIT_CODE)) {
        return true;
    }
    let message = error.message.to_lowercase();
    RATE_LIMIT_PHRASES.iter().any(|phrase| message.contains(phrase))
        || (message.contains("429") && message.contains("limit"))
}

pub fn is_pending_confirmation(error: &WriteError) -> bool {
    let message = error.message.to_lowercase();
    PENDING_PHRASES.iter().any(|phrase| message.contains(phrase))
        || (message.contains("could not be found") && message.contains("hash"))
}

/// Extract the first transaction-hash-shaped substring of `message`.
pub fn extract_tx_hash(message: &str) -> Option<String> {
    TX_HASH_PATTERN
        .find(message)
        .map(|found| found.as_str().to_string())
}

/// Classify a write-client error. Rate limiting takes precedence over a
/// pending receipt.
pub fn classify(error: &WriteError) -> Classification {
    if is_rate_limited(error) {
        Classification::RateLimited
    } else if is_pending_confirmation(error) {
        Classification::TimeoutPending {
            tx_hash: extract_tx_hash(&error.message),
        }
    } else {
        Classification::Failed {
            message: error.message.clone(),
        }
    }
}
