//! Record kinds stored on the board.
//!
//! Messages and signatures follow the same pattern: a primary record plus a
//! companion record that links the primary key to its transaction hash.
//! [`RecordKind`] captures what differs between the two.

pub mod message;
pub mod signature;

use serde::Serialize;
use serde_json::Value;

use crate::fields::EntityView;
use crate::store::Attribute;

pub use message::{Message, MessageKind};
pub use signature::{Signature, SignatureKind};

/// Companion attribute and payload field carrying the transaction hash.
pub const TX_HASH_FIELD: &str = "txHash";

pub trait RecordKind: Send + Sync + 'static {
    type Record: Serialize + Clone + Send + Sync + std::fmt::Debug;

    /// Plural name, used for logging and as the list field in responses.
    const COLLECTION: &'static str;
    const PRIMARY_TYPE: &'static str;
    const COMPANION_TYPE: &'static str;
    /// Companion attribute holding the primary record's key.
    const FOREIGN_KEY: &'static str;
    const QUERY_LIMIT: usize;
    /// Error message when a write fails without a usable message.
    const WRITE_FAILURE: &'static str;

    /// Build a record from a primary entity and its resolved tx hash.
    fn assemble(view: &EntityView<'_>, tx_hash: String) -> Self::Record;

    fn record_id(record: &Self::Record) -> &str;

    /// Timestamp the list is ordered by.
    fn sort_timestamp(record: &Self::Record) -> &str;
}

/// Primary record ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub payload: Value,
    pub attributes: Vec<Attribute>,
}

/// Current time as an ISO-8601 UTC string with millisecond precision.
pub fn iso_timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
