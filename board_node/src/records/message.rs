use serde::Serialize;
use serde_json::json;

use super::{Draft, RecordKind};
use crate::fields::{EntityView, FieldChain, FieldSource};
use crate::store::{Attribute, SPACE_ATTRIBUTE, TYPE_ATTRIBUTE};

pub const MESSAGE_TYPE: &str = "workshop_message";
pub const MESSAGE_TXHASH_TYPE: &str = "workshop_message_txhash";

const TEXT: FieldChain = FieldChain::new(
    &[FieldSource::Payload("text"), FieldSource::Attribute("text")],
    "",
);
const WALLET: FieldChain = FieldChain::new(&[FieldSource::Attribute("wallet")], "");
const CREATED_AT: FieldChain = FieldChain::new(
    &[
        FieldSource::Payload("createdAt"),
        FieldSource::Attribute("created_at"),
    ],
    "",
);

/// A message board post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub wallet: String,
    pub created_at: String,
    pub tx_hash: String,
}

pub struct MessageKind;

impl RecordKind for MessageKind {
    type Record = Message;

    const COLLECTION: &'static str = "messages";
    const PRIMARY_TYPE: &'static str = MESSAGE_TYPE;
    const COMPANION_TYPE: &'static str = MESSAGE_TXHASH_TYPE;
    const FOREIGN_KEY: &'static str = "messageKey";
    const QUERY_LIMIT: usize = 100;
    const WRITE_FAILURE: &'static str = "Failed to create message";

    fn assemble(view: &EntityView<'_>, tx_hash: String) -> Message {
        Message {
            id: view.key.to_string(),
            text: TEXT.resolve(view),
            wallet: WALLET.resolve(view),
            created_at: CREATED_AT.resolve(view),
            tx_hash,
        }
    }

    fn record_id(record: &Message) -> &str {
        &record.id
    }

    fn sort_timestamp(record: &Message) -> &str {
        &record.created_at
    }
}

/// Primary record for a new message. `text` is expected trimmed and
/// `wallet` lower-cased.
pub fn message_draft(text: &str, wallet: &str, space_id: &str, created_at: &str) -> Draft {
    Draft {
        payload: json!({
            "text": text,
            "createdAt": created_at,
        }),
        attributes: vec![
            Attribute::new(TYPE_ATTRIBUTE, MESSAGE_TYPE),
            Attribute::new("wallet", wallet),
            Attribute::new(SPACE_ATTRIBUTE, space_id),
            Attribute::new("created_at", created_at),
        ],
    }
}
