use serde::Serialize;
use serde_json::json;

use super::{Draft, RecordKind};
use crate::fields::{EntityView, FieldChain, FieldSource};
use crate::store::{Attribute, SPACE_ATTRIBUTE, TYPE_ATTRIBUTE};

pub const SIGNATURE_TYPE: &str = "declaration_signature";
pub const SIGNATURE_TXHASH_TYPE: &str = "declaration_signature_txhash";

const NAME: FieldChain = FieldChain::new(
    &[FieldSource::Payload("name"), FieldSource::Attribute("name")],
    "Anonymous",
);
const MESSAGE: FieldChain = FieldChain::new(
    &[FieldSource::Payload("message"), FieldSource::Attribute("message")],
    "",
);
const TIMESTAMP: FieldChain = FieldChain::new(
    &[
        FieldSource::Payload("timestamp"),
        FieldSource::Attribute("timestamp"),
    ],
    "",
);
const SIGNER_WALLET: FieldChain = FieldChain::new(
    &[
        FieldSource::Payload("signerWallet"),
        FieldSource::Attribute("signerWallet"),
    ],
    "",
);
const ATTESTED_BY: FieldChain = FieldChain::new(
    &[
        FieldSource::Payload("attestedBy"),
        FieldSource::Attribute("attestedBy"),
    ],
    "",
);

/// A signature on the declaration, attested by the server wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: String,
    pub name: String,
    pub message: String,
    pub timestamp: String,
    pub signer_wallet: String,
    pub attested_by: String,
    pub tx_hash: String,
}

pub struct SignatureKind;

impl RecordKind for SignatureKind {
    type Record = Signature;

    const COLLECTION: &'static str = "signatures";
    const PRIMARY_TYPE: &'static str = SIGNATURE_TYPE;
    const COMPANION_TYPE: &'static str = SIGNATURE_TXHASH_TYPE;
    const FOREIGN_KEY: &'static str = "signatureKey";
    const QUERY_LIMIT: usize = 500;
    const WRITE_FAILURE: &'static str = "Failed to create signature";

    fn assemble(view: &EntityView<'_>, tx_hash: String) -> Signature {
        Signature {
            id: view.key.to_string(),
            name: NAME.resolve(view),
            message: MESSAGE.resolve(view),
            timestamp: TIMESTAMP.resolve(view),
            signer_wallet: SIGNER_WALLET.resolve(view),
            attested_by: ATTESTED_BY.resolve(view),
            tx_hash,
        }
    }

    fn record_id(record: &Signature) -> &str {
        &record.id
    }

    fn sort_timestamp(record: &Signature) -> &str {
        &record.timestamp
    }
}

/// Validated input for a new signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInput {
    pub name: String,
    pub message: String,
    pub signer_wallet: Option<String>,
}

/// Primary record for a new signature. `attested_by` is expected
/// lower-cased.
pub fn signature_draft(
    input: &SignatureInput,
    attested_by: &str,
    space_id: &str,
    timestamp: &str,
) -> Draft {
    let mut attributes = vec![
        Attribute::new(TYPE_ATTRIBUTE, SIGNATURE_TYPE),
        Attribute::new("name", input.name.as_str()),
        Attribute::new("timestamp", timestamp),
        Attribute::new("attestedBy", attested_by),
        Attribute::new(SPACE_ATTRIBUTE, space_id),
    ];
    if let Some(wallet) = &input.signer_wallet {
        attributes.push(Attribute::new("signerWallet", wallet.as_str()));
    }

    Draft {
        payload: json!({
            "name": input.name,
            "message": input.message,
            "timestamp": timestamp,
            "signerWallet": input.signer_wallet,
            "attestedBy": attested_by,
        }),
        attributes,
    }
}
