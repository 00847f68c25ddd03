//! Write path: primary record first, then a best-effort companion.
//!
//! The transaction hash of the primary record is only known once it has
//! been created, and entities cannot be updated, so the hash is stored in a
//! separate companion record keyed by the primary key. The companion is
//! never allowed to fail the write.

use log::{debug, error, info, warn};
use std::time::Duration;

use crate::classify::{classify, Classification};
use crate::config::BoardConfig;
use crate::records::{Draft, RecordKind, TX_HASH_FIELD};
use crate::store::{
    Attribute, CreateEntity, CreatedEntity, EntityWriter, Signer, JSON_CONTENT_TYPE,
    SPACE_ATTRIBUTE, TYPE_ATTRIBUTE,
};

/// Terminal state of one write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Confirmed(CreatedEntity),
    /// Submitted, receipt not located yet.
    PendingConfirmation { message: String },
    RateLimited { message: String },
    Failed { message: String },
}

impl WriteOutcome {
    fn from_classification(classification: Classification, fallback: &str) -> Self {
        let message = classification.user_message(fallback);
        match classification {
            Classification::RateLimited => WriteOutcome::RateLimited { message },
            Classification::TimeoutPending { .. } => WriteOutcome::PendingConfirmation { message },
            Classification::Failed { .. } => WriteOutcome::Failed { message },
        }
    }
}

pub struct Publisher<'a> {
    writer: &'a dyn EntityWriter,
    space_id: &'a str,
    timeout: Duration,
    ttl_secs: u64,
}

impl<'a> Publisher<'a> {
    pub fn new(writer: &'a dyn EntityWriter, config: &'a BoardConfig) -> Self {
        Self {
            writer,
            space_id: &config.query_space_id,
            timeout: config.write_timeout,
            ttl_secs: config.entity_ttl_secs,
        }
    }

    fn request(&self, payload: &serde_json::Value, attributes: Vec<Attribute>) -> CreateEntity {
        CreateEntity {
            payload: payload.to_string().into_bytes(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            attributes,
            expires_in: self.ttl_secs,
        }
    }

    /// Submit `draft` as a record of kind `K`, then its companion.
    pub async fn publish<K: RecordKind>(&self, signer: &Signer, draft: Draft) -> WriteOutcome {
        let request = self.request(&draft.payload, draft.attributes);

        let created = match tokio::time::timeout(
            self.timeout,
            self.writer.create_entity(signer, request),
        )
        .await
        {
            Ok(Ok(created)) => created,
            Ok(Err(e)) => {
                let classification = classify(&e);
                match classification {
                    Classification::Failed { .. } => {
                        error!("Error creating {} entity: {}", K::PRIMARY_TYPE, e)
                    }
                    _ => warn!(
                        "Creating {} entity did not complete ({:?}): {}",
                        K::PRIMARY_TYPE,
                        classification,
                        e
                    ),
                }
                return WriteOutcome::from_classification(classification, K::WRITE_FAILURE);
            }
            Err(_) => {
                warn!(
                    "Creating {} entity exceeded {:?}, confirmation pending",
                    K::PRIMARY_TYPE,
                    self.timeout
                );
                return WriteOutcome::from_classification(
                    Classification::timed_out(),
                    K::WRITE_FAILURE,
                );
            }
        };

        info!(
            "Created {} entity {} (tx {})",
            K::PRIMARY_TYPE,
            created.entity_key,
            created.tx_hash
        );
        self.publish_companion::<K>(signer, &created).await;

        WriteOutcome::Confirmed(created)
    }

    /// Create the tx-hash companion for `created`. Failures are logged only.
    async fn publish_companion<K: RecordKind>(&self, signer: &Signer, created: &CreatedEntity) {
        if created.tx_hash.is_empty() {
            debug!(
                "No tx hash for {} entity {}, skipping companion",
                K::PRIMARY_TYPE,
                created.entity_key
            );
            return;
        }

        let payload = serde_json::json!({ TX_HASH_FIELD: created.tx_hash });
        let attributes = vec![
            Attribute::new(TYPE_ATTRIBUTE, K::COMPANION_TYPE),
            Attribute::new(K::FOREIGN_KEY, created.entity_key.as_str()),
            Attribute::new(TX_HASH_FIELD, created.tx_hash.as_str()),
            Attribute::new(SPACE_ATTRIBUTE, self.space_id),
        ];
        let request = self.request(&payload, attributes);

        match tokio::time::timeout(self.timeout, self.writer.create_entity(signer, request)).await {
            Ok(Ok(companion)) => debug!(
                "Created {} entity {} for {}",
                K::COMPANION_TYPE,
                companion.entity_key,
                created.entity_key
            ),
            Ok(Err(e)) => warn!(
                "Failed to create {} entity, but {} was created: {}",
                K::COMPANION_TYPE,
                created.entity_key,
                e
            ),
            Err(_) => warn!(
                "Creating {} entity for {} exceeded {:?}",
                K::COMPANION_TYPE,
                created.entity_key,
                self.timeout
            ),
        }
    }
}
