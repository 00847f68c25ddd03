pub mod health;
pub mod messages;
pub mod signatures;

use log::error;
use serde::Serialize;

use crate::api::{ApiError, ApiResult, AppState};
use crate::publish::{Publisher, WriteOutcome};
use crate::reconcile::{read_records, ReadError, ReadOutcome};
use crate::records::{Draft, RecordKind};
use crate::store::{CreatedEntity, Signer};

/// Body of a confirmed write. `detail` carries the per-collection field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedResponse<D> {
    pub ok: bool,
    pub status: &'static str,
    pub entity_key: String,
    pub tx_hash: String,
    #[serde(flatten)]
    pub detail: D,
}

impl<D> SubmittedResponse<D> {
    pub fn new(created: CreatedEntity, detail: D) -> Self {
        Self {
            ok: true,
            status: "submitted",
            entity_key: created.entity_key,
            tx_hash: created.tx_hash,
            detail,
        }
    }
}

/// Read every record of kind `K` across the configured partitions.
pub(crate) async fn fetch_records<K: RecordKind>(
    state: &AppState,
) -> Result<ReadOutcome<K::Record>, ReadError> {
    let partitions = state.config.read_partitions();
    read_records::<K>(state.reader.as_ref(), &partitions)
        .await
        .map_err(|e| {
            error!("Error listing {}: {}", K::COLLECTION, e);
            e
        })
}

/// Publish `draft` and map the outcome onto the response status.
pub(crate) async fn submit_record<K: RecordKind>(
    state: &AppState,
    signer: &Signer,
    draft: Draft,
) -> ApiResult<CreatedEntity> {
    match Publisher::new(state.writer.as_ref(), &state.config)
        .publish::<K>(signer, draft)
        .await
    {
        WriteOutcome::Confirmed(created) => Ok(created),
        WriteOutcome::PendingConfirmation { message } => Err(ApiError::accepted_pending(&message)),
        WriteOutcome::RateLimited { message } => Err(ApiError::too_many_requests(&message)),
        WriteOutcome::Failed { message } => Err(ApiError::internal_server_error(&message)),
    }
}
