use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::{fetch_records, submit_record, SubmittedResponse};
use crate::api::validation::{optional_text, require_text, validate_address};
use crate::api::{ApiError, ApiResult, AppState};
use crate::reconcile::PartitionError;
use crate::records::signature::{signature_draft, SignatureInput};
use crate::records::{iso_timestamp_now, Signature, SignatureKind};

pub const FETCH_FAILURE: &str = "Failed to fetch signatures";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSignatureRequest {
    pub name: Option<String>,
    pub message: Option<String>,
    pub signer_wallet: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturesResponse {
    pub ok: bool,
    pub signatures: Vec<Signature>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partition_errors: Vec<PartitionError>,
}

#[derive(Debug, Serialize)]
pub struct SignatureDetail {
    pub signature: Signature,
}

impl CreateSignatureRequest {
    fn validate(&self) -> Result<SignatureInput, ApiError> {
        let name = require_text(self.name.as_deref(), "name", "Name is required")?;
        let signer_wallet = optional_text(self.signer_wallet.as_deref());
        if let Some(wallet) = &signer_wallet {
            validate_address(wallet, "signerWallet")?;
        }

        Ok(SignatureInput {
            name,
            message: optional_text(self.message.as_deref()).unwrap_or_default(),
            signer_wallet,
        })
    }
}

/// List declaration signatures across the configured partitions, newest first
pub async fn list_signatures(
    State(state): State<AppState>,
) -> ApiResult<Json<SignaturesResponse>> {
    let outcome = fetch_records::<SignatureKind>(&state)
        .await
        .map_err(|_| ApiError::internal_server_error(FETCH_FAILURE).with_empty_list("signatures"))?;

    Ok(Json(SignaturesResponse {
        ok: true,
        signatures: outcome.records,
        partition_errors: outcome.partition_errors,
    }))
}

/// Sign the declaration, attested by the server wallet
pub async fn create_signature(
    State(state): State<AppState>,
    body: Result<Json<CreateSignatureRequest>, JsonRejection>,
) -> ApiResult<Json<SubmittedResponse<SignatureDetail>>> {
    let Json(request) = body?;
    let input = request.validate()?;

    let signer = state.config.signer()?;
    let attested_by = signer.address().to_lowercase();
    let timestamp = iso_timestamp_now();
    let draft = signature_draft(&input, &attested_by, &state.config.query_space_id, &timestamp);

    let created = submit_record::<SignatureKind>(&state, &signer, draft).await?;

    let signature = Signature {
        id: created.entity_key.clone(),
        name: input.name,
        message: input.message,
        timestamp,
        signer_wallet: input.signer_wallet.unwrap_or_default(),
        attested_by,
        tx_hash: created.tx_hash.clone(),
    };
    Ok(Json(SubmittedResponse::new(created, SignatureDetail { signature })))
}
