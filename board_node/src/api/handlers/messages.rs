use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::{fetch_records, submit_record, SubmittedResponse};
use crate::api::validation::require_text;
use crate::api::{ApiError, ApiResult, AppState};
use crate::reconcile::PartitionError;
use crate::records::message::message_draft;
use crate::records::{iso_timestamp_now, Message, MessageKind};

pub const MESSAGE_CREATED_NOTICE: &str =
    "Message created. It may take a moment to appear in queries.";

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    pub ok: bool,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partition_errors: Vec<PartitionError>,
}

#[derive(Debug, Serialize)]
pub struct MessageNotice {
    pub message: &'static str,
}

/// List messages across the configured partitions, newest first
pub async fn list_messages(State(state): State<AppState>) -> ApiResult<Json<MessagesResponse>> {
    let outcome = fetch_records::<MessageKind>(&state).await.map_err(|e| {
        ApiError::internal_server_error(&e.to_string()).with_empty_list("messages")
    })?;

    Ok(Json(MessagesResponse {
        ok: true,
        messages: outcome.records,
        partition_errors: outcome.partition_errors,
    }))
}

/// Post a message signed by the server wallet
pub async fn create_message(
    State(state): State<AppState>,
    body: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> ApiResult<Json<SubmittedResponse<MessageNotice>>> {
    let Json(request) = body?;
    let text = require_text(request.text.as_deref(), "text", "Message text is required")?;

    let signer = state.config.signer()?;
    let wallet = signer.address().to_lowercase();
    let draft = message_draft(&text, &wallet, &state.config.query_space_id, &iso_timestamp_now());

    let created = submit_record::<MessageKind>(&state, &signer, draft).await?;

    Ok(Json(SubmittedResponse::new(
        created,
        MessageNotice {
            message: MESSAGE_CREATED_NOTICE,
        },
    )))
}
