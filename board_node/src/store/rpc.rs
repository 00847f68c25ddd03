//! JSON-RPC gateway client for the entity store.

use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::entity::{Attribute, CreateEntity, CreatedEntity, Entity, EntityQuery};
use super::error::{StoreError, WriteError};
use super::signer::{keccak256, Signer};
use super::{EntityReader, EntityWriter};

const QUERY_METHOD: &str = "arkiv_query";
const CREATE_METHOD: &str = "arkiv_createEntity";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Entity store reached over JSON-RPC 2.0.
pub struct RpcEntityStore {
    client: Client,
    rpc_url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: [P; 1],
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResult {
    #[serde(default)]
    entities: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEntityParams<'a> {
    from: &'a str,
    payload: String,
    content_type: &'a str,
    attributes: &'a [Attribute],
    expires_in: u64,
}

#[derive(Debug, Serialize)]
struct SignedCreate<'a> {
    #[serde(flatten)]
    params: &'a CreateEntityParams<'a>,
    signature: String,
}

impl RpcEntityStore {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn call<P: Serialize>(&self, method: &str, params: P) -> Result<Value, StoreError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: [params],
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(StoreError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(envelope.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl EntityReader for RpcEntityStore {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, StoreError> {
        let result = self.call(QUERY_METHOD, query).await?;
        let raw_entities = match result {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            other => serde_json::from_value::<QueryResult>(other)
                .map_err(|e| StoreError::Decode(e.to_string()))?
                .entities,
        };
        Ok(raw_entities.into_iter().filter_map(decode_entity).collect())
    }
}

/// Decode one query result entry. Malformed entries are logged and skipped
/// so they cannot void the rest of the result.
fn decode_entity(raw: Value) -> Option<Entity> {
    match serde_json::from_value::<Entity>(raw) {
        Ok(entity) => Some(entity),
        Err(e) => {
            warn!("Skipping malformed entity in query result: {}", e);
            None
        }
    }
}

#[async_trait]
impl EntityWriter for RpcEntityStore {
    async fn create_entity(
        &self,
        signer: &Signer,
        request: CreateEntity,
    ) -> Result<CreatedEntity, WriteError> {
        let params = CreateEntityParams {
            from: signer.address(),
            payload: format!("0x{}", hex::encode(&request.payload)),
            content_type: &request.content_type,
            attributes: &request.attributes,
            expires_in: request.expires_in,
        };
        let unsigned = serde_json::to_vec(&params)
            .map_err(|e| WriteError::new(format!("failed to encode create request: {}", e)))?;
        let signed = SignedCreate {
            params: &params,
            signature: signer.sign_digest(keccak256(&unsigned)),
        };

        let result = self.call(CREATE_METHOD, &signed).await?;
        serde_json::from_value(result)
            .map_err(|e| WriteError::new(format!("malformed create response: {}", e)))
    }
}
