//! Client seam to the external entity store.
//!
//! Reads and writes go through two object-safe traits so that the service
//! can run against the JSON-RPC gateway or the in-memory store.

pub mod entity;
pub mod error;
pub mod memory;
pub mod rpc;
pub mod signer;

use async_trait::async_trait;

pub use entity::{
    Attribute, Attributes, CreateEntity, CreatedEntity, Entity, EntityQuery, Payload, PayloadError,
};
pub use error::{StoreError, WriteError};
pub use memory::InMemoryEntityStore;
pub use rpc::RpcEntityStore;
pub use signer::{keccak256, Signer, SignerError};

/// Attribute carrying the record type tag.
pub const TYPE_ATTRIBUTE: &str = "type";
/// Attribute carrying the partition identifier.
pub const SPACE_ATTRIBUTE: &str = "spaceId";
/// Content type of every payload this service writes.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Read side of the store.
#[async_trait]
pub trait EntityReader: Send + Sync {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, StoreError>;
}

/// Write side of the store.
#[async_trait]
pub trait EntityWriter: Send + Sync {
    async fn create_entity(
        &self,
        signer: &Signer,
        request: CreateEntity,
    ) -> Result<CreatedEntity, WriteError>;
}
