//! Process-local entity store.
//!
//! Backs the `--in-memory` demo mode and the test suite. Partitions can be
//! marked unavailable and write results can be scripted to reproduce the
//! failures seen against a flaky testnet.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

use super::entity::{Attributes, CreateEntity, CreatedEntity, Entity, EntityQuery, Payload};
use super::error::{StoreError, WriteError};
use super::signer::{keccak256, Signer};
use super::{EntityReader, EntityWriter, SPACE_ATTRIBUTE};

#[derive(Default)]
struct MemoryState {
    entities: Vec<Entity>,
    sequence: u64,
    unavailable_partitions: HashSet<String>,
    scripted_writes: VecDeque<Result<(), WriteError>>,
    write_delay: Option<Duration>,
    create_calls: usize,
    query_calls: usize,
}

#[derive(Default)]
pub struct InMemoryEntityStore {
    state: Mutex<MemoryState>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entity as-is, bypassing key assignment.
    pub async fn insert(&self, entity: Entity) {
        self.state.lock().await.entities.push(entity);
    }

    /// Make every query filtered on `partition` fail.
    pub async fn fail_partition(&self, partition: &str) {
        self.state
            .lock()
            .await
            .unavailable_partitions
            .insert(partition.to_string());
    }

    /// Queue the result of the next create call; `Ok(())` lets it through.
    pub async fn script_write(&self, outcome: Result<(), WriteError>) {
        self.state.lock().await.scripted_writes.push_back(outcome);
    }

    /// Delay every create call, to exercise bounded waits.
    pub async fn delay_writes(&self, delay: Duration) {
        self.state.lock().await.write_delay = Some(delay);
    }

    pub async fn entities(&self) -> Vec<Entity> {
        self.state.lock().await.entities.clone()
    }

    pub async fn create_calls(&self) -> usize {
        self.state.lock().await.create_calls
    }

    pub async fn query_calls(&self) -> usize {
        self.state.lock().await.query_calls
    }
}

fn matches_query(entity: &Entity, query: &EntityQuery) -> bool {
    query
        .filters
        .iter()
        .all(|filter| entity.attributes.matches(&filter.key, &filter.value))
}

#[async_trait]
impl EntityReader for InMemoryEntityStore {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, StoreError> {
        let mut state = self.state.lock().await;
        state.query_calls += 1;

        if let Some(partition) = query.filter_value(SPACE_ATTRIBUTE) {
            if state.unavailable_partitions.contains(partition) {
                return Err(StoreError::Unavailable(partition.to_string()));
            }
        }

        Ok(state
            .entities
            .iter()
            .filter(|entity| matches_query(entity, query))
            .take(query.limit)
            .map(|entity| Entity {
                payload: if query.with_payload {
                    entity.payload.clone()
                } else {
                    None
                },
                attributes: if query.with_attributes {
                    entity.attributes.clone()
                } else {
                    Attributes::default()
                },
                ..entity.clone()
            })
            .collect())
    }
}

#[async_trait]
impl EntityWriter for InMemoryEntityStore {
    async fn create_entity(
        &self,
        signer: &Signer,
        request: CreateEntity,
    ) -> Result<CreatedEntity, WriteError> {
        let delay = {
            let mut state = self.state.lock().await;
            state.create_calls += 1;
            if let Some(Err(err)) = state.scripted_writes.pop_front() {
                return Err(err);
            }
            state.write_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        state.sequence += 1;

        let mut seed = signer.address().as_bytes().to_vec();
        seed.extend_from_slice(&state.sequence.to_be_bytes());
        let key_digest = keccak256(&seed);
        let entity_key = format!("0x{}", hex::encode(key_digest));
        let tx_hash = format!("0x{}", hex::encode(keccak256(&key_digest)));

        state.entities.push(Entity {
            key: entity_key.clone(),
            payload: Some(Payload::Bytes(request.payload)),
            attributes: request.attributes.into_iter().collect(),
            tx_hash: None,
        });

        Ok(CreatedEntity {
            entity_key,
            tx_hash,
        })
    }
}
