//! Read path: fan out over partitions, merge companions, dedupe, sort.
//!
//! Writers may target different partitions, so every read queries each
//! partition for both the primary and the companion record type. A failing
//! partition contributes no entities and is reported next to the result;
//! the read only fails when no primary query succeeded.

use futures::future::join_all;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Map;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::fields::EntityView;
use crate::records::{RecordKind, TX_HASH_FIELD};
use crate::store::{Entity, EntityQuery, EntityReader, SPACE_ATTRIBUTE, TYPE_ATTRIBUTE};

/// A partition query that failed and was left out of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionError {
    pub partition: String,
    pub record_type: &'static str,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ReadOutcome<R> {
    pub records: Vec<R>,
    pub partition_errors: Vec<PartitionError>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReadError {
    #[error("no partitions to query")]
    NoPartitions,

    #[error("all {} partition queries for {} failed: {}", .errors.len(), .record_type, first_error(.errors))]
    AllPartitionsFailed {
        record_type: &'static str,
        errors: Vec<PartitionError>,
    },
}

fn first_error(errors: &[PartitionError]) -> &str {
    errors.first().map_or("", |e| e.error.as_str())
}

/// Query one record type across `partitions`, isolating failures.
async fn fan_out(
    reader: &dyn EntityReader,
    record_type: &'static str,
    partitions: &[String],
    limit: usize,
) -> (Vec<Entity>, Vec<PartitionError>) {
    let queries = partitions.iter().map(|partition| async move {
        let query = EntityQuery::new(limit)
            .where_eq(TYPE_ATTRIBUTE, record_type)
            .where_eq(SPACE_ATTRIBUTE, partition);
        (partition, reader.query(&query).await)
    });

    let mut entities = Vec::new();
    let mut errors = Vec::new();
    for (partition, result) in join_all(queries).await {
        match result {
            Ok(found) => entities.extend(found),
            Err(e) => {
                warn!(
                    "Query for {} in partition {} failed: {}",
                    record_type,
                    partition,
                    e
                );
                errors.push(PartitionError {
                    partition: partition.clone(),
                    record_type,
                    error: e.to_string(),
                });
            }
        }
    }
    (entities, errors)
}

/// Decode an entity payload as a JSON object, empty on any failure.
fn payload_object(entity: &Entity) -> Map<String, serde_json::Value> {
    match &entity.payload {
        Some(payload) => payload.decode_object().unwrap_or_else(|e| {
            warn!("Error decoding payload of entity {}: {}", entity.key, e);
            Map::new()
        }),
        None => Map::new(),
    }
}

/// Map of primary key to tx hash, built from companion entities.
///
/// A companion's hash comes from its payload, else its attribute. A
/// companion with no non-empty hash is skipped, so it never clears a hash
/// indexed earlier. Otherwise later companions for the same key replace
/// earlier ones.
pub fn build_tx_hash_index(foreign_key: &str, companions: &[Entity]) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for companion in companions {
        let Some(primary_key) = companion.attributes.get(foreign_key) else {
            continue;
        };
        let payload = payload_object(companion);
        let tx_hash = payload
            .get(TX_HASH_FIELD)
            .and_then(|value| value.as_str())
            .filter(|hash| !hash.is_empty())
            .or_else(|| companion.attributes.get(TX_HASH_FIELD));
        if let Some(tx_hash) = tx_hash {
            index.insert(primary_key.to_string(), tx_hash.to_string());
        }
    }
    index
}

/// Build the record for a primary entity, attaching its tx hash from the
/// companion index, the attribute, or the entity's own field.
pub fn assemble_record<K: RecordKind>(
    entity: &Entity,
    tx_hashes: &HashMap<String, String>,
) -> K::Record {
    let payload = payload_object(entity);
    let view = EntityView {
        key: &entity.key,
        payload: &payload,
        attributes: &entity.attributes,
    };
    let tx_hash = tx_hashes
        .get(&entity.key)
        .map(String::as_str)
        .or_else(|| entity.attributes.get(TX_HASH_FIELD))
        .or(entity.tx_hash.as_deref())
        .unwrap_or_default()
        .to_string();
    K::assemble(&view, tx_hash)
}

/// Keep the first record seen for each id.
pub fn dedupe_first_seen<K: RecordKind>(records: Vec<K::Record>) -> Vec<K::Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(K::record_id(record).to_string()))
        .collect()
}

/// Milliseconds since the Unix epoch; 0 when the string is not a date.
pub fn timestamp_millis(raw: &str) -> i64 {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.timestamp_millis();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.and_utc().timestamp_millis();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = parsed.and_hms_opt(0, 0, 0) {
            return midnight.and_utc().timestamp_millis();
        }
    }
    0
}

/// Newest first. Stable, so equal timestamps keep their merge order.
pub fn sort_newest_first<K: RecordKind>(records: &mut [K::Record]) {
    records.sort_by_cached_key(|record| Reverse(timestamp_millis(K::sort_timestamp(record))));
}

/// Read every record of kind `K` visible in `partitions`.
pub async fn read_records<K: RecordKind>(
    reader: &dyn EntityReader,
    partitions: &[String],
) -> Result<ReadOutcome<K::Record>, ReadError> {
    if partitions.is_empty() {
        return Err(ReadError::NoPartitions);
    }

    let ((primaries, primary_errors), (companions, companion_errors)) = futures::join!(
        fan_out(reader, K::PRIMARY_TYPE, partitions, K::QUERY_LIMIT),
        fan_out(reader, K::COMPANION_TYPE, partitions, K::QUERY_LIMIT)
    );

    if primary_errors.len() == partitions.len() {
        return Err(ReadError::AllPartitionsFailed {
            record_type: K::PRIMARY_TYPE,
            errors: primary_errors,
        });
    }

    let tx_hashes = build_tx_hash_index(K::FOREIGN_KEY, &companions);
    let records = primaries
        .iter()
        .map(|entity| assemble_record::<K>(entity, &tx_hashes))
        .collect();
    let mut records = dedupe_first_seen::<K>(records);
    sort_newest_first::<K>(&mut records);

    debug!(
        "Read {} {} from {} partitions ({} companions)",
        records.len(),
        K::COLLECTION,
        partitions.len(),
        companions.len()
    );

    let mut partition_errors = primary_errors;
    partition_errors.extend(companion_errors);
    Ok(ReadOutcome {
        records,
        partition_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{MessageKind, SignatureKind};
    use crate::store::{Attribute, InMemoryEntityStore, Payload};
    use serde_json::json;

    fn entity(key: &str, payload: serde_json::Value, attributes: &[(&str, &str)]) -> Entity {
        Entity {
            key: key.to_string(),
            payload: Some(Payload::Json(payload)),
            attributes: attributes
                .iter()
                .map(|(k, v)| Attribute::new(*k, *v))
                .collect(),
            tx_hash: None,
        }
    }

    fn message(key: &str, space: &str, text: &str, created_at: &str) -> Entity {
        entity(
            key,
            json!({"text": text, "createdAt": created_at}),
            &[("type", "workshop_message"), ("spaceId", space)],
        )
    }

    fn companion(key: &str, space: &str, message_key: &str, tx_hash: &str) -> Entity {
        entity(
            key,
            json!({"txHash": tx_hash}),
            &[
                ("type", "workshop_message_txhash"),
                ("spaceId", space),
                ("messageKey", message_key),
            ],
        )
    }

    fn partitions(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!(timestamp_millis("1970-01-01T00:00:01.000Z"), 1000);
        assert_eq!(timestamp_millis("1970-01-01T00:00:01+00:00"), 1000);
        assert_eq!(timestamp_millis("1970-01-01T00:00:02"), 2000);
        assert_eq!(timestamp_millis("1970-01-02"), 86_400_000);
        assert_eq!(timestamp_millis("yesterday"), 0);
        assert_eq!(timestamp_millis(""), 0);
    }

    #[test]
    fn test_tx_hash_index_last_write_wins() {
        let companions = vec![
            companion("c1", "ns", "m1", "0xold"),
            companion("c2", "ns", "m1", "0xnew"),
            entity(
                "c3",
                json!("not an object"),
                &[("messageKey", "m2"), ("txHash", "0xattr")],
            ),
            entity("c4", json!({"txHash": "0xorphan"}), &[]),
        ];

        let index = build_tx_hash_index("messageKey", &companions);
        assert_eq!(index.get("m1").map(String::as_str), Some("0xnew"));
        assert_eq!(index.get("m2").map(String::as_str), Some("0xattr"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_companion_without_hash_keeps_earlier_hash() {
        let companions = vec![
            companion("c1", "ns", "m1", "0xfirst"),
            companion("c2", "ns", "m1", ""),
            entity("c3", json!({}), &[("messageKey", "m1"), ("txHash", "")]),
            entity("c4", json!({"txHash": ""}), &[("messageKey", "m2")]),
        ];

        let index = build_tx_hash_index("messageKey", &companions);
        assert_eq!(index.get("m1").map(String::as_str), Some("0xfirst"));
        assert!(!index.contains_key("m2"));
    }

    #[test]
    fn test_tx_hash_fallback_chain() {
        let mut literal = message("m3", "ns", "c", "");
        literal.tx_hash = Some("0xliteral".to_string());
        let with_attr = entity("m2", json!({}), &[("txHash", "0xattr")]);
        let plain = message("m1", "ns", "a", "");

        let mut index = HashMap::new();
        index.insert("m1".to_string(), "0xcompanion".to_string());
        index.insert("m2".to_string(), "0xcompanion2".to_string());

        assert_eq!(assemble_record::<MessageKind>(&plain, &index).tx_hash, "0xcompanion");
        assert_eq!(assemble_record::<MessageKind>(&with_attr, &index).tx_hash, "0xcompanion2");
        assert_eq!(
            assemble_record::<MessageKind>(&with_attr, &HashMap::new()).tx_hash,
            "0xattr"
        );
        assert_eq!(assemble_record::<MessageKind>(&literal, &index).tx_hash, "0xliteral");
        assert_eq!(
            assemble_record::<MessageKind>(&message("m4", "ns", "d", ""), &index).tx_hash,
            ""
        );
    }

    #[test]
    fn test_undecodable_payload_falls_back_to_attributes() {
        let broken = Entity {
            key: "m1".to_string(),
            payload: Some(Payload::Bytes(vec![0xff, 0x00, 0x7b])),
            attributes: vec![
                Attribute::new("text", "hi"),
                Attribute::new("wallet", "0xw"),
                Attribute::new("created_at", "2024-02-02T00:00:00.000Z"),
            ]
            .into_iter()
            .collect(),
            tx_hash: None,
        };

        let record = assemble_record::<MessageKind>(&broken, &HashMap::new());
        assert_eq!(record.text, "hi");
        assert_eq!(record.wallet, "0xw");
        assert_eq!(record.created_at, "2024-02-02T00:00:00.000Z");
    }

    #[tokio::test]
    async fn test_merges_dedupes_and_sorts_across_partitions() {
        let store = InMemoryEntityStore::new();
        store.insert(message("m1", "beta", "first copy", "2024-01-01T00:00:00.000Z")).await;
        store.insert(message("m2", "beta", "newest", "2024-03-01T00:00:00.000Z")).await;
        store.insert(message("m1", "ns", "second copy", "2024-01-01T00:00:00.000Z")).await;
        store.insert(message("m3", "ns", "undated", "not a date")).await;
        store.insert(companion("c1", "ns", "m1", "0xhash1")).await;

        let outcome = read_records::<MessageKind>(&store, &partitions(&["beta", "ns"]))
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.records.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1", "m3"]);
        assert_eq!(outcome.records[1].text, "first copy");
        assert_eq!(outcome.records[1].tx_hash, "0xhash1");
        assert!(outcome.partition_errors.is_empty());
    }

    #[tokio::test]
    async fn test_failed_partition_is_isolated() {
        let store = InMemoryEntityStore::new();
        store.insert(message("m1", "ns", "survivor", "2024-01-01T00:00:00.000Z")).await;
        store.insert(message("m2", "beta", "lost", "2024-01-02T00:00:00.000Z")).await;
        store.fail_partition("beta").await;

        let outcome = read_records::<MessageKind>(&store, &partitions(&["beta", "ns"]))
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].text, "survivor");
        assert_eq!(outcome.partition_errors.len(), 2);
        assert!(outcome
            .partition_errors
            .iter()
            .all(|e| e.partition == "beta"));
    }

    #[tokio::test]
    async fn test_all_partitions_failing_is_an_error() {
        let store = InMemoryEntityStore::new();
        store.fail_partition("ns").await;

        let result = read_records::<SignatureKind>(&store, &partitions(&["ns"])).await;
        assert!(matches!(
            result,
            Err(ReadError::AllPartitionsFailed { record_type: "declaration_signature", .. })
        ));
    }

    #[tokio::test]
    async fn test_queries_each_partition_for_both_types() {
        let store = InMemoryEntityStore::new();
        read_records::<SignatureKind>(&store, &partitions(&["beta", "ns"]))
            .await
            .unwrap();
        assert_eq!(store.query_calls().await, 4);
    }
}
