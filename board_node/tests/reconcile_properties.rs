//! Property tests for the read-path merge: dedupe and ordering

use board_node::reconcile::{dedupe_first_seen, sort_newest_first, timestamp_millis};
use board_node::records::{Message, MessageKind};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;

fn message(id: u8, created_at: String, text: String) -> Message {
    Message {
        id: format!("0x{:02x}", id),
        text,
        wallet: String::new(),
        created_at,
        tx_hash: String::new(),
    }
}

fn timestamp() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => (0i64..4_000_000_000_000).prop_map(|millis| {
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
                .unwrap_or_default()
        }),
        1 => Just(String::new()),
        1 => "[a-z ]{1,12}",
    ]
}

fn messages() -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec((0u8..16, timestamp(), "[a-z]{0,6}"), 0..40).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, created_at, text)| message(id, created_at, text))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_dedupe_keeps_each_id_once_first_seen(records in messages()) {
        let deduped = dedupe_first_seen::<MessageKind>(records.clone());

        let ids: HashSet<&str> = deduped.iter().map(|m| m.id.as_str()).collect();
        prop_assert_eq!(ids.len(), deduped.len());

        let distinct: HashSet<&str> = records.iter().map(|m| m.id.as_str()).collect();
        prop_assert_eq!(distinct.len(), deduped.len());

        for kept in &deduped {
            let first = records.iter().find(|m| m.id == kept.id).unwrap();
            prop_assert_eq!(first, kept);
        }
    }

    #[test]
    fn prop_sort_is_descending_with_unparsable_last(records in messages()) {
        let mut sorted = records.clone();
        sort_newest_first::<MessageKind>(&mut sorted);

        prop_assert_eq!(sorted.len(), records.len());
        for pair in sorted.windows(2) {
            prop_assert!(timestamp_millis(&pair[0].created_at) >= timestamp_millis(&pair[1].created_at));
        }

        let first_unparsable = sorted.iter().position(|m| timestamp_millis(&m.created_at) == 0);
        if let Some(start) = first_unparsable {
            prop_assert!(sorted[start..].iter().all(|m| timestamp_millis(&m.created_at) <= 0));
        }
    }

    #[test]
    fn prop_sort_is_stable_for_equal_timestamps(texts in prop::collection::vec("[a-z]{1,4}", 1..10)) {
        let records: Vec<Message> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| message(i as u8, "2024-01-01T00:00:00.000Z".to_string(), text))
            .collect();

        let mut sorted = records.clone();
        sort_newest_first::<MessageKind>(&mut sorted);
        prop_assert_eq!(sorted, records);
    }
}
