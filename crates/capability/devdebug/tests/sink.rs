use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tg_devdebug::{
    DebugConfig, DebugLogEntry, DebugLogSink, LogAction, LogDirection, LogOutcome, logs_key,
};
use tg_storage::{InMemoryKvStore, KvStore};

fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_opt(2_000, 0).single().expect("valid timestamp")
}

fn sink(kv: Arc<InMemoryKvStore>) -> DebugLogSink {
    DebugLogSink::with_clock(kv, Arc::new(fixed_now))
}

fn publish_entry(payload: &[u8]) -> DebugLogEntry {
    DebugLogEntry::new(LogDirection::Up, LogAction::Publish, LogOutcome::Ok)
        .client("c1", "u1")
        .topic("t")
        .payload(payload)
}

#[tokio::test]
async fn no_config_is_not_written() {
    let kv = Arc::new(InMemoryKvStore::new());
    let sink = sink(kv.clone());
    let wrote = sink.write("dev1", publish_entry(b"x")).await.expect("write");
    assert!(!wrote);
    assert!(kv.list(&logs_key("dev1")).await.expect("list").is_empty());
}

#[tokio::test]
async fn expired_or_disabled_config_is_not_written() {
    let kv = Arc::new(InMemoryKvStore::new());
    let sink = sink(kv.clone());
    sink.set_config(
        "dev1",
        &DebugConfig {
            enabled: true,
            expire_at: 1_999,
            max_items: 10,
            payload_max_bytes: 10,
        },
    )
    .await
    .expect("set config");
    sink.set_config(
        "dev2",
        &DebugConfig {
            enabled: false,
            expire_at: 0,
            max_items: 10,
            payload_max_bytes: 10,
        },
    )
    .await
    .expect("set config");

    assert!(!sink.write("dev1", publish_entry(b"x")).await.expect("write"));
    assert!(!sink.write("dev2", publish_entry(b"x")).await.expect("write"));
    assert!(kv.list(&logs_key("dev1")).await.expect("list").is_empty());
    assert!(kv.list(&logs_key("dev2")).await.expect("list").is_empty());
}

#[tokio::test]
async fn truncates_trims_and_sets_ttl() {
    let kv = Arc::new(InMemoryKvStore::new());
    let sink = sink(kv.clone());
    sink.set_config(
        "dev1",
        &DebugConfig {
            enabled: true,
            expire_at: 2_060,
            max_items: 2,
            payload_max_bytes: 5,
        },
    )
    .await
    .expect("set config");

    for index in 0..3 {
        let entry = publish_entry(b"abcdefghij").meta("seq", index);
        assert!(sink.write("dev1", entry).await.expect("write"));
    }

    let entries = sink.entries("dev1").await.expect("entries");
    assert_eq!(entries.len(), 2);
    let seqs: Vec<i64> = entries
        .iter()
        .filter_map(|entry| entry.meta.get("seq").and_then(|value| value.as_i64()))
        .collect();
    assert_eq!(seqs, vec![2, 1]);

    let newest = &entries[0];
    assert_eq!(newest.payload, "abcde");
    assert_eq!(newest.meta.get("payload_truncated"), Some(&serde_json::Value::Bool(true)));
    assert_eq!(newest.device_id, "dev1");
    assert_eq!(newest.protocol, "mqtt");
    assert_eq!(newest.ts, "1970-01-01T00:33:20.000000000Z");

    // (2060 - 2000) + 600
    let ttl = kv
        .ttl_seconds(&logs_key("dev1"))
        .await
        .expect("ttl")
        .expect("has ttl");
    assert!((655..=660).contains(&ttl), "ttl = {ttl}");
}

#[tokio::test]
async fn zero_payload_limit_drops_payload() {
    let kv = Arc::new(InMemoryKvStore::new());
    let sink = sink(kv.clone());
    sink.set_config(
        "dev1",
        &DebugConfig {
            enabled: true,
            expire_at: 0,
            max_items: 0,
            payload_max_bytes: 0,
        },
    )
    .await
    .expect("set config");

    assert!(sink.write("dev1", publish_entry(b"secret")).await.expect("write"));
    let entries = sink.entries("dev1").await.expect("entries");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].payload.is_empty());
    assert!(!entries[0].meta.contains_key("payload_truncated"));
    assert_eq!(kv.ttl_seconds(&logs_key("dev1")).await.expect("ttl"), None);
}

#[tokio::test]
async fn serialized_shape() {
    let entry = DebugLogEntry::new(LogDirection::Na, LogAction::Auth, LogOutcome::Denied)
        .client("c1", "u1")
        .error("bad credentials");
    let value = serde_json::to_value(&entry).expect("encode");
    assert_eq!(value["direction"], "na");
    assert_eq!(value["action"], "auth");
    assert_eq!(value["outcome"], "denied");
    assert_eq!(value["error"], "bad credentials");
    assert_eq!(value["meta"]["client_id"], "c1");
    assert!(value.get("payload").is_none());
}

#[tokio::test]
async fn far_future_expiry_is_written_without_overflow() {
    let kv = Arc::new(InMemoryKvStore::new());
    let sink = sink(kv.clone());
    sink.set_config(
        "dev1",
        &DebugConfig {
            enabled: true,
            expire_at: i64::MAX,
            max_items: 10,
            payload_max_bytes: 10,
        },
    )
    .await
    .expect("set config");

    assert!(sink.write("dev1", publish_entry(b"x")).await.expect("write"));
    assert_eq!(sink.entries("dev1").await.expect("entries").len(), 1);
}
