use tg_storage::{InMemoryKvStore, KvStore};

#[tokio::test]
async fn set_get_delete() {
    let kv = InMemoryKvStore::new();
    kv.set("a", "1", None).await.expect("set");
    kv.set("b", "2", Some(60)).await.expect("set");
    assert_eq!(kv.get("a").await.expect("get").as_deref(), Some("1"));
    assert_eq!(kv.ttl_seconds("a").await.expect("ttl"), None);
    let ttl = kv.ttl_seconds("b").await.expect("ttl").expect("has ttl");
    assert!((59..=60).contains(&ttl));

    kv.delete(&["a".to_string(), "missing".to_string()])
        .await
        .expect("delete");
    assert!(kv.get("a").await.expect("get").is_none());
    assert_eq!(kv.len(), 1);
}

#[tokio::test]
async fn push_capped_keeps_newest_first() {
    let kv = InMemoryKvStore::new();
    for item in ["one", "two", "three"] {
        kv.push_capped("logs", item, 2, Some(120)).await.expect("push");
    }
    let items = kv.list("logs").await.expect("list");
    assert_eq!(items, vec!["three".to_string(), "two".to_string()]);
    let ttl = kv.ttl_seconds("logs").await.expect("ttl").expect("has ttl");
    assert!((119..=120).contains(&ttl));
}

#[tokio::test]
async fn wrong_type_is_an_error() {
    let kv = InMemoryKvStore::new();
    kv.push_capped("logs", "x", 10, None).await.expect("push");
    assert!(kv.get("logs").await.is_err());
    kv.set("plain", "x", None).await.expect("set");
    assert!(kv.list("plain").await.is_err());
}

#[tokio::test]
async fn unrepresentable_ttl_means_no_expiry() {
    let kv = InMemoryKvStore::new();
    kv.set("far", "x", Some(u64::MAX)).await.expect("set");
    assert_eq!(kv.get("far").await.expect("get").as_deref(), Some("x"));
    assert_eq!(kv.ttl_seconds("far").await.expect("ttl"), None);

    kv.push_capped("logs", "x", 10, Some(u64::MAX)).await.expect("push");
    assert_eq!(kv.list("logs").await.expect("list"), vec!["x".to_string()]);
    assert_eq!(kv.ttl_seconds("logs").await.expect("ttl"), None);
}
