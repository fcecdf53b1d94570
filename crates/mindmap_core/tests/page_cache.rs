use mindmap_core::db::migrations::latest_version;
use mindmap_core::service::cache_key;
use mindmap_core::{
    open_db, open_db_in_memory, parse_records_json, CacheError, CachedBatch, CollectionKind,
    DbError, InMemoryPageCache, MapService, NodeId, PageCache, RawRecord, ServiceConfig,
    ServiceError, SqlitePageCache,
};
use rusqlite::params;
use std::time::Duration;

fn problems() -> Vec<RawRecord> {
    parse_records_json(
        r#"[
            {"id": "p-root", "properties": {"Name": {"title": [{"plain_text": "Root"}]}}},
            {"id": "p-1", "properties": {
                "Name": {"title": [{"plain_text": "One"}]},
                "Parent Problem": {"relation": [{"id": "p-root"}]}
            }},
            {"id": "p-2", "properties": {
                "Name": {"title": [{"plain_text": "Two"}]},
                "Parent Problem": {"relation": [{"id": "p-root"}]}
            }}
        ]"#,
    )
    .unwrap()
}

fn objectives() -> Vec<RawRecord> {
    parse_records_json(
        r#"{"results": [
            {"id": "o-1", "properties": {
                "Name": {"title": [{"plain_text": "Ship it"}]},
                "Problems": {"relation": [{"id": "p-2"}, {"id": "p-missing"}]}
            }}
        ], "has_more": false, "next_cursor": null}"#,
    )
    .unwrap()
}

#[test]
fn sqlite_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.sqlite3");
    let batch = CachedBatch {
        records: problems(),
        fetched_at_ms: 1_700_000_000_000,
    };

    {
        let conn = open_db(&path).unwrap();
        SqlitePageCache::new(&conn)
            .put("problems", &batch, None)
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let cache = SqlitePageCache::new(&conn);
    assert_eq!(cache.get("problems").unwrap(), Some(batch));
    assert_eq!(cache.get("objectives").unwrap(), None);

    cache.remove("problems").unwrap();
    assert_eq!(cache.get("problems").unwrap(), None);
}

#[test]
fn sqlite_cache_put_replaces_existing_entry() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqlitePageCache::new(&conn);
    cache
        .put("k", &CachedBatch::fetched_now(problems()), None)
        .unwrap();
    cache
        .put("k", &CachedBatch::fetched_now(Vec::new()), None)
        .unwrap();

    assert!(cache.get("k").unwrap().unwrap().records.is_empty());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM page_cache;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn expired_entries_read_as_missing_and_purge() {
    let conn = open_db_in_memory().unwrap();
    let cache = SqlitePageCache::new(&conn);
    let batch = CachedBatch::fetched_now(problems());
    cache.put("stale", &batch, Some(Duration::ZERO)).unwrap();
    cache
        .put("fresh", &batch, Some(Duration::from_secs(3600)))
        .unwrap();

    assert_eq!(cache.get("stale").unwrap(), None);
    assert!(cache.get("fresh").unwrap().is_some());
    assert_eq!(cache.purge_expired().unwrap(), 1);
}

#[test]
fn corrupt_payload_is_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO page_cache (cache_key, payload, fetched_at, expires_at) VALUES (?1, ?2, ?3, NULL);",
        params!["broken", "{not json", 1_i64],
    )
    .unwrap();

    let err = SqlitePageCache::new(&conn).get("broken").unwrap_err();
    assert!(matches!(err, CacheError::InvalidData(_)));
}

#[test]
fn newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", latest_version() + 1)
            .unwrap();
    }
    assert!(matches!(
        open_db(&path),
        Err(DbError::UnsupportedSchemaVersion { .. })
    ));
}

#[test]
fn cached_batch_rebuilds_the_same_node_map() {
    let service = MapService::new(InMemoryPageCache::new(), ServiceConfig::default()).unwrap();
    let fresh = service.ingest(CollectionKind::Problems, &problems()).unwrap();
    let cached = service
        .load_cached(CollectionKind::Problems)
        .unwrap()
        .unwrap();

    assert_eq!(fresh, cached);
    assert_eq!(
        fresh.get("proot").unwrap().children,
        vec![NodeId::new("p-1"), NodeId::new("p-2")]
    );
    assert!(service
        .cache()
        .get(&cache_key(CollectionKind::Problems))
        .unwrap()
        .is_some());
}

#[test]
fn service_builds_objectives_roadmap_with_related_problems() {
    let conn = open_db_in_memory().unwrap();
    let service = MapService::new(
        SqlitePageCache::new(&conn),
        ServiceConfig {
            cache_ttl_secs: Some(600),
            ..ServiceConfig::default()
        },
    )
    .unwrap();

    service.ingest(CollectionKind::Problems, &problems()).unwrap();
    let objectives = service
        .ingest(CollectionKind::Objectives, &objectives())
        .unwrap();

    let related = service.related_nodes(&objectives).unwrap();
    let ids: Vec<&str> = related.ids().iter().map(NodeId::as_str).collect();
    assert_eq!(ids, vec!["p2"]);
    assert!(related.values().all(|node| !node.is_objective));

    let tree = service.tree(CollectionKind::Objectives, &objectives, None);
    assert_eq!(tree.root, Some(NodeId::new("o-1")));

    let config = mindmap_core::LayoutConfig::for_kind(mindmap_core::LayoutKind::Temporal);
    let result = service.layout(&tree, config, Some(&related)).unwrap();
    assert!(result.contains("o1"));
    assert!(result.contains("p2"));
    assert!(!result.contains("proot"));
}

#[test]
fn service_surfaces_layout_configuration_errors() {
    let service = MapService::new(InMemoryPageCache::new(), ServiceConfig::default()).unwrap();
    let nodes = service.ingest(CollectionKind::Problems, &problems()).unwrap();
    let tree = service.tree(CollectionKind::Problems, &nodes, None);

    let mut config = mindmap_core::LayoutConfig::default();
    config.spacing.primary = 0.0;
    assert!(matches!(
        service.layout(&tree, config, None),
        Err(ServiceError::Layout(_))
    ));
}
