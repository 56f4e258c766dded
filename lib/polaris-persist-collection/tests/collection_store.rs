#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Requires a reachable Postgres. Set `TEST_POSTGRES_HOST`, `TEST_POSTGRES_PORT`,
//! `TEST_POSTGRES_DB`, `TEST_POSTGRES_USER` and `TEST_POSTGRES_PASSWORD`;
//! every test is skipped otherwise.

use std::time::Duration;

use chrono::NaiveDateTime;
use polaris_persist::{CollectionConfig, Model, PersistError, Store};
use polaris_persist_collection::{Collection, CollectionStore};

#[allow(dead_code)]
#[derive(Model)]
struct Profile {
    #[column]
    email: String,
    #[column]
    age: i32,
    #[column(kind = "json")]
    settings: serde_json::Value,
    avatar: Vec<u8>,
}

#[allow(dead_code)]
#[derive(Model)]
#[model(name = "Profile")]
struct ProfileV2 {
    #[column]
    email: String,
    #[column]
    age: i64,
    #[column(kind = "json")]
    settings: serde_json::Value,
    #[column]
    last_seen: Option<NaiveDateTime>,
}

#[allow(dead_code)]
#[derive(Model)]
struct Keyed {
    #[column]
    id: String,
    #[column]
    label: String,
}

fn config_from_env() -> Option<CollectionConfig> {
    let host = std::env::var("TEST_POSTGRES_HOST").ok()?;
    let port = std::env::var("TEST_POSTGRES_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5432);
    let database = std::env::var("TEST_POSTGRES_DB").ok()?;
    let user = std::env::var("TEST_POSTGRES_USER").ok()?;
    let password = std::env::var("TEST_POSTGRES_PASSWORD").unwrap_or_default();
    Some(
        CollectionConfig::new(host, port, database, user, password)
            .with_timeout(Duration::from_secs(10)),
    )
}

async fn connected() -> Option<CollectionStore> {
    let Some(config) = config_from_env() else {
        eprintln!("Skipping test: TEST_POSTGRES_HOST/DB/USER not set");
        return None;
    };
    let mut store = CollectionStore::new(config);
    store.connect().await.unwrap();
    Some(store)
}

async fn drop_table(store: &CollectionStore, name: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\"", name))
        .execute(store.pool().unwrap())
        .await
        .unwrap();
}

fn column_names(columns: &[polaris_persist_collection::ColumnInfo]) -> Vec<&str> {
    columns.iter().map(|c| c.name.as_str()).collect()
}

#[tokio::test]
async fn test_collection_creates_table_with_id_and_tagged_fields() {
    let Some(store) = connected().await else {
        return;
    };
    drop_table(&store, "colltest_profiles").await;

    let profiles = store
        .collection("colltest_profiles", Profile::schema())
        .await
        .unwrap();
    assert_eq!(profiles.name(), "colltest_profiles");
    assert!(profiles.exists().await.unwrap());

    let columns = profiles.columns().await.unwrap();
    assert_eq!(column_names(&columns), vec!["id", "email", "age", "settings"]);
    let types: Vec<&str> = columns.iter().map(|c| c.data_type.as_str()).collect();
    assert_eq!(
        types,
        vec!["character varying", "character varying", "integer", "jsonb"]
    );

    drop_table(&store, "colltest_profiles").await;
}

#[tokio::test]
async fn test_collection_evolves_additively() {
    let Some(store) = connected().await else {
        return;
    };
    drop_table(&store, "colltest_evolve").await;

    store
        .collection("colltest_evolve", Profile::schema())
        .await
        .unwrap();
    sqlx::query("INSERT INTO \"colltest_evolve\" (id, email, age) VALUES ('p1', 'a@b.c', 30)")
        .execute(store.pool().unwrap())
        .await
        .unwrap();

    let evolved = store
        .collection("colltest_evolve", ProfileV2::schema())
        .await
        .unwrap();
    let columns = evolved.columns().await.unwrap();
    assert_eq!(
        column_names(&columns),
        vec!["id", "email", "age", "settings", "last_seen"]
    );
    // `age` keeps its original type even though the new model declares i64.
    assert_eq!(columns[2].data_type, "integer");
    assert_eq!(columns[4].data_type, "timestamp without time zone");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM \"colltest_evolve\"")
        .fetch_one(evolved.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Going back to the narrower model drops nothing.
    let again = store
        .collection("colltest_evolve", Profile::schema())
        .await
        .unwrap();
    assert_eq!(again.columns().await.unwrap().len(), 5);

    drop_table(&store, "colltest_evolve").await;
}

#[tokio::test]
async fn test_id_field_does_not_duplicate_key_column() {
    let Some(store) = connected().await else {
        return;
    };
    drop_table(&store, "colltest_keyed").await;

    let keyed = store
        .collection("colltest_keyed", Keyed::schema())
        .await
        .unwrap();
    assert_eq!(
        column_names(&keyed.columns().await.unwrap()),
        vec!["id", "label"]
    );

    drop_table(&store, "colltest_keyed").await;
}

#[tokio::test]
async fn test_bucket_prefixes_collection_names() {
    let Some(store) = connected().await else {
        return;
    };
    drop_table(&store, "colltest_acme_profiles").await;

    let bucket = store.new_bucket("colltest_acme").unwrap();
    let scoped = bucket
        .collection("profiles", Profile::schema())
        .await
        .unwrap();
    assert_eq!(scoped.name(), "colltest_acme_profiles");
    assert!(scoped.exists().await.unwrap());

    drop_table(&store, "colltest_acme_profiles").await;
}

#[tokio::test]
async fn test_collections_lists_existing_tables() {
    let Some(store) = connected().await else {
        return;
    };
    drop_table(&store, "colltest_listed").await;

    store
        .collection("colltest_listed", Profile::schema())
        .await
        .unwrap();
    let listed: Vec<Collection> = store.collections().await.unwrap();
    assert!(listed.iter().any(|c| c.name() == "colltest_listed"));

    drop_table(&store, "colltest_listed").await;
    let listed = store.collections().await.unwrap();
    assert!(!listed.iter().any(|c| c.name() == "colltest_listed"));
}

#[tokio::test]
async fn test_concurrent_collection_calls_converge() {
    let Some(store) = connected().await else {
        return;
    };
    drop_table(&store, "colltest_race").await;

    let (a, b, c) = tokio::join!(
        store.collection("colltest_race", Profile::schema()),
        store.collection("colltest_race", ProfileV2::schema()),
        store.collection("colltest_race", Profile::schema()),
    );
    a.unwrap();
    b.unwrap();
    let c = c.unwrap();
    assert_eq!(
        column_names(&c.columns().await.unwrap()),
        vec!["id", "email", "age", "settings", "last_seen"]
    );

    drop_table(&store, "colltest_race").await;
}

#[tokio::test]
async fn test_connect_twice_is_noop() {
    let Some(mut store) = connected().await else {
        return;
    };
    store.connect().await.unwrap();
    assert!(store.is_connected());
    store.test_connection().await.unwrap();
}

#[tokio::test]
async fn test_invalid_name_rejected_after_connect() {
    let Some(store) = connected().await else {
        return;
    };
    let result = store.collection("bad name", Profile::schema()).await;
    assert!(matches!(result, Err(PersistError::InvalidIdentifier(_))));
}

#[tokio::test]
async fn test_connect_failure_leaves_store_disconnected() {
    let config = CollectionConfig::new("127.0.0.1", 1, "nope", "nope", "nope")
        .with_timeout(Duration::from_secs(5));
    let mut store = CollectionStore::new(config);
    let result = store.connect().await;
    assert!(matches!(
        result,
        Err(PersistError::ConnectionError(_)) | Err(PersistError::Timeout(_))
    ));
    assert!(!store.is_connected());
}
