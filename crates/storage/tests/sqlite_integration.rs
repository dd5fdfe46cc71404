use storage::repository::{KeyValueStore, PersistedValue, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrips_every_value_kind() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let learned = PersistedValue::TextList(vec!["1".into(), "4".into(), "9".into()]);
    repo.set("learnedKanjiIds", &learned).await.unwrap();
    repo.set("practiceStreak", &PersistedValue::Integer(3))
        .await
        .unwrap();
    repo.set("lastPracticeDay", &PersistedValue::Text("2026-03-01".into()))
        .await
        .unwrap();

    assert_eq!(repo.get("learnedKanjiIds").await.unwrap(), Some(learned));
    assert_eq!(
        repo.get("practiceStreak").await.unwrap(),
        Some(PersistedValue::Integer(3))
    );
    assert_eq!(
        repo.get("lastPracticeDay").await.unwrap(),
        Some(PersistedValue::Text("2026-03-01".into()))
    );
    assert_eq!(repo.get("totalPracticeTime").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_upsert_replaces_value_and_kind() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.set("totalPracticeTime", &PersistedValue::Text("oops".into()))
        .await
        .unwrap();
    repo.set("totalPracticeTime", &PersistedValue::Integer(12))
        .await
        .unwrap();

    let value = repo.get("totalPracticeTime").await.unwrap().unwrap();
    assert_eq!(value.as_integer(), Some(12));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(row.0, 1);
}

#[tokio::test]
async fn storage_sqlite_exposes_the_store() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .kv
        .set("practiceStreak", &PersistedValue::Integer(5))
        .await
        .unwrap();

    let value = storage.kv.get("practiceStreak").await.unwrap();
    assert_eq!(value, Some(PersistedValue::Integer(5)));
}
