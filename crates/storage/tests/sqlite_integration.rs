use mastery_core::model::LearnerId;
use storage::repository::ProgressRepository;
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_replaces_document() {
    let repo = connect("memdb_progress_roundtrip").await;
    let ana = LearnerId::new("ana").unwrap();

    assert_eq!(repo.load_progress(&ana).await.unwrap(), None);

    repo.save_progress(&ana, r#"{"numeros":{"unlockedLevel":1}}"#)
        .await
        .unwrap();
    repo.save_progress(&ana, r#"{"numeros":{"unlockedLevel":2}}"#)
        .await
        .unwrap();

    let stored = repo.load_progress(&ana).await.unwrap();
    assert_eq!(stored.as_deref(), Some(r#"{"numeros":{"unlockedLevel":2}}"#));
}

#[tokio::test]
async fn sqlite_keeps_one_slot_per_learner() {
    let repo = connect("memdb_progress_slots").await;
    let ana = LearnerId::new("ana").unwrap();
    let bruno = LearnerId::new("bruno").unwrap();

    repo.save_progress(&bruno, "{}").await.unwrap();
    repo.save_progress(&ana, "garbage").await.unwrap();

    assert_eq!(repo.list_learners().await.unwrap(), vec![ana.clone(), bruno.clone()]);
    // Stored bytes come back verbatim, even when they are not valid JSON.
    assert_eq!(repo.load_progress(&ana).await.unwrap().as_deref(), Some("garbage"));
    assert_eq!(repo.load_progress(&bruno).await.unwrap().as_deref(), Some("{}"));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_progress_migrate").await;
    repo.migrate().await.expect("second migrate");
    let ana = LearnerId::new("ana").unwrap();
    repo.save_progress(&ana, "{}").await.unwrap();
    assert!(repo.load_progress(&ana).await.unwrap().is_some());
}

#[tokio::test]
async fn connect_creates_a_missing_database_file() {
    let path = std::env::temp_dir().join(format!("mastery-progress-{}.sqlite3", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let repo = SqliteRepository::connect(&format!("sqlite://{}", path.display()))
        .await
        .expect("connect creates file");
    repo.migrate().await.expect("migrate");
    let ana = LearnerId::new("ana").unwrap();
    repo.save_progress(&ana, "{}").await.unwrap();

    assert!(path.exists());
    assert_eq!(repo.load_progress(&ana).await.unwrap().as_deref(), Some("{}"));

    drop(repo);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
