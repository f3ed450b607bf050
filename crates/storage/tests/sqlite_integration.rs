use sabelo_core::model::Progress;
use sabelo_core::progression::{apply_xp, complete_topic};
use sabelo_core::time::fixed_now;
use storage::repository::{PROGRESS_KEY, ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;

fn studied_progress() -> Progress {
    let mut progress = Progress::new();
    progress.set_username("Ana").unwrap();
    let (progress, _) = apply_xp(progress, 50, "Flashcards: Mayo", 1, fixed_now());
    let (progress, _) = apply_xp(progress, 100, "Cuestionario: Mayo", 1, fixed_now());
    complete_topic(progress)
}

#[tokio::test]
async fn sqlite_roundtrip_restores_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.load_progress().await.unwrap().is_none());

    let progress = studied_progress();
    repo.save_progress(&progress).await.unwrap();
    let loaded = repo.load_progress().await.unwrap().expect("stored progress");

    assert_eq!(loaded, progress);
    assert_eq!(loaded.topics_completed(), 1);
    assert!(loaded.badge("xp_130").unwrap().is_achieved());
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.save_progress(&Progress::new()).await.unwrap();
    let progress = studied_progress();
    repo.save_progress(&progress).await.unwrap();

    let loaded = repo.load_progress().await.unwrap().unwrap();
    assert_eq!(loaded.xp(), 150);
    assert_eq!(loaded.username(), Some("Ana"));
}

#[tokio::test]
async fn sqlite_corrupt_snapshot_is_reported() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.put_value(PROGRESS_KEY, "][").await.unwrap();
    assert!(matches!(
        repo.load_progress().await,
        Err(StorageError::Serialization(_))
    ));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_sqlite_wires_progress_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let progress = studied_progress();
    storage.progress.save_progress(&progress).await.unwrap();
    assert_eq!(
        storage.progress.load_progress().await.unwrap(),
        Some(progress)
    );
}
