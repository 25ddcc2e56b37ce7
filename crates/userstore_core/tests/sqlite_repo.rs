use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;
use userstore_core::{
    db::DbError, CacheStats, RepoError, Repository, SqliteRepository, UserFactory,
};

fn sqlite_repo() -> (TempDir, Arc<UserFactory>, SqliteRepository) {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(UserFactory::new());
    let repo = SqliteRepository::new(factory.clone(), dir.path().join("users.sqlite3")).unwrap();
    (dir, factory, repo)
}

#[test]
fn construction_creates_users_table() {
    let (_dir, _factory, repo) = sqlite_repo();
    assert_eq!(repo.table(), "users");

    let conn = Connection::open(repo.path()).unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn construction_discards_rows_from_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.sqlite3");
    let factory = Arc::new(UserFactory::new());

    let first = SqliteRepository::new(factory.clone(), &path).unwrap();
    first.add(&factory.create_user(1, "stale").unwrap()).unwrap();
    drop(first);

    let second = SqliteRepository::new(factory, &path).unwrap();
    assert!(second.list().unwrap().is_empty());
}

#[test]
fn get_is_served_from_cache_after_first_read() {
    let (_dir, factory, repo) = sqlite_repo();
    repo.add(&factory.create_user(1, "A").unwrap()).unwrap();

    repo.get(1).unwrap();
    repo.get(1).unwrap();
    repo.get(1).unwrap();

    assert_eq!(repo.cache_stats().unwrap(), CacheStats { hits: 2, misses: 1 });
    assert_eq!(repo.cache_len().unwrap(), 1);
}

#[test]
fn update_invalidates_cached_value() {
    let (_dir, factory, repo) = sqlite_repo();
    repo.add(&factory.create_user(1, "A").unwrap()).unwrap();
    assert_eq!(repo.get(1).unwrap().unwrap().property("title"), Some("A"));

    repo.update(&factory.create_user(1, "B").unwrap()).unwrap();
    assert_eq!(repo.cache_len().unwrap(), 0);
    assert_eq!(repo.get(1).unwrap().unwrap().property("title"), Some("B"));
}

#[test]
fn cached_absence_is_invalidated_by_add() {
    let (_dir, factory, repo) = sqlite_repo();
    assert!(repo.get(7).unwrap().is_none());

    repo.add(&factory.create_user(7, "late").unwrap()).unwrap();
    assert_eq!(repo.get(7).unwrap().unwrap().property("title"), Some("late"));
}

#[test]
fn delete_invalidates_cached_value() {
    let (_dir, factory, repo) = sqlite_repo();
    repo.add(&factory.create_user(1, "A").unwrap()).unwrap();
    repo.get(1).unwrap();

    repo.delete(1).unwrap();
    assert!(repo.get(1).unwrap().is_none());
}

#[test]
fn failed_write_still_clears_cache() {
    let (_dir, factory, repo) = sqlite_repo();
    repo.add(&factory.create_user(1, "A").unwrap()).unwrap();
    repo.get(1).unwrap();
    assert_eq!(repo.cache_len().unwrap(), 1);

    let err = repo.delete(2).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(2)));
    assert_eq!(repo.cache_len().unwrap(), 0);
}

#[test]
fn list_is_never_cached() {
    let (_dir, factory, repo) = sqlite_repo();
    repo.add(&factory.create_user(1, "A").unwrap()).unwrap();
    assert_eq!(repo.list().unwrap().len(), 1);

    // Another process writing the same file is visible on the next list.
    let conn = Connection::open(repo.path()).unwrap();
    conn.execute("INSERT INTO users (id, title) VALUES (2, 'B');", [])
        .unwrap();

    assert_eq!(repo.list().unwrap().len(), 2);
    assert_eq!(repo.cache_len().unwrap(), 0);
}

#[test]
fn titles_are_bound_not_interpolated() {
    let (_dir, factory, repo) = sqlite_repo();
    let hostile = "x'); DROP TABLE users; --";
    repo.add(&factory.create_user(1, hostile).unwrap()).unwrap();

    assert_eq!(repo.get(1).unwrap().unwrap().property("title"), Some(hostile));
    assert_eq!(repo.list().unwrap().len(), 1);
}

#[test]
fn title_longer_than_column_is_rejected() {
    let (_dir, factory, repo) = sqlite_repo();
    let long_title = "a".repeat(256);
    let err = repo
        .add(&factory.create_user(1, long_title).unwrap())
        .unwrap_err();

    assert!(matches!(err, RepoError::RecordTooLarge { id: 1, len: 256, max: 255 }));
    assert!(repo.list().unwrap().is_empty());
}

#[test]
fn unavailable_database_is_an_error_not_an_empty_result() {
    let (dir, _factory, repo) = sqlite_repo();
    let path = repo.path().to_path_buf();
    drop(dir);
    assert!(!path.exists());

    // The parent directory is gone, so the connection cannot be opened.
    let err = repo.list().unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))), "{err}");
    let err = repo.get(1).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)), "{err}");
    assert_eq!(repo.cache_len().unwrap(), 0);
}

#[test]
fn missing_database_directory_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(UserFactory::new());
    let err = SqliteRepository::new(factory, dir.path().join("absent").join("users.sqlite3"))
        .err()
        .expect("construction must fail");
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn corrupt_persisted_row_is_reported_as_invalid_data() {
    let (_dir, _factory, repo) = sqlite_repo();
    let conn = Connection::open(repo.path()).unwrap();
    conn.execute("INSERT INTO users (id, title) VALUES (-1, 'sentinel');", [])
        .unwrap();

    let err = repo.get(-1).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)), "{err}");
}
