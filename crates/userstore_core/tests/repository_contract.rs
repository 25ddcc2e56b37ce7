//! Behaviour every backend must share with the RAM baseline.

use std::sync::Arc;
use tempfile::TempDir;
use userstore_core::{
    BackendKind, Entity, EntityFactory, EntityValidationError, RamRepository, RepoError, Repository, SlotLayout,
    SlotRepository, SqliteRepository, UserFactory,
};

struct Fixture {
    factory: Arc<UserFactory>,
    repo: Box<dyn Repository>,
    _dir: Option<TempDir>,
}

impl Fixture {
    fn user(&self, id: i64, title: &str) -> Entity {
        self.factory.create_user(id, title).unwrap()
    }
}

fn fixture(kind: BackendKind) -> Fixture {
    let factory = Arc::new(UserFactory::new());
    let mut dir = None;
    let repo: Box<dyn Repository> = match kind {
        BackendKind::Ram => Box::new(RamRepository::new()),
        BackendKind::Slots => Box::new(
            SlotRepository::new(
                factory.clone(),
                SlotLayout {
                    max_records: 16,
                    record_width: 64,
                },
            )
            .unwrap(),
        ),
        BackendKind::Sqlite => {
            let tmp = tempfile::tempdir().unwrap();
            let repo =
                SqliteRepository::new(factory.clone(), tmp.path().join("users.sqlite3")).unwrap();
            dir = Some(tmp);
            Box::new(repo)
        }
    };
    Fixture {
        factory,
        repo,
        _dir: dir,
    }
}

fn for_each_backend(check: impl Fn(BackendKind, &Fixture)) {
    for kind in BackendKind::ALL {
        let fixture = fixture(kind);
        assert_eq!(fixture.repo.backend_kind(), kind);
        check(kind, &fixture);
    }
}

fn titles(repo: &dyn Repository) -> Vec<(i64, String)> {
    repo.list()
        .unwrap()
        .into_iter()
        .map(|entity| (entity.id(), entity.property("title").unwrap().to_string()))
        .collect()
}

#[test]
fn add_then_get_round_trips() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(3, "Anna Akhmatova")).unwrap();

        let loaded = fx.repo.get(3).unwrap().expect("stored entity");
        assert_eq!(loaded, fx.user(3, "Anna Akhmatova"), "backend={kind}");
    });
}

#[test]
fn get_missing_returns_none() {
    for_each_backend(|kind, fx| {
        assert!(fx.repo.get(9).unwrap().is_none(), "backend={kind}");
    });
}

#[test]
fn list_on_empty_store_is_empty() {
    for_each_backend(|kind, fx| {
        assert!(fx.repo.list().unwrap().is_empty(), "backend={kind}");
    });
}

#[test]
fn second_add_with_same_id_conflicts_without_mutation() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(1, "first")).unwrap();
        let err = fx.repo.add(&fx.user(1, "second")).unwrap_err();

        assert!(matches!(err, RepoError::Conflict(1)), "backend={kind}: {err}");
        assert_eq!(titles(fx.repo.as_ref()), vec![(1, "first".to_string())]);
    });
}

#[test]
fn delete_then_get_returns_none() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(4, "Ivan Turgenev")).unwrap();
        fx.repo.delete(4).unwrap();

        assert!(fx.repo.get(4).unwrap().is_none(), "backend={kind}");
        assert!(fx.repo.list().unwrap().is_empty(), "backend={kind}");
    });
}

#[test]
fn delete_missing_reports_not_found() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(1, "kept")).unwrap();
        let err = fx.repo.delete(2).unwrap_err();

        assert!(matches!(err, RepoError::NotFound(2)), "backend={kind}: {err}");
        assert_eq!(titles(fx.repo.as_ref()), vec![(1, "kept".to_string())]);
    });
}

#[test]
fn update_replaces_existing_entity() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(1, "A")).unwrap();
        assert_eq!(fx.repo.get(1).unwrap().unwrap().property("title"), Some("A"));

        fx.repo.update(&fx.user(1, "B")).unwrap();
        assert_eq!(
            fx.repo.get(1).unwrap().unwrap().property("title"),
            Some("B"),
            "backend={kind}"
        );
    });
}

#[test]
fn update_missing_is_not_an_upsert() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(1, "only")).unwrap();
        let err = fx.repo.update(&fx.user(5, "ghost")).unwrap_err();

        assert!(matches!(err, RepoError::NotFound(5)), "backend={kind}: {err}");
        assert!(fx.repo.get(5).unwrap().is_none());
        assert_eq!(titles(fx.repo.as_ref()), vec![(1, "only".to_string())]);
    });
}

#[test]
fn sentinel_entity_is_never_stored() {
    for_each_backend(|kind, fx| {
        let sentinel = fx.factory.create_empty();
        let err = fx.repo.add(sentinel).unwrap_err();
        assert!(
            matches!(err, RepoError::Validation(EntityValidationError::ReservedId)),
            "backend={kind}: {err}"
        );
        assert!(fx.repo.list().unwrap().is_empty(), "backend={kind}");
        assert!(fx.repo.get(sentinel.id()).unwrap().is_none(), "backend={kind}");
    });
}

#[test]
fn sentinel_entity_cannot_overwrite_via_update() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(2, "kept")).unwrap();
        let err = fx.repo.update(fx.factory.create_empty()).unwrap_err();

        assert!(
            matches!(err, RepoError::Validation(EntityValidationError::ReservedId)),
            "backend={kind}: {err}"
        );
        assert_eq!(titles(fx.repo.as_ref()), vec![(2, "kept".to_string())]);
    });
}

#[test]
fn empty_title_is_stored_and_distinct_from_absence() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(2, "")).unwrap();

        let loaded = fx.repo.get(2).unwrap().expect("empty title must be stored");
        assert_eq!(loaded.property("title"), Some(""), "backend={kind}");
        assert_eq!(fx.repo.list().unwrap().len(), 1);
    });
}

#[test]
fn cross_backend_scenario_converges_on_same_state() {
    for_each_backend(|kind, fx| {
        fx.repo.add(&fx.user(1, "Pyotr Pervy")).unwrap();
        fx.repo.add(&fx.user(2, "Aleksandr Pushkin")).unwrap();
        assert_eq!(fx.repo.list().unwrap().len(), 2, "backend={kind}");

        fx.repo.update(&fx.user(2, "A.S. Pushkin")).unwrap();
        fx.repo.delete(1).unwrap();

        let remaining = fx.repo.list().unwrap();
        assert_eq!(remaining.len(), 1, "backend={kind}");
        assert_eq!(
            serde_json::Value::Object(fx.factory.to_dict(&remaining[0])),
            serde_json::json!({"id": 2, "title": "A.S. Pushkin"}),
            "backend={kind}"
        );
    });
}

#[test]
fn repositories_are_shareable_across_threads() {
    for_each_backend(|kind, fx| {
        std::thread::scope(|scope| {
            for id in 1..=8 {
                let repo = fx.repo.as_ref();
                let user = fx.user(id, "worker");
                scope.spawn(move || repo.add(&user).unwrap());
            }
        });
        assert_eq!(fx.repo.list().unwrap().len(), 8, "backend={kind}");
    });
}

#[test]
fn concurrent_adds_of_one_id_store_exactly_one_record() {
    for_each_backend(|kind, fx| {
        let outcomes: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..6)
                .map(|n| {
                    let repo = fx.repo.as_ref();
                    let user = fx.user(3, &format!("racer-{n}"));
                    scope.spawn(move || repo.add(&user).is_ok())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1, "backend={kind}");
        assert_eq!(fx.repo.list().unwrap().len(), 1, "backend={kind}");
    });
}
