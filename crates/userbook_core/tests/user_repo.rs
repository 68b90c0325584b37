use rusqlite::Connection;
use userbook_core::db::migrations::latest_version;
use userbook_core::db::open_db_in_memory;
use userbook_core::{
    AgeValue, EmailLookup, RepoError, SqliteUserRepository, UserDraft, UserField, UserFilter,
    UserPatch, UserRepository,
};
use uuid::Uuid;

fn draft(name: &str, age: i64, email: &str, address: Option<&str>) -> UserDraft {
    UserDraft {
        name: Some(name.to_string()),
        age: Some(AgeValue::Value(age)),
        email: Some(email.to_string()),
        address: address.map(str::to_string),
    }
}

#[test]
fn insert_assigns_id_and_get_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let created = repo
        .insert_user(&draft("Alice", 30, "alice@example.com", Some("Hanoi")))
        .unwrap();

    let loaded = repo.get_user(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.address.as_deref(), Some("Hanoi"));
}

#[test]
fn insert_rejects_invalid_fields_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo
        .insert_user(&draft("A", -5, "nope", None))
        .unwrap_err();

    match err {
        RepoError::Validation(validation) => {
            assert!(validation.has_field(UserField::Name));
            assert!(validation.has_field(UserField::Age));
            assert!(validation.has_field(UserField::Email));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(repo.count_users(&UserFilter::All).unwrap(), 0);
}

#[test]
fn unique_index_reports_duplicate_email() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.insert_user(&draft("Al", 30, "a@b.com", None)).unwrap();
    let err = repo
        .insert_user(&draft("Bo", 31, "a@b.com", None))
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateEmail));
    assert_eq!(repo.count_users(&UserFilter::All).unwrap(), 1);
}

#[test]
fn email_uniqueness_is_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.insert_user(&draft("Al", 30, "a@b.com", None)).unwrap();
    repo.insert_user(&draft("Al", 30, "A@b.com", None)).unwrap();

    assert_eq!(repo.count_users(&UserFilter::All).unwrap(), 2);
}

#[test]
fn find_one_matches_exact_email_and_honors_exclusion() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = repo.insert_user(&draft("Al", 30, "a@b.com", None)).unwrap();

    let hit = repo
        .find_one(&EmailLookup {
            email: "a@b.com",
            exclude_id: None,
        })
        .unwrap();
    assert_eq!(hit.map(|found| found.id), Some(user.id));

    let excluded = repo
        .find_one(&EmailLookup {
            email: "a@b.com",
            exclude_id: Some(user.id),
        })
        .unwrap();
    assert!(excluded.is_none());

    let substring = repo
        .find_one(&EmailLookup {
            email: "b.com",
            exclude_id: None,
        })
        .unwrap();
    assert!(substring.is_none());
}

#[test]
fn update_merges_patch_and_revalidates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = repo
        .insert_user(&draft("Alice", 30, "alice@example.com", Some("Hue")))
        .unwrap();

    let updated = repo
        .update_user(
            user.id,
            &UserPatch {
                age: Some(AgeValue::Value(0)),
                ..UserPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.age, 0);
    assert_eq!(updated.name, "Alice");
    assert_eq!(updated.address.as_deref(), Some("Hue"));

    let err = repo
        .update_user(
            user.id,
            &UserPatch {
                name: Some("A".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let stored = repo.get_user(user.id).unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[test]
fn update_unknown_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let result = repo
        .update_user(Uuid::new_v4(), &UserPatch::default())
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn update_to_taken_email_hits_unique_index() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.insert_user(&draft("Al", 30, "a@b.com", None)).unwrap();
    let other = repo.insert_user(&draft("Bo", 40, "b@b.com", None)).unwrap();

    let err = repo
        .update_user(
            other.id,
            &UserPatch {
                email: Some("a@b.com".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateEmail));
}

#[test]
fn delete_returns_removed_record_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = repo.insert_user(&draft("Al", 30, "a@b.com", None)).unwrap();

    let removed = repo.delete_user(user.id).unwrap();
    assert_eq!(removed, Some(user.clone()));
    assert!(repo.delete_user(user.id).unwrap().is_none());
    assert!(repo.get_user(user.id).unwrap().is_none());
}

#[test]
fn find_users_pages_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let ids: Vec<_> = (0..5)
        .map(|idx| {
            repo.insert_user(&draft(&format!("User {idx}"), idx, &format!("u{idx}@x.io"), None))
                .unwrap()
                .id
        })
        .collect();

    let first: Vec<_> = repo
        .find_users(&UserFilter::All, 0, 2)
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    let last: Vec<_> = repo
        .find_users(&UserFilter::All, 4, 2)
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();

    assert_eq!(first, ids[0..2]);
    assert_eq!(last, ids[4..5]);
    assert!(repo.find_users(&UserFilter::All, 10, 2).unwrap().is_empty());
}

#[test]
fn contains_filter_matches_any_text_field_ignoring_case() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.insert_user(&draft("Nguyễn An", 20, "an@mail.vn", None))
        .unwrap();
    repo.insert_user(&draft("Bob", 21, "bob@example.com", Some("Đà Nẵng")))
        .unwrap();
    repo.insert_user(&draft("Carol", 22, "carol@EXAMPLE.org", None))
        .unwrap();

    let by_name = UserFilter::contains("NGUYỄN");
    let by_address = UserFilter::contains("đà");
    let by_email = UserFilter::contains("example");

    assert_eq!(repo.count_users(&by_name).unwrap(), 1);
    assert_eq!(repo.count_users(&by_address).unwrap(), 1);
    assert_eq!(repo.count_users(&by_email).unwrap(), 2);
    let (page, total) = repo.find_page(&by_email, 1, 5).unwrap();
    assert_eq!(total, 2);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Carol");
}

#[test]
fn search_term_is_literal_not_a_pattern() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.insert_user(&draft("Al", 30, "a@b.com", None)).unwrap();

    assert_eq!(repo.count_users(&UserFilter::contains("%")).unwrap(), 0);
    assert_eq!(repo.count_users(&UserFilter::contains(".*")).unwrap(), 0);
    assert_eq!(repo.count_users(&UserFilter::contains("b.c")).unwrap(), 1);
}

#[test]
fn parse_id_accepts_only_store_identifiers() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let id = Uuid::new_v4();
    assert_eq!(repo.parse_id(&id.to_string()), Some(id));
    assert_eq!(repo.parse_id("not-an-objectid"), None);
    assert_eq!(repo.parse_id(""), None);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteUserRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_users_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteUserRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("users"))
    ));
}

#[test]
fn repository_rejects_connection_missing_users_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (
            uuid TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            email TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteUserRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "users",
            column: "address"
        })
    ));
}
