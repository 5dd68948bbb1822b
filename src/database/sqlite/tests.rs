use super::*;
use crate::database::sqlite::models::{Language, NewSnippet, SnippetUpdate};
use std::time::Duration;
use tempfile::TempDir;

async fn test_database() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let database = Database::new(temp_dir.path().join("snippets.db"))
        .await
        .expect("should initialize database");
    (database, temp_dir)
}

fn sample_snippet() -> NewSnippet {
    NewSnippet {
        title: "add".to_string(),
        content: "function add(a,b){return a+b}".to_string(),
        language: Language::Javascript,
    }
}

#[tokio::test]
async fn create_and_fetch_snippet() {
    let (database, _temp_dir) = test_database().await;

    let created = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert snippet");

    assert!(!created.id.is_empty());
    assert_eq!(created.title, "add");
    assert_eq!(created.language, Language::Javascript);
    assert_eq!(created.owner_id, "user_1");
    assert_eq!(created.created_date, created.updated_date);

    let fetched = database
        .get_snippet(&created.id)
        .await
        .expect("should fetch snippet")
        .expect("snippet should exist");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_assigns_unique_ids() {
    let (database, _temp_dir) = test_database().await;

    let first = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert first snippet");
    let second = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert second snippet");

    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn get_missing_snippet_returns_none() {
    let (database, _temp_dir) = test_database().await;

    let missing = database
        .get_snippet("does-not-exist")
        .await
        .expect("query should succeed");
    assert!(missing.is_none());
}

#[tokio::test]
async fn update_bumps_updated_date() {
    let (database, _temp_dir) = test_database().await;

    let created = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert snippet");

    // Timestamps are taken at write time; keep the writes apart.
    tokio::time::sleep(Duration::from_millis(5)).await;

    let updated = database
        .update_snippet(&SnippetUpdate {
            id: created.id.clone(),
            title: "add two numbers".to_string(),
            content: "const add = (a, b) => a + b".to_string(),
            language: Language::Typescript,
        })
        .await
        .expect("update should succeed")
        .expect("snippet should exist");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "add two numbers");
    assert_eq!(updated.language, Language::Typescript);
    assert_eq!(updated.created_date, created.created_date);
    assert!(updated.updated_date > updated.created_date);
}

#[tokio::test]
async fn update_missing_snippet_returns_none() {
    let (database, _temp_dir) = test_database().await;

    let result = database
        .update_snippet(&SnippetUpdate {
            id: "does-not-exist".to_string(),
            title: "title".to_string(),
            content: "content".to_string(),
            language: Language::Python,
        })
        .await
        .expect("update should succeed");
    assert!(result.is_none());
}

#[tokio::test]
async fn delete_snippet_removes_row() {
    let (database, _temp_dir) = test_database().await;

    let created = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert snippet");

    assert!(
        database
            .delete_snippet(&created.id)
            .await
            .expect("delete should succeed")
    );
    assert!(
        database
            .get_snippet(&created.id)
            .await
            .expect("query should succeed")
            .is_none()
    );
    assert!(
        !database
            .delete_snippet(&created.id)
            .await
            .expect("second delete should succeed")
    );
}

#[tokio::test]
async fn get_by_ids_returns_existing_subset() {
    let (database, _temp_dir) = test_database().await;

    let first = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert first snippet");
    let second = database
        .insert_snippet("user_2", &sample_snippet())
        .await
        .expect("should insert second snippet");

    let ids = vec![
        first.id.clone(),
        second.id.clone(),
        "does-not-exist".to_string(),
    ];
    let snippets = database
        .get_snippets_by_ids(&ids)
        .await
        .expect("multi-get should succeed");

    assert_eq!(snippets.len(), 2);
    assert!(snippets.iter().any(|s| s.id == first.id));
    assert!(snippets.iter().any(|s| s.id == second.id));

    let empty = database
        .get_snippets_by_ids(&[])
        .await
        .expect("empty multi-get should succeed");
    assert!(empty.is_empty());
}

#[tokio::test]
async fn list_by_owner_filters_and_orders() {
    let (database, _temp_dir) = test_database().await;

    let mine = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert snippet");
    tokio::time::sleep(Duration::from_millis(5)).await;
    let mine_newer = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert snippet");
    database
        .insert_snippet("user_2", &sample_snippet())
        .await
        .expect("should insert snippet");

    let listed = database
        .list_snippets_by_owner("user_1")
        .await
        .expect("list should succeed");

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, mine_newer.id);
    assert_eq!(listed[1].id, mine.id);
}

#[tokio::test]
async fn list_snippet_ids_includes_owner() {
    let (database, _temp_dir) = test_database().await;

    let created = database
        .insert_snippet("user_1", &sample_snippet())
        .await
        .expect("should insert snippet");

    let ids = database
        .list_snippet_ids()
        .await
        .expect("listing ids should succeed");
    assert_eq!(ids, vec![(created.id, "user_1".to_string())]);
}
