//! Tag store integration tests.
//!
//! Tag names are global, so every test builds names with `unique_name` and
//! only asserts on tags it created.

use brainshelf_db::test_fixtures::{connect_test_db, create_test_project, unique_name};
use brainshelf_db::{
    CreateEntryRequest, Database, EntryFull, EntryRepository, EntryType, Error, TagRepository,
};
use brainshelf_db::defaults::TAG_NAME_MAX_LEN;
use uuid::Uuid;

async fn tagged_entry(db: &Database, project_id: Uuid, tags: &[&str]) -> EntryFull {
    db.entries
        .create(CreateEntryRequest {
            project_id,
            title: unique_name("entry"),
            description: None,
            entry_type: EntryType::Note,
            content: Some("body".to_string()),
            url: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
        .await
        .expect("Failed to create entry")
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_create_is_idempotent_across_case_and_whitespace() {
    let db = connect_test_db().await;
    let base = unique_name("go");

    let a = db.tags.create(&base.to_uppercase()).await.unwrap();
    let b = db.tags.create(&base).await.unwrap();
    let c = db.tags.create(&format!("  {}  ", base.to_uppercase())).await.unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(b.id, c.id);
    assert_eq!(a.name, base.to_lowercase());

    let matching = db.tags.search(&base).await.unwrap();
    assert_eq!(matching.len(), 1, "exactly one row for the normalized name");
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_create_blank_name_is_invalid_input() {
    let db = connect_test_db().await;
    assert!(matches!(
        db.tags.create("   ").await,
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_overlong_name_is_invalid_input_on_create_and_rename() {
    let db = connect_test_db().await;
    let too_long = "x".repeat(TAG_NAME_MAX_LEN + 1);

    assert!(matches!(
        db.tags.create(&too_long).await,
        Err(Error::InvalidInput(_))
    ));

    let tag = db.tags.create(&unique_name("short")).await.unwrap();
    assert!(matches!(
        db.tags.rename(tag.id, &too_long).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        db.consolidation().rename(tag.id, &too_long).await,
        Err(Error::InvalidInput(_))
    ));
    assert_eq!(db.tags.get(tag.id).await.unwrap().unwrap().name, tag.name);

    // Exactly at the limit is accepted.
    let at_limit = format!("{}{}", unique_name("max"), "m".repeat(TAG_NAME_MAX_LEN))
        .chars()
        .take(TAG_NAME_MAX_LEN)
        .collect::<String>();
    let stored = db.tags.create(&at_limit).await.unwrap();
    assert_eq!(stored.name.chars().count(), TAG_NAME_MAX_LEN);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_rename_collision_leaves_both_tags_unchanged() {
    let db = connect_test_db().await;
    let go = db.tags.create(&unique_name("go")).await.unwrap();
    let golang = db.tags.create(&unique_name("golang")).await.unwrap();

    let err = db.tags.rename(golang.id, &go.name.to_uppercase()).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);

    assert_eq!(db.tags.get(go.id).await.unwrap().unwrap().name, go.name);
    assert_eq!(db.tags.get(golang.id).await.unwrap().unwrap().name, golang.name);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_rename_unknown_id_is_not_found() {
    let db = connect_test_db().await;
    let err = db.tags.rename(Uuid::now_v7(), "anything").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_rename_normalizes_and_keeps_associations() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let old = unique_name("js");
    let entry = tagged_entry(&db, project.id, &[&old]).await;
    let tag = db.tags.create(&old).await.unwrap();

    let new_name = unique_name("JavaScript");
    let renamed = db.tags.rename(tag.id, &format!(" {} ", new_name)).await.unwrap();
    assert_eq!(renamed.name, new_name.to_lowercase());
    assert_eq!(renamed.usage_count, 1);

    let reloaded = db.entries.get(entry.entry.id).await.unwrap().unwrap();
    assert_eq!(reloaded.tags, vec![new_name.to_lowercase()]);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_merge_reassigns_without_duplicates_and_bumps_entry() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let go_name = unique_name("go");
    let golang_name = unique_name("golang");

    let both = tagged_entry(&db, project.id, &[&go_name, &golang_name]).await;
    let only_golang = tagged_entry(&db, project.id, &[&golang_name]).await;
    let go = db.tags.create(&go_name).await.unwrap();
    let golang = db.tags.create(&golang_name).await.unwrap();

    let outcome = db.tags.merge(golang.id, go.id).await.unwrap();
    assert_eq!(outcome.reassigned_entries, 2);

    let both_after = db.entries.get(both.entry.id).await.unwrap().unwrap();
    assert_eq!(both_after.tags, vec![go_name.clone()]);
    assert!(both_after.entry.updated_at > both.entry.updated_at);

    let single_after = db.entries.get(only_golang.entry.id).await.unwrap().unwrap();
    assert_eq!(single_after.tags, vec![go_name.clone()]);

    assert!(db.tags.get(golang.id).await.unwrap().is_none());
    assert_eq!(db.tags.get(go.id).await.unwrap().unwrap().usage_count, 2);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_self_merge_keeps_tag_and_associations() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let name = unique_name("x");
    tagged_entry(&db, project.id, &[&name]).await;
    let tag = db.tags.create(&name).await.unwrap();

    let err = db.tags.merge(tag.id, tag.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
    assert_eq!(db.tags.get(tag.id).await.unwrap().unwrap().usage_count, 1);
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_merge_unknown_id_is_not_found() {
    let db = connect_test_db().await;
    let tag = db.tags.create(&unique_name("real")).await.unwrap();

    let err = db.tags.merge(Uuid::now_v7(), tag.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = db.tags.merge(tag.id, Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(db.tags.get(tag.id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_unused_and_used_tags_are_disjoint() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let used = unique_name("used");
    tagged_entry(&db, project.id, &[&used]).await;
    let unused = db.tags.create(&unique_name("unused")).await.unwrap();

    let unused_list = db.tags.list_unused().await.unwrap();
    let by_usage = db.tags.list_by_usage(i64::MAX).await.unwrap();

    assert!(unused_list.iter().any(|t| t.id == unused.id));
    assert!(!unused_list.iter().any(|t| t.name == used));
    for tag in by_usage.iter().filter(|t| t.usage_count > 0) {
        assert!(
            !unused_list.iter().any(|u| u.id == tag.id),
            "{} is both used and unused",
            tag.name
        );
    }
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_recently_used_orders_by_latest_entry() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let older = unique_name("older");
    let newer = unique_name("newer");
    tagged_entry(&db, project.id, &[&older]).await;
    tagged_entry(&db, project.id, &[&newer]).await;

    let recent = db.tags.list_recently_used(i64::MAX).await.unwrap();
    let pos = |name: &str| recent.iter().position(|t| t.name == name).unwrap();
    assert!(pos(&newer) < pos(&older));
    assert!(recent.iter().all(|t| t.usage_count > 0));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_delete_unused_tag_then_lookup_is_none() {
    let db = connect_test_db().await;
    let temp = db.tags.create(&unique_name("temp")).await.unwrap();

    assert!(db
        .tags
        .list_unused()
        .await
        .unwrap()
        .iter()
        .any(|t| t.id == temp.id));

    db.tags.delete(temp.id).await.unwrap();
    assert!(db.tags.get(temp.id).await.unwrap().is_none());
    assert!(matches!(
        db.tags.delete(temp.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_delete_tag_leaves_entries() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let name = unique_name("doomed");
    let entry = tagged_entry(&db, project.id, &[&name]).await;
    let tag = db.tags.create(&name).await.unwrap();

    db.tags.delete(tag.id).await.unwrap();

    let reloaded = db.entries.get(entry.entry.id).await.unwrap().unwrap();
    assert!(reloaded.tags.is_empty());
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL with migrated database"]
async fn test_statistics_sum_usage_per_association() {
    let db = connect_test_db().await;
    let project = create_test_project(&db).await;
    let before = db.tags.statistics().await.unwrap();

    tagged_entry(
        &db,
        project.id,
        &[&unique_name("a"), &unique_name("b"), &unique_name("c")],
    )
    .await;

    let after = db.tags.statistics().await.unwrap();
    // Other tests may run concurrently; only a lower bound is stable.
    assert!(after.total_tags >= before.total_tags + 3);
    assert!(after.total_usages >= before.total_usages + 3);
}
