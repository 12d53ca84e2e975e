//! Repository Integration Tests
//!
//! Category, material and user repositories over an in-memory SQLite database.

use std::path::Path;

use crate::domain::{
    Category, CategoryLevel, CategoryPath, Credentials, Difficulty, DomainError, Material, MaterialDraft,
    MaterialType, SiblingScope,
};
use crate::repository::{
    init_db, CategoryHierarchyOperations, CategoryPositioningOperations, CategoryRepository, DbState,
    MaterialCategoryOperations, MaterialQuery, MaterialQueryOperations, MaterialRepository, Repository,
    UserRepository,
};

struct Fixture {
    db: DbState,
    categories: CategoryRepository,
    materials: MaterialRepository,
}

async fn setup_test_db() -> Fixture {
    let db = init_db(Path::new(":memory:")).await.expect("Failed to init test DB");
    Fixture {
        categories: CategoryRepository::new(db.conn.clone()),
        materials: MaterialRepository::new(db.conn.clone()),
        db,
    }
}

/// Large 1 > Medium 1 > Small 1, plus an empty Large 2
struct Taxonomy {
    l1: Category,
    l2: Category,
    m1: Category,
    s1: Category,
}

async fn seed_taxonomy(repo: &CategoryRepository) -> Taxonomy {
    let l1 = repo.create(&Category::new_large("Grammar", 0)).await.unwrap();
    let l2 = repo.create(&Category::new_large("Vocabulary", 100)).await.unwrap();
    let m1 = repo
        .create(&Category::new_child("Tense", CategoryLevel::Medium, l1.id, 0))
        .await
        .unwrap();
    let s1 = repo
        .create(&Category::new_child("Present perfect", CategoryLevel::Small, m1.id, 0))
        .await
        .unwrap();
    Taxonomy { l1, l2, m1, s1 }
}

fn material(text: &str, paths: Vec<CategoryPath>) -> Material {
    let draft = MaterialDraft {
        text: text.to_string(),
        translation_ko: "번역".to_string(),
        paths,
        ..MaterialDraft::default()
    };
    Material::from_draft(&draft.normalize().unwrap())
}

/// Row written before paths existed: flat fields only
async fn insert_legacy_row(db: &DbState, text: &str, legacy: CategoryPath, created_at: i64) -> u32 {
    let guard = db.conn.lock().await;
    let conn = guard.as_ref().unwrap();
    conn.execute(
        "INSERT INTO materials (material_type, text, large_category_id, medium_category_id, small_category_id, created_at, updated_at)
         VALUES ('sentence', ?, ?, ?, ?, ?, ?)",
        rusqlite::params![text, legacy.large_id, legacy.medium_id, legacy.small_id, created_at, created_at],
    )
    .unwrap();
    conn.last_insert_rowid() as u32
}

// ========================
// Categories
// ========================

#[tokio::test]
async fn test_create_and_list_categories() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    assert!(t.l1.id > 0);
    assert!(t.s1.created_at > 0);

    let all = f.categories.list().await.unwrap();
    let ids: Vec<u32> = all.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![t.l1.id, t.l2.id, t.m1.id, t.s1.id]);

    let found = f.categories.find_by_id(t.m1.id).await.unwrap().unwrap();
    assert_eq!(found.parent_id, Some(t.l1.id));
    assert_eq!(found.level, CategoryLevel::Medium);
}

#[tokio::test]
async fn test_create_rejects_bad_parent() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    // Small directly under a Large
    let err = f
        .categories
        .create(&Category::new_child("Bad", CategoryLevel::Small, t.l1.id, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));

    let err = f
        .categories
        .create(&Category::new_child("Lost", CategoryLevel::Medium, 999, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let err = f.categories.create(&Category::new_large("  ", 0)).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn test_update_category_renames() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    let mut renamed = t.m1.clone();
    renamed.name = "  Tenses ".to_string();
    renamed.order = 50;
    let updated = f.categories.update(&renamed).await.unwrap();
    assert_eq!(updated.name, "Tenses");
    assert_eq!(updated.order, 50);

    let mut missing = t.m1.clone();
    missing.id = 999;
    assert!(matches!(f.categories.update(&missing).await, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_list_children_and_next_order() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    let roots = f.categories.list_children(SiblingScope::Root).await.unwrap();
    assert_eq!(roots.len(), 2);

    let smalls = f
        .categories
        .list_children(SiblingScope::Small { medium_id: t.m1.id })
        .await
        .unwrap();
    assert_eq!(smalls[0].id, t.s1.id);

    assert_eq!(f.categories.next_order(SiblingScope::Root, 100).await.unwrap(), 200);
    assert_eq!(
        f.categories
            .next_order(SiblingScope::Medium { large_id: t.l2.id }, 100)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_delete_with_children_fails_and_keeps_rows() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    let err = f.categories.delete(t.l1.id).await.unwrap_err();
    assert_eq!(err, DomainError::Integrity("has child categories".into()));
    assert_eq!(f.categories.list().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_delete_in_use_fails() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    f.materials
        .create(&material(
            "He has lived here for years.",
            vec![CategoryPath::new(Some(t.l1.id), Some(t.m1.id), Some(t.s1.id))],
        ))
        .await
        .unwrap();

    let err = f.categories.delete(t.s1.id).await.unwrap_err();
    assert_eq!(err, DomainError::Integrity("in use by materials".into()));
    assert!(f.categories.find_by_id(t.s1.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_in_use_by_legacy_field_fails() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    insert_legacy_row(&f.db, "Old row", CategoryPath::new(Some(t.l2.id), None, None), 1).await;
    let err = f.categories.delete(t.l2.id).await.unwrap_err();
    assert_eq!(err, DomainError::Integrity("in use by materials".into()));
    assert!(f.categories.find_by_id(t.l2.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_unused_leaf() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    f.categories.delete(t.s1.id).await.unwrap();
    assert!(f.categories.find_by_id(t.s1.id).await.unwrap().is_none());
    assert!(matches!(f.categories.delete(t.s1.id).await, Err(DomainError::NotFound(_))));
}

// ========================
// Reorder
// ========================

#[tokio::test]
async fn test_reorder_assigns_stride_spaced_orders() {
    let f = setup_test_db().await;
    let mut ids = Vec::new();
    for (i, name) in ["A", "B", "C", "D"].iter().enumerate() {
        let c = f.categories.create(&Category::new_large(*name, i as i64 * 7)).await.unwrap();
        ids.push(c.id);
    }

    let plan = f
        .categories
        .apply_reorder(SiblingScope::Root, ids[0], 0, 2, 100)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plan.assignments.len(), 4);

    let roots = f.categories.list_children(SiblingScope::Root).await.unwrap();
    let order: Vec<u32> = roots.iter().map(|c| c.id).collect();
    assert_eq!(order, vec![ids[1], ids[2], ids[0], ids[3]]);
    let keys: Vec<i64> = roots.iter().map(|c| c.order).collect();
    assert_eq!(keys, vec![0, 100, 200, 300]);
}

#[tokio::test]
async fn test_reorder_stale_view_writes_nothing() {
    let f = setup_test_db().await;
    let a = f.categories.create(&Category::new_large("A", 5)).await.unwrap();
    let b = f.categories.create(&Category::new_large("B", 9)).await.unwrap();

    // Caller believes B is at index 0
    let err = f
        .categories
        .apply_reorder(SiblingScope::Root, b.id, 0, 1, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let roots = f.categories.list_children(SiblingScope::Root).await.unwrap();
    assert_eq!(roots[0].id, a.id);
    assert_eq!(roots[0].order, 5);
    assert_eq!(roots[1].order, 9);
}

#[tokio::test]
async fn test_reorder_same_index_is_noop() {
    let f = setup_test_db().await;
    let a = f.categories.create(&Category::new_large("A", 5)).await.unwrap();
    assert!(f
        .categories
        .apply_reorder(SiblingScope::Root, a.id, 0, 0, 100)
        .await
        .unwrap()
        .is_none());
    assert_eq!(f.categories.find_by_id(a.id).await.unwrap().unwrap().order, 5);
}

// ========================
// Materials
// ========================

#[tokio::test]
async fn test_two_path_save_derives_index_and_legacy() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    let p1 = CategoryPath::new(Some(t.l1.id), Some(t.m1.id), None);
    let p2 = CategoryPath::new(Some(t.l2.id), None, None);
    let created = f
        .materials
        .create(&material("Rarely do we see such talent.", vec![p1, p2]))
        .await
        .unwrap();

    let loaded = f.materials.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.paths, vec![p1, p2]);
    assert_eq!(loaded.index.large_ids, vec![t.l1.id, t.l2.id]);
    assert_eq!(loaded.index.medium_ids, vec![t.m1.id]);
    assert!(loaded.index.small_ids.is_empty());
    assert_eq!(loaded.legacy, p1);
    assert_eq!(loaded.difficulty, Difficulty::B);
    assert!(loaded.created_at > 0);
}

#[tokio::test]
async fn test_duplicate_text_per_type_fails_and_persists_nothing() {
    let f = setup_test_db().await;
    f.materials.create(&material("I have been there.", vec![])).await.unwrap();

    let err = f
        .materials
        .create(&material("  I have been there. ", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    assert_eq!(f.materials.list().await.unwrap().len(), 1);

    // Same text as a passage is allowed
    let mut passage = material("I have been there.", vec![]);
    passage.material_type = MaterialType::Passage;
    f.materials.create(&passage).await.unwrap();
    assert_eq!(f.materials.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_excludes_self_from_duplicate_check() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;
    let first = f.materials.create(&material("First", vec![])).await.unwrap();
    let second = f.materials.create(&material("Second", vec![])).await.unwrap();

    let mut edited = first.clone();
    edited.translation_ko = "첫째".to_string();
    edited.paths = vec![CategoryPath::new(Some(t.l1.id), None, None)];
    let updated = f.materials.update(&edited).await.unwrap();
    assert_eq!(updated.created_at, first.created_at);
    assert_eq!(updated.index.large_ids, vec![t.l1.id]);

    let mut clash = second.clone();
    clash.text = "First".to_string();
    assert!(matches!(f.materials.update(&clash).await, Err(DomainError::Conflict(_))));
    let reloaded = f.materials.find_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(reloaded.text, "Second");
}

#[tokio::test]
async fn test_path_with_wrong_level_is_rejected() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    // Medium id used as a Large
    let bad = material("Wrong level", vec![CategoryPath::new(Some(t.m1.id), None, None)]);
    assert!(matches!(f.materials.create(&bad).await, Err(DomainError::InvalidInput(_))));
    assert!(f.materials.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_path_must_follow_the_tree() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;
    let m2 = f
        .categories
        .create(&Category::new_child("Idioms", CategoryLevel::Medium, t.l2.id, 0))
        .await
        .unwrap();

    let broken = [
        // Medium from another Large
        CategoryPath::new(Some(t.l1.id), Some(m2.id), None),
        // Medium with no Large
        CategoryPath::new(None, Some(t.m1.id), None),
        // Small with its Medium skipped
        CategoryPath::new(Some(t.l1.id), None, Some(t.s1.id)),
    ];
    for path in broken {
        let bad = material("Broken chain", vec![path]);
        let err = f.materials.create(&bad).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)), "{:?} -> {:?}", path, err);
    }
    assert!(f.materials.list().await.unwrap().is_empty());

    // Same check on update
    let saved = f
        .materials
        .create(&material("Good chain", vec![CategoryPath::new(Some(t.l2.id), Some(m2.id), None)]))
        .await
        .unwrap();
    let mut changed = saved.clone();
    changed.paths = vec![CategoryPath::new(Some(t.l2.id), Some(t.m1.id), None)];
    assert!(matches!(f.materials.update(&changed).await, Err(DomainError::InvalidInput(_))));
    let reloaded = f.materials.find_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(reloaded.paths, saved.paths);
}

#[tokio::test]
async fn test_delete_material_removes_references() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;
    let m = f
        .materials
        .create(&material("Gone soon", vec![CategoryPath::new(Some(t.l2.id), None, None)]))
        .await
        .unwrap();

    f.materials.delete(m.id).await.unwrap();
    assert!(f.materials.find_by_id(m.id).await.unwrap().is_none());
    // Category is free again
    f.categories.delete(t.l2.id).await.unwrap();
}

// ========================
// Queries
// ========================

#[tokio::test]
async fn test_small_selection_supersedes_medium() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    let in_small = f
        .materials
        .create(&material(
            "In small",
            vec![CategoryPath::new(Some(t.l1.id), Some(t.m1.id), Some(t.s1.id))],
        ))
        .await
        .unwrap();
    f.materials
        .create(&material("Medium only", vec![CategoryPath::new(Some(t.l1.id), Some(t.m1.id), None)]))
        .await
        .unwrap();

    let mut query = MaterialQuery::new(30);
    query.path = CategoryPath::new(Some(t.l1.id), Some(t.m1.id), Some(t.s1.id));
    let page = f.materials.query_page(&query, true).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, in_small.id);

    query.path = CategoryPath::new(Some(t.l1.id), Some(t.m1.id), None);
    let page = f.materials.query_page(&query, true).await.unwrap();
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_exact_filters_and_newest_first() {
    let f = setup_test_db().await;
    let mut hard = material("Hard one", vec![]);
    hard.difficulty = Difficulty::C;
    let hard = f.materials.create(&hard).await.unwrap();
    let easy = f.materials.create(&material("Easy one", vec![])).await.unwrap();

    let page = f.materials.query_page(&MaterialQuery::new(30), true).await.unwrap();
    assert_eq!(page.items[0].id, easy.id);
    assert!(!page.has_more);

    let mut query = MaterialQuery::new(30);
    query.difficulty = Some(Difficulty::C);
    query.material_type = Some(MaterialType::Sentence);
    let page = f.materials.query_page(&query, true).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, hard.id);

    query.material_type = Some(MaterialType::Passage);
    assert!(f.materials.query_page(&query, true).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn test_cursor_pagination_visits_every_row_once() {
    let f = setup_test_db().await;
    for i in 0..5 {
        f.materials.create(&material(&format!("Sentence {}", i), vec![])).await.unwrap();
    }

    let query = MaterialQuery::new(2);
    let mut seen = Vec::new();
    let mut page = f.materials.query_page(&query, true).await.unwrap();
    let mut fulls = vec![page.has_more];
    seen.extend(page.items.iter().map(|m| m.id));
    while page.has_more {
        let cursor = page.next_cursor.unwrap();
        page = f.materials.query_page(&query.next_page(cursor), true).await.unwrap();
        fulls.push(page.has_more);
        seen.extend(page.items.iter().map(|m| m.id));
    }

    assert_eq!(fulls, vec![true, true, false]);
    let mut sorted = seen.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    assert_eq!(seen.len(), 5);
    assert_eq!(sorted.len(), 5);
}

#[tokio::test]
async fn test_legacy_rows_merge_in_compat_mode() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    let legacy_id = insert_legacy_row(&f.db, "Old sentence", CategoryPath::new(Some(t.l1.id), None, None), 1).await;
    let indexed = f
        .materials
        .create(&material("New sentence", vec![CategoryPath::new(Some(t.l1.id), None, None)]))
        .await
        .unwrap();

    let mut query = MaterialQuery::new(30);
    query.path = CategoryPath::new(Some(t.l1.id), None, None);

    let page = f.materials.query_page(&query, true).await.unwrap();
    let ids: Vec<u32> = page.items.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![indexed.id, legacy_id]);

    let page = f.materials.query_page(&query, false).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].display_paths(), vec![CategoryPath::new(Some(t.l1.id), None, None)]);
}

#[tokio::test]
async fn test_merged_page_is_truncated() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;
    let scope = CategoryPath::new(Some(t.l1.id), None, None);

    insert_legacy_row(&f.db, "Old 1", scope, 1).await;
    insert_legacy_row(&f.db, "Old 2", scope, 2).await;
    f.materials.create(&material("New 1", vec![scope])).await.unwrap();
    f.materials.create(&material("New 2", vec![scope])).await.unwrap();

    let mut query = MaterialQuery::new(3);
    query.path = scope;
    let page = f.materials.query_page(&query, true).await.unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.has_more);
    assert_eq!(page.items[2].text, "Old 2");

    let rest = f
        .materials
        .query_page(&query.next_page(page.next_cursor.unwrap()), true)
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].text, "Old 1");
}

#[tokio::test]
async fn test_backfill_converts_legacy_rows() {
    let f = setup_test_db().await;
    let t = seed_taxonomy(&f.categories).await;

    let id = insert_legacy_row(
        &f.db,
        "Old sentence",
        CategoryPath::new(Some(t.l1.id), Some(t.m1.id), Some(999)),
        1,
    )
    .await;
    insert_legacy_row(&f.db, "Uncategorized", CategoryPath::BLANK, 2).await;

    assert_eq!(f.materials.backfill_category_index().await.unwrap(), 1);
    let loaded = f.materials.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(loaded.paths, vec![CategoryPath::new(Some(t.l1.id), Some(t.m1.id), None)]);
    assert_eq!(loaded.index.medium_ids, vec![t.m1.id]);

    // Indexed now, so the compat query is not needed to find it
    let mut query = MaterialQuery::new(30);
    query.path = CategoryPath::new(Some(t.l1.id), Some(t.m1.id), None);
    assert_eq!(f.materials.query_page(&query, false).await.unwrap().items.len(), 1);

    assert_eq!(f.materials.backfill_category_index().await.unwrap(), 0);
}

#[tokio::test]
async fn test_backfill_does_not_count_rows_left_without_path() {
    let f = setup_test_db().await;
    seed_taxonomy(&f.categories).await;

    let id = insert_legacy_row(&f.db, "Dangling", CategoryPath::new(Some(900), None, Some(901)), 1).await;

    assert_eq!(f.materials.backfill_category_index().await.unwrap(), 0);
    assert_eq!(f.materials.backfill_category_index().await.unwrap(), 0);
    let loaded = f.materials.find_by_id(id).await.unwrap().unwrap();
    assert!(loaded.index.large_ids.is_empty());
}

// ========================
// Users
// ========================

#[tokio::test]
async fn test_register_and_verify_user() {
    let f = setup_test_db().await;
    let users = UserRepository::new(f.db.conn.clone());

    let user = users
        .create_user(&Credentials::new("Editor@Example.com", "s3cret"))
        .await
        .unwrap();
    assert_eq!(user.identifier, "editor@example.com");

    let signed = users
        .verify_credentials(&Credentials::new("editor@example.com", "s3cret"))
        .await
        .unwrap();
    assert_eq!(signed.id, user.id);

    let wrong = users
        .verify_credentials(&Credentials::new("editor@example.com", "nope"))
        .await;
    assert!(matches!(wrong, Err(DomainError::Unauthorized(_))));
    let unknown = users
        .verify_credentials(&Credentials::new("other@example.com", "s3cret"))
        .await;
    assert!(matches!(unknown, Err(DomainError::Unauthorized(_))));

    let again = users.create_user(&Credentials::new("editor@example.com", "x")).await;
    assert!(matches!(again, Err(DomainError::Conflict(_))));
}
