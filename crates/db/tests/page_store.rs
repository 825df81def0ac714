//! Postgres store tests. They need a live database (`DATABASE_URL`), so they
//! are ignored by default: run with `cargo test -p quire-db -- --ignored`.

use assert_matches::assert_matches;
use quire_core::content::ContentUnit;
use quire_core::page::Page;
use quire_core::permissions::{PermissionLevel, PermissionRule, Requester};
use quire_core::query::{PageFilter, PageListParams, PageQuery};
use quire_core::revision::Revision;
use quire_core::roles::{ROLE_ADMIN, ROLE_USER};
use quire_core::store::{PageStore, StoreError};
use quire_db::PgPageStore;
use sqlx::PgPool;

fn page(title: &str, body: &str) -> Page {
    Page::with_initial(Revision::new(ContentUnit::new(title, body)))
}

fn query(params: PageListParams, requester: &Requester) -> PageQuery {
    PageQuery::build(PageFilter::from_params(&params).unwrap(), requester)
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn save_and_load_round_trip(pool: PgPool) {
    quire_db::health_check(&pool).await.unwrap();
    let store = PgPageStore::new(pool);

    let mut home = page("Home", "Welcome to the wiki");
    let id = store.save(&mut home).await.unwrap();
    assert_eq!(home.id(), Some(id));

    home.add_revision(Revision::new(ContentUnit::new("Home", "Welcome back")).with_msg("edit"));
    assert_eq!(store.save(&mut home).await.unwrap(), id);

    let loaded = store.load_by_id(id).await.unwrap().unwrap();
    assert_eq!(loaded.revision_count(), 2);
    assert_eq!(loaded.current().unwrap().msg(), "edit");

    let by_path = store.load_by_path("home").await.unwrap().unwrap();
    assert_eq!(by_path.id(), Some(id));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_path_is_conflict(pool: PgPool) {
    let store = PgPageStore::new(pool);
    store.save(&mut page("Guide", "")).await.unwrap();

    let err = store.save(&mut page("guide", "")).await.unwrap_err();
    assert_matches!(err, StoreError::Conflict(_));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn find_applies_scope_and_window(pool: PgPool) {
    let store = PgPageStore::new(pool);
    for title in ["Alpha", "Bravo", "Charlie"] {
        store.save(&mut page(title, "shared text")).await.unwrap();
    }
    let secret = Revision::new(ContentUnit::new("Delta", "shared text")).with_permissions(
        PermissionRule::new(PermissionLevel::Admin, PermissionLevel::Admin),
    );
    store.save(&mut Page::with_initial(secret)).await.unwrap();

    let params = PageListParams {
        sort: Some("alphabetical".into()),
        limit: Some("2".into()),
        offset: Some("1".into()),
        ..Default::default()
    };

    let user = store
        .find(&query(params.clone(), &Requester::user(1, ROLE_USER)))
        .await
        .unwrap();
    assert_eq!(user.total, 3);
    let titles: Vec<_> = user.pages.iter().filter_map(|p| p.title()).collect();
    assert_eq!(titles, vec!["Bravo", "Charlie"]);

    let admin = store
        .find(&query(params, &Requester::user(2, ROLE_ADMIN)))
        .await
        .unwrap();
    assert_eq!(admin.total, 4);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn text_search_uses_weighted_ranking(pool: PgPool) {
    let store = PgPageStore::new(pool);
    store.save(&mut page("Gardening", "tomatoes need sun")).await.unwrap();
    store.save(&mut page("Tomatoes", "a red fruit")).await.unwrap();
    store.save(&mut page("Cooking", "pasta")).await.unwrap();

    let params = PageListParams {
        text: Some("tomatoes".into()),
        ..Default::default()
    };
    let set = store.find(&query(params, &Requester::Anonymous)).await.unwrap();
    assert_eq!(set.total, 2);
    assert_eq!(set.pages[0].title(), Some("Tomatoes"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn trashed_pages_are_counted_separately(pool: PgPool) {
    let store = PgPageStore::new(pool);
    let mut old = page("Old", "");
    store.save(&mut old).await.unwrap();
    store.save(&mut page("Current", "")).await.unwrap();

    old.trash();
    store.save(&mut old).await.unwrap();

    assert_eq!(store.count_trashed().await.unwrap(), 1);
    let live = store
        .find(&query(PageListParams::default(), &Requester::Anonymous))
        .await
        .unwrap();
    assert_eq!(live.total, 1);
}
