//! Cache-aside behavior of the catalog and overview views.

mod common;

use portal_service::models::Property;
use portal_service::services::cache::{keys, ViewCache};

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn second_read_is_served_from_the_cache() {
    let state = common::test_state().await;

    let before = state.catalog.available_properties().await.unwrap();

    // Insert a row behind the cache's back: no invalidation runs.
    let property = Property::new(
        "Cached-over Terrace".to_string(),
        "Utrecht".to_string(),
        12_000_000,
    );
    state.db.insert_property(&property).await.unwrap();

    // The stale view is still served: the cache was populated by the first
    // read and nothing invalidated it.
    let second = state.catalog.available_properties().await.unwrap();
    assert_eq!(second.len(), before.len());

    // Writing through the service drops the key, so the next read
    // recomputes and sees everything.
    state
        .catalog
        .create_property(
            "Harbour View Flat".to_string(),
            "Antwerp".to_string(),
            33_000_000,
        )
        .await
        .unwrap();

    let third = state.catalog.available_properties().await.unwrap();
    assert_eq!(third.len(), before.len() + 2);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn provisioning_invalidates_the_overview_aggregate() {
    let state = common::test_state().await;

    let before = state.admin.overview().await.unwrap();
    assert!(state.cache.get(keys::ADMIN_OVERVIEW).await.is_some());

    // Provisioning must drop the aggregate before it returns.
    state.admin.provision("client", None, None).await.unwrap();
    assert!(state.cache.get(keys::ADMIN_OVERVIEW).await.is_none());

    let after = state.admin.overview().await.unwrap();
    assert_eq!(after.pending_accounts, before.pending_accounts + 1);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn approval_invalidates_the_overview_aggregate() {
    let state = common::test_state().await;

    let issued = state.admin.provision("client", None, None).await.unwrap();

    // Populate the cache, then approve.
    let before = state.admin.overview().await.unwrap();
    state
        .onboarding
        .approve(issued.account.account_id)
        .await
        .unwrap();
    assert!(state.cache.get(keys::ADMIN_OVERVIEW).await.is_none());

    let after = state.admin.overview().await.unwrap();
    assert_eq!(after.active_accounts, before.active_accounts + 1);
    assert_eq!(after.pending_accounts, before.pending_accounts - 1);
}
