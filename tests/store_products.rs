use std::sync::Arc;

use uuid::Uuid;

use marketplace_api::{
    config::AppConfig,
    db::MemStore,
    dto::{
        products::{CreateProductRequest, UpdateProductRequest},
        stores::CreateStoreRequest,
    },
    error::AppError,
    middleware::auth::AuthPrincipal,
    models::{QuantityTier, Role, Store},
    services::{product_service, store_service},
    state::AppState,
};

#[tokio::test]
async fn add_store_requires_coordinates_and_records_owner() -> anyhow::Result<()> {
    let state = test_state();
    let owner = admin_principal();

    let err = store_service::add_store(&state, &owner, CreateStoreRequest {
        name: "Riverside Market".to_string(),
        city: "Portland".to_string(),
        address: "44 Riverside Dr".to_string(),
        longitude: Some(-122.6),
        latitude: None,
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == "Longitude and latitude are required"));

    let resp = store_service::add_store(&state, &owner, store_request("Riverside Market", "Portland")).await?;
    assert_eq!(resp.message, "Store added successfully");
    let store = resp.data.unwrap();
    assert_eq!(store.owner, owner.id);
    assert!(store.is_active);

    Ok(())
}

#[tokio::test]
async fn store_listing_filters_by_city() -> anyhow::Result<()> {
    let state = test_state();
    let owner = admin_principal();

    store_service::add_store(&state, &owner, store_request("Riverside Market", "Portland")).await?;
    store_service::add_store(&state, &owner, store_request("Hillside Grocer", "Denver")).await?;

    let all = store_service::list_stores(&state, None).await?;
    assert_eq!(all.meta.unwrap().total, Some(2));

    let resp = store_service::list_stores(&state, Some("Denver")).await?;
    let stores = resp.data.unwrap().items;
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0].name, "Hillside Grocer");

    let resp = store_service::list_stores(&state, Some("Austin")).await?;
    assert!(resp.data.unwrap().items.is_empty());

    Ok(())
}

#[tokio::test]
async fn only_the_owner_may_delete_a_store() -> anyhow::Result<()> {
    let state = test_state();
    let owner = admin_principal();
    let stranger = admin_principal();

    let store = add_store(&state, &owner, "Riverside Market", "Portland").await?;

    let err = store_service::delete_store(&state, &stranger, store.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(msg) if msg == "Unauthorized to delete this store"));

    // The refused delete must not have touched the store.
    let still_there = store_service::list_stores(&state, Some("Portland")).await?;
    assert_eq!(still_there.data.unwrap().items.len(), 1);

    let resp = store_service::delete_store(&state, &owner, store.id).await?;
    assert_eq!(resp.message, "Store deleted successfully");

    let err = store_service::delete_store(&state, &owner, store.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Store not found"));

    Ok(())
}

#[tokio::test]
async fn store_delete_leaves_products_behind() -> anyhow::Result<()> {
    let state = test_state();
    let owner = admin_principal();

    let store = add_store(&state, &owner, "Riverside Market", "Portland").await?;
    product_service::add_product(&state, &owner, product_request(store.id, "Oat Milk", "Drinks"))
        .await?;

    store_service::delete_store(&state, &owner, store.id).await?;

    // Non-cascading: the catalog still answers for the dangling store id.
    let resp = product_service::products_by_store(&state, store.id).await?;
    assert_eq!(resp.data.unwrap().items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn product_creation_requires_a_quantity_tier() -> anyhow::Result<()> {
    let state = test_state();
    let owner = admin_principal();
    let store = add_store(&state, &owner, "Riverside Market", "Portland").await?;

    let mut missing = product_request(store.id, "Oat Milk", "Drinks");
    missing.quantities = None;
    let err = product_service::add_product(&state, &owner, missing)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == "At least one quantity tier is required"));

    let mut empty = product_request(store.id, "Oat Milk", "Drinks");
    empty.quantities = Some(Vec::new());
    let err = product_service::add_product(&state, &owner, empty)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == "At least one quantity tier is required"));

    let resp =
        product_service::add_product(&state, &owner, product_request(store.id, "Oat Milk", "Drinks"))
            .await?;
    assert_eq!(resp.message, "Product added successfully");

    Ok(())
}

#[tokio::test]
async fn empty_catalog_reads_as_not_found() {
    let state = test_state();

    let err = product_service::products_by_store(&state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "No products found for this store"));
}

#[tokio::test]
async fn categories_group_in_first_seen_order() -> anyhow::Result<()> {
    let state = test_state();
    let owner = admin_principal();
    let store = add_store(&state, &owner, "Riverside Market", "Portland").await?;

    // Empty store: the grouped view answers with an empty array, not 404.
    let resp = product_service::categories_with_products(&state, store.id).await?;
    assert!(resp.data.unwrap().items.is_empty());

    product_service::add_product(&state, &owner, product_request(store.id, "Oat Milk", "Drinks"))
        .await?;
    product_service::add_product(&state, &owner, product_request(store.id, "Sourdough", "Bakery"))
        .await?;
    product_service::add_product(&state, &owner, product_request(store.id, "Cold Brew", "Drinks"))
        .await?;

    let resp = product_service::categories_with_products(&state, store.id).await?;
    let groups = resp.data.unwrap().items;
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].category, "Drinks");
    assert_eq!(groups[0].products.len(), 2);
    assert_eq!(groups[1].category, "Bakery");

    Ok(())
}

#[tokio::test]
async fn product_lookups_are_scoped_to_the_store() -> anyhow::Result<()> {
    let state = test_state();
    let owner = admin_principal();
    let store = add_store(&state, &owner, "Riverside Market", "Portland").await?;
    let other_store = add_store(&state, &owner, "Hillside Grocer", "Denver").await?;

    let product = product_service::add_product(
        &state,
        &owner,
        product_request(store.id, "Oat Milk", "Drinks"),
    )
    .await?
    .data
    .unwrap();

    let found = product_service::get_product(&state, store.id, product.id).await?;
    assert_eq!(found.data.unwrap().id, product.id);

    // Same product id through the wrong store answers 404.
    let err = product_service::get_product(&state, other_store.id, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Product not found in this store"));

    let err = product_service::update_product(
        &state,
        other_store.id,
        product.id,
        UpdateProductRequest {
            name: Some("Renamed".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Product not found in this store"));

    let err = product_service::delete_product(&state, other_store.id, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Product not found in this store"));

    // The mismatched update and delete must not have mutated anything.
    let untouched = product_service::get_product(&state, store.id, product.id)
        .await?
        .data
        .unwrap();
    assert_eq!(untouched.name, "Oat Milk");

    Ok(())
}

#[tokio::test]
async fn product_update_patches_fields_and_guards_tiers() -> anyhow::Result<()> {
    let state = test_state();
    let owner = admin_principal();
    let store = add_store(&state, &owner, "Riverside Market", "Portland").await?;
    let product = product_service::add_product(
        &state,
        &owner,
        product_request(store.id, "Oat Milk", "Drinks"),
    )
    .await?
    .data
    .unwrap();

    let err = product_service::update_product(&state, store.id, product.id, UpdateProductRequest {
        quantities: Some(Vec::new()),
        ..Default::default()
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == "At least one quantity tier is required"));

    let resp = product_service::update_product(&state, store.id, product.id, UpdateProductRequest {
        name: Some("Oat Milk 1L".to_string()),
        is_top_product: Some(true),
        quantities: Some(vec![QuantityTier {
            quantity: 2,
            price: 800,
        }]),
        ..Default::default()
    })
    .await?;
    assert_eq!(resp.message, "Product updated successfully");
    let updated = resp.data.unwrap();
    assert_eq!(updated.name, "Oat Milk 1L");
    assert!(updated.is_top_product);
    assert_eq!(updated.quantities.len(), 1);
    // Untouched fields keep their values.
    assert_eq!(updated.category, "Drinks");

    let resp = product_service::delete_product(&state, store.id, product.id).await?;
    assert_eq!(resp.message, "Product deleted successfully");

    Ok(())
}

fn test_state() -> AppState {
    let config = AppConfig {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        session_ttl_hours: 168,
    };
    AppState::new(Arc::new(MemStore::new()), config)
}

fn admin_principal() -> AuthPrincipal {
    AuthPrincipal {
        id: Uuid::new_v4(),
        role: Role::Admin,
        store_id: None,
    }
}

fn store_request(name: &str, city: &str) -> CreateStoreRequest {
    CreateStoreRequest {
        name: name.to_string(),
        city: city.to_string(),
        address: "44 Riverside Dr".to_string(),
        longitude: Some(-122.6765),
        latitude: Some(45.5231),
    }
}

async fn add_store(
    state: &AppState,
    owner: &AuthPrincipal,
    name: &str,
    city: &str,
) -> anyhow::Result<Store> {
    let resp = store_service::add_store(state, owner, store_request(name, city)).await?;
    resp.data
        .ok_or_else(|| anyhow::anyhow!("store creation returned no store"))
}

fn product_request(store_id: Uuid, name: &str, category: &str) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        description: None,
        category: category.to_string(),
        image: "product.jpg".to_string(),
        store_id,
        is_top_product: false,
        quantities: Some(vec![QuantityTier {
            quantity: 1,
            price: 420,
        }]),
    }
}
