use std::sync::Arc;

use uuid::Uuid;

use marketplace_api::{
    config::AppConfig,
    db::MemStore,
    dto::principals::{StaffRegisterRequest, StaffUpdateRequest},
    error::AppError,
    models::{Principal, Role},
    services::{auth_service, principal_service},
    state::AppState,
};

#[tokio::test]
async fn manager_directory_narrows_by_store() -> anyhow::Result<()> {
    let state = test_state();
    let store_a = Uuid::new_v4();
    let store_b = Uuid::new_v4();

    register_staff(&state, Role::StoreManager, "mia@example.com", store_a).await?;
    register_staff(&state, Role::StoreManager, "noa@example.com", store_b).await?;

    let resp = principal_service::list_directory(&state, Role::StoreManager, None).await?;
    assert_eq!(resp.meta.unwrap().total, Some(2));

    let resp = principal_service::list_directory(&state, Role::StoreManager, Some(store_a)).await?;
    let managers = resp.data.unwrap().items;
    assert_eq!(managers.len(), 1);
    assert_eq!(managers[0].email, "mia@example.com");

    // Roles do not bleed into each other's directories.
    let resp = principal_service::list_directory(&state, Role::DeliveryPerson, None).await?;
    assert!(resp.data.unwrap().items.is_empty());

    Ok(())
}

#[tokio::test]
async fn directory_update_patches_and_guards_phone() -> anyhow::Result<()> {
    let state = test_state();
    let store = Uuid::new_v4();

    let mia = register_staff(&state, Role::StoreManager, "mia@example.com", store).await?;
    let noa = register_staff(&state, Role::StoreManager, "noa@example.com", store).await?;

    let err = principal_service::update_directory_entry(
        &state,
        Role::StoreManager,
        mia.id,
        None,
        StaffUpdateRequest {
            phone: Some(noa.phone.clone()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(msg) if msg == "Store Manager already exists"));

    let resp = principal_service::update_directory_entry(
        &state,
        Role::StoreManager,
        mia.id,
        None,
        StaffUpdateRequest {
            name: Some("Mia Reed".to_string()),
            password: Some("rotated456".to_string()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(resp.message, "Store Manager updated successfully");
    let updated = resp.data.unwrap();
    assert_eq!(updated.name, "Mia Reed");
    assert_ne!(updated.password_hash, mia.password_hash);

    let err = principal_service::update_directory_entry(
        &state,
        Role::StoreManager,
        Uuid::new_v4(),
        None,
        StaffUpdateRequest::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Store Manager not found"));

    Ok(())
}

#[tokio::test]
async fn delivery_operations_check_the_store_binding() -> anyhow::Result<()> {
    let state = test_state();
    let store = Uuid::new_v4();
    let wrong_store = Uuid::new_v4();

    let dex = register_staff(&state, Role::DeliveryPerson, "dex@example.com", store).await?;

    // A correct id through the wrong store answers 404, and changes nothing.
    let err = principal_service::update_directory_entry(
        &state,
        Role::DeliveryPerson,
        dex.id,
        Some(wrong_store),
        StaffUpdateRequest {
            name: Some("Hijacked".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Delivery Person not found"));

    let err =
        principal_service::delete_directory_entry(&state, Role::DeliveryPerson, dex.id, Some(wrong_store))
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Delivery Person not found"));

    let listed = principal_service::list_directory(&state, Role::DeliveryPerson, Some(store))
        .await?
        .data
        .unwrap()
        .items;
    assert_eq!(listed[0].name, "Dex");

    let resp = principal_service::update_directory_entry(
        &state,
        Role::DeliveryPerson,
        dex.id,
        Some(store),
        StaffUpdateRequest {
            name: Some("Dex Cole".to_string()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(resp.message, "Delivery Person updated successfully");

    let resp =
        principal_service::delete_directory_entry(&state, Role::DeliveryPerson, dex.id, Some(store))
            .await?;
    assert_eq!(resp.message, "Delivery Person deleted successfully");

    let listed = principal_service::list_directory(&state, Role::DeliveryPerson, Some(store))
        .await?
        .data
        .unwrap()
        .items;
    assert!(listed.is_empty());

    Ok(())
}

#[tokio::test]
async fn admin_directory_lists_registered_admins() -> anyhow::Result<()> {
    let state = test_state();

    auth_service::register_admin(&state, marketplace_api::dto::auth::RegisterRequest {
        name: "Site Admin".to_string(),
        email: "admin@example.com".to_string(),
        phone: "+15550100".to_string(),
        password: "admin123".to_string(),
    })
    .await?;

    let resp = principal_service::list_directory(&state, Role::Admin, None).await?;
    let admins = resp.data.unwrap().items;
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].email, "admin@example.com");

    let resp =
        principal_service::delete_directory_entry(&state, Role::Admin, admins[0].id, None).await?;
    assert_eq!(resp.message, "Admin deleted successfully");

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

async fn register_staff(
    state: &AppState,
    role: Role,
    email: &str,
    store_id: Uuid,
) -> anyhow::Result<Principal> {
    let name = match role {
        Role::DeliveryPerson => "Dex",
        _ => "Mia",
    };
    let resp = auth_service::register_staff(state, role, StaffRegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        phone: format!("+1555{:07}", email.len() * 7 + email.as_bytes()[0] as usize),
        password: "secret123".to_string(),
        store_id: Some(store_id),
    })
    .await?;
    resp.data
        .ok_or_else(|| anyhow::anyhow!("staff registration returned no principal"))
}
