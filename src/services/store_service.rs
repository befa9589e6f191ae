use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::stores::{CreateStoreRequest, StoreList},
    error::{AppError, AppResult},
    middleware::auth::AuthPrincipal,
    models::{GeoPoint, Store},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// The owner always comes from the verified token, never the body.
pub async fn add_store(
    state: &AppState,
    requester: &AuthPrincipal,
    payload: CreateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    let CreateStoreRequest {
        name,
        city,
        address,
        longitude,
        latitude,
    } = payload;

    let (Some(longitude), Some(latitude)) = (longitude, latitude) else {
        return Err(AppError::Validation(
            "Longitude and latitude are required".to_string(),
        ));
    };

    let store = Store {
        id: Uuid::new_v4(),
        name,
        city,
        address,
        owner: requester.id,
        is_active: true,
        location: GeoPoint {
            longitude,
            latitude,
        },
        created_at: Utc::now(),
    };
    let store = state.db.insert_store(store).await?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(requester.id),
        "store_add",
        Some("stores"),
        Some(serde_json::json!({ "store_id": store.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Store added successfully",
        store,
        Some(Meta::empty()),
    ))
}

pub async fn list_stores(
    state: &AppState,
    city: Option<&str>,
) -> AppResult<ApiResponse<StoreList>> {
    let items = state.db.list_active_stores(city).await?;
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("OK", StoreList { items }, Some(meta)))
}

/// Owner-only. The delete is not cascading: products and carts referencing
/// the store stay behind and read endpoints must tolerate the dangling refs.
pub async fn delete_store(
    state: &AppState,
    requester: &AuthPrincipal,
    store_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let store = state
        .db
        .store_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

    if store.owner != requester.id {
        return Err(AppError::Forbidden(
            "Unauthorized to delete this store".to_string(),
        ));
    }

    state.db.delete_store(store_id).await?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(requester.id),
        "store_delete",
        Some("stores"),
        Some(serde_json::json!({ "store_id": store_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Store deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
