use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::stores::{CreateStoreRequest, StoreList},
    error::AppResult,
    middleware::auth::AuthPrincipal,
    models::Store,
    response::ApiResponse,
    services::store_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_store))
        .route("/", get(list_stores))
        // One template serves both verbs: the segment is a city name for GET
        // and a store id for DELETE.
        .route("/{city}", get(stores_by_city).delete(remove_store))
}

#[utoipa::path(
    post,
    path = "/api/stores/add",
    request_body = CreateStoreRequest,
    responses(
        (status = 201, description = "Store created", body = ApiResponse<Store>),
        (status = 400, description = "Missing coordinates"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn add_store(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    Json(payload): Json<CreateStoreRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Store>>)> {
    let resp = store_service::add_store(&state, &principal, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/stores",
    responses(
        (status = 200, description = "Active stores", body = ApiResponse<StoreList>)
    ),
    tag = "Stores"
)]
pub async fn list_stores(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<StoreList>>> {
    let resp = store_service::list_stores(&state, None).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/stores/{city}",
    params(
        ("city" = String, Path, description = "City to filter stores")
    ),
    responses(
        (status = 200, description = "Active stores in the city", body = ApiResponse<StoreList>)
    ),
    tag = "Stores"
)]
pub async fn stores_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> AppResult<Json<ApiResponse<StoreList>>> {
    let resp = store_service::list_stores(&state, Some(&city)).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/stores/{id}",
    params(
        ("id" = Uuid, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "Store deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Requester does not own the store"),
        (status = 404, description = "Store not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn remove_store(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = store_service::delete_store(&state, &principal, id).await?;
    Ok(Json(resp))
}
