use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        principals::{PrincipalList, StaffListQuery, StaffRegisterRequest, StaffUpdateRequest},
    },
    error::AppResult,
    models::{Principal, Role},
    response::ApiResponse,
    services::{auth_service, principal_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/", get(list_managers))
        .route("/{id}", put(update_manager).delete(remove_manager))
}

#[utoipa::path(
    post,
    path = "/api/store-managers/register",
    request_body = StaffRegisterRequest,
    responses(
        (status = 201, description = "Store manager registered", body = ApiResponse<Principal>),
        (status = 400, description = "Store ID is required"),
        (status = 409, description = "Store manager already exists"),
    ),
    tag = "Store Managers"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<StaffRegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Principal>>)> {
    let resp = auth_service::register_staff(&state, Role::StoreManager, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/store-managers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials"),
        (status = 404, description = "Store manager not found"),
    ),
    tag = "Store Managers"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, Role::StoreManager, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/store-managers",
    params(
        ("storeId" = Option<Uuid>, Query, description = "Restrict to managers bound to this store")
    ),
    responses(
        (status = 200, description = "Store managers", body = ApiResponse<PrincipalList>)
    ),
    tag = "Store Managers"
)]
pub async fn list_managers(
    State(state): State<AppState>,
    Query(query): Query<StaffListQuery>,
) -> AppResult<Json<ApiResponse<PrincipalList>>> {
    let resp =
        principal_service::list_directory(&state, Role::StoreManager, query.store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/store-managers/{id}",
    params(
        ("id" = Uuid, Path, description = "Store manager ID")
    ),
    request_body = StaffUpdateRequest,
    responses(
        (status = 200, description = "Store manager updated", body = ApiResponse<Principal>),
        (status = 404, description = "Store manager not found"),
    ),
    tag = "Store Managers"
)]
pub async fn update_manager(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StaffUpdateRequest>,
) -> AppResult<Json<ApiResponse<Principal>>> {
    let resp =
        principal_service::update_directory_entry(&state, Role::StoreManager, id, None, payload)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/store-managers/{id}",
    params(
        ("id" = Uuid, Path, description = "Store manager ID")
    ),
    responses(
        (status = 200, description = "Store manager deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Store manager not found"),
    ),
    tag = "Store Managers"
)]
pub async fn remove_manager(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp =
        principal_service::delete_directory_entry(&state, Role::StoreManager, id, None).await?;
    Ok(Json(resp))
}
