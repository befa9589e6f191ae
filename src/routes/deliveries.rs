use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        principals::{PrincipalList, StaffRegisterRequest, StaffUpdateRequest},
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
        .route("/{store_id}", get(list_by_store))
        .route("/{store_id}/{id}", put(update_person).delete(remove_person))
}

#[utoipa::path(
    post,
    path = "/api/deliveries/register",
    request_body = StaffRegisterRequest,
    responses(
        (status = 201, description = "Delivery person registered", body = ApiResponse<Principal>),
        (status = 400, description = "Store ID is required"),
        (status = 409, description = "Delivery person already exists"),
    ),
    tag = "Deliveries"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<StaffRegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Principal>>)> {
    let resp = auth_service::register_staff(&state, Role::DeliveryPerson, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/deliveries/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials"),
        (status = 404, description = "Delivery person not found"),
    ),
    tag = "Deliveries"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, Role::DeliveryPerson, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/{store_id}",
    params(
        ("store_id" = Uuid, Path, description = "Store whose delivery staff to list")
    ),
    responses(
        (status = 200, description = "Delivery staff for the store", body = ApiResponse<PrincipalList>)
    ),
    tag = "Deliveries"
)]
pub async fn list_by_store(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PrincipalList>>> {
    let resp =
        principal_service::list_directory(&state, Role::DeliveryPerson, Some(store_id)).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/deliveries/{store_id}/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store the person must belong to"),
        ("id" = Uuid, Path, description = "Delivery person ID")
    ),
    request_body = StaffUpdateRequest,
    responses(
        (status = 200, description = "Delivery person updated", body = ApiResponse<Principal>),
        (status = 404, description = "Delivery person not found"),
    ),
    tag = "Deliveries"
)]
pub async fn update_person(
    State(state): State<AppState>,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StaffUpdateRequest>,
) -> AppResult<Json<ApiResponse<Principal>>> {
    let resp = principal_service::update_directory_entry(
        &state,
        Role::DeliveryPerson,
        id,
        Some(store_id),
        payload,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/deliveries/{store_id}/{id}",
    params(
        ("store_id" = Uuid, Path, description = "Store the person must belong to"),
        ("id" = Uuid, Path, description = "Delivery person ID")
    ),
    responses(
        (status = 200, description = "Delivery person deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Delivery person not found"),
    ),
    tag = "Deliveries"
)]
pub async fn remove_person(
    State(state): State<AppState>,
    Path((store_id, id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp =
        principal_service::delete_directory_entry(&state, Role::DeliveryPerson, id, Some(store_id))
            .await?;
    Ok(Json(resp))
}
