use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        principals::{PrincipalList, StaffUpdateRequest},
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
        .route("/", get(list_admins))
        .route("/{id}", put(update_admin).delete(remove_admin))
}

#[utoipa::path(
    post,
    path = "/api/admins/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin registered", body = ApiResponse<Principal>),
        (status = 409, description = "Admin already exists"),
    ),
    tag = "Admins"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Principal>>)> {
    let resp = auth_service::register_admin(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/admins/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials"),
        (status = 404, description = "Admin not found"),
    ),
    tag = "Admins"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, Role::Admin, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admins",
    responses(
        (status = 200, description = "All admins", body = ApiResponse<PrincipalList>)
    ),
    tag = "Admins"
)]
pub async fn list_admins(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PrincipalList>>> {
    let resp = principal_service::list_directory(&state, Role::Admin, None).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admins/{id}",
    params(
        ("id" = Uuid, Path, description = "Admin ID")
    ),
    request_body = StaffUpdateRequest,
    responses(
        (status = 200, description = "Admin updated", body = ApiResponse<Principal>),
        (status = 404, description = "Admin not found"),
    ),
    tag = "Admins"
)]
pub async fn update_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StaffUpdateRequest>,
) -> AppResult<Json<ApiResponse<Principal>>> {
    let resp =
        principal_service::update_directory_entry(&state, Role::Admin, id, None, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admins/{id}",
    params(
        ("id" = Uuid, Path, description = "Admin ID")
    ),
    responses(
        (status = 200, description = "Admin deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Admin not found"),
    ),
    tag = "Admins"
)]
pub async fn remove_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = principal_service::delete_directory_entry(&state, Role::Admin, id, None).await?;
    Ok(Json(resp))
}
