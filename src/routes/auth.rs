use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, ProfileUpdateRequest, RegisterRequest},
    dto::principals::PrincipalList,
    error::AppResult,
    middleware::auth::AuthPrincipal,
    models::{Principal, Role},
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile/all", get(list_profiles))
        .route("/profile/{id}", get(get_profile).put(update_profile))
        .route("/profile", delete(delete_profile))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Customer registered", body = ApiResponse<Principal>),
        (status = 409, description = "Email or phone already registered"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Principal>>)> {
    let resp = auth_service::register_customer(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials"),
        (status = 404, description = "No customer with that email"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, Role::Customer, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile/all",
    responses(
        (status = 200, description = "All customers", body = ApiResponse<PrincipalList>)
    ),
    tag = "Auth"
)]
pub async fn list_profiles(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PrincipalList>>> {
    let resp = auth_service::list_profiles(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile/{id}",
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer profile", body = ApiResponse<Principal>),
        (status = 404, description = "User not found"),
    ),
    tag = "Auth"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Principal>>> {
    let resp = auth_service::get_profile(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile/{id}",
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Principal>),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    _principal: AuthPrincipal,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> AppResult<Json<ApiResponse<Principal>>> {
    let resp = auth_service::update_profile(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn delete_profile(
    State(state): State<AppState>,
    principal: AuthPrincipal,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::delete_profile(&state, principal.id).await?;
    Ok(Json(resp))
}
