use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::products::{
        CategoryProductsList, CreateProductRequest, ProductList, UpdateProductRequest,
    },
    error::AppResult,
    middleware::auth::AuthPrincipal,
    models::Product,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_product))
        .route("/store/{store_id}/products", get(products_by_store))
        .route(
            "/store/{store_id}/categories-products",
            get(categories_with_products),
        )
        .route(
            "/store/{store_id}/product/{product_id}",
            get(get_product).put(update_product).delete(remove_product),
        )
}

#[utoipa::path(
    post,
    path = "/api/products/add",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Missing quantity tiers"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn add_product(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = product_service::add_product(&state, &principal, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/products/store/{store_id}/products",
    params(
        ("store_id" = Uuid, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "Products of the store", body = ApiResponse<ProductList>),
        (status = 404, description = "Store has no products"),
    ),
    tag = "Products"
)]
pub async fn products_by_store(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::products_by_store(&state, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/store/{store_id}/categories-products",
    params(
        ("store_id" = Uuid, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "Products grouped by category", body = ApiResponse<CategoryProductsList>)
    ),
    tag = "Products"
)]
pub async fn categories_with_products(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CategoryProductsList>>> {
    let resp = product_service::categories_with_products(&state, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/store/{store_id}/product/{product_id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product details", body = ApiResponse<Product>),
        (status = 404, description = "Product not in this store"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, store_id, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/store/{store_id}/product/{product_id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Product not in this store"),
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, store_id, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/store/{store_id}/product/{product_id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Product not in this store"),
    ),
    tag = "Products"
)]
pub async fn remove_product(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, store_id, product_id).await?;
    Ok(Json(resp))
}
