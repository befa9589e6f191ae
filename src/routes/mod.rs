use axum::Router;

use crate::state::AppState;

pub mod admins;
pub mod auth;
pub mod cart;
pub mod deliveries;
pub mod doc;
pub mod health;
pub mod products;
pub mod store_managers;
pub mod stores;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/stores", stores::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/admins", admins::router())
        .nest("/store-managers", store_managers::router())
        .nest("/deliveries", deliveries::router())
}
