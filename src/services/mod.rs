pub mod auth_service;
pub mod cart_service;
pub mod principal_service;
pub mod product_service;
pub mod store_service;
