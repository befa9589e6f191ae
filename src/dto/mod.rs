pub mod auth;
pub mod cart;
pub mod principals;
pub mod products;
pub mod stores;
