use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{GeoPoint, Principal};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: Principal,
}

/// Customer self-service update. Identity fields and profile fields travel
/// in one payload; absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub saved_addresses: Option<Vec<String>>,
    pub favorite_stores: Option<Vec<Uuid>>,
    pub payment_methods: Option<Vec<String>>,
    pub notification_preferences: Option<bool>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default, rename = "storeId", skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub exp: usize,
}
