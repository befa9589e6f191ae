use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Principal;

/// Registration payload for the staff roles. `store_id` is required for
/// store managers and delivery people; the service rejects its absence.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffRegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StaffUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffListQuery {
    pub store_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PrincipalList {
    #[schema(value_type = Vec<Principal>)]
    pub items: Vec<Principal>,
}
