use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Store;

/// Coordinates stay optional at the edge so the service can answer with a
/// field-specific validation message instead of a deserialization error.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStoreRequest {
    pub name: String,
    pub city: String,
    pub address: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct StoreList {
    #[schema(value_type = Vec<Store>)]
    pub items: Vec<Store>,
}
