use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Product, QuantityTier};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub image: String,
    pub store_id: Uuid,
    #[serde(default)]
    pub is_top_product: bool,
    pub quantities: Option<Vec<QuantityTier>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub is_top_product: Option<bool>,
    pub quantities: Option<Vec<QuantityTier>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

/// One store's products grouped by their category string, in first-seen
/// category order.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryProducts {
    pub category: String,
    pub products: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryProductsList {
    #[schema(value_type = Vec<CategoryProducts>)]
    pub items: Vec<CategoryProducts>,
}
