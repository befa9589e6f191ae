use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::ProductPatch,
    dto::products::{
        CategoryProducts, CategoryProductsList, CreateProductRequest, ProductList,
        UpdateProductRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthPrincipal,
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn add_product(
    state: &AppState,
    requester: &AuthPrincipal,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let CreateProductRequest {
        name,
        description,
        category,
        image,
        store_id,
        is_top_product,
        quantities,
    } = payload;

    let quantities = match quantities {
        Some(quantities) if !quantities.is_empty() => quantities,
        _ => {
            return Err(AppError::Validation(
                "At least one quantity tier is required".to_string(),
            ));
        }
    };

    let product = Product {
        id: Uuid::new_v4(),
        name,
        description,
        category,
        image,
        store_id,
        is_top_product,
        quantities,
        created_at: Utc::now(),
    };
    let product = state.db.insert_product(product).await?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(requester.id),
        "product_add",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id, "store_id": store_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product added successfully",
        product,
        Some(Meta::empty()),
    ))
}

/// An empty catalog answers 404: clients distinguish "store has no products"
/// from a store they simply mistyped the same way.
pub async fn products_by_store(
    state: &AppState,
    store_id: Uuid,
) -> AppResult<ApiResponse<ProductList>> {
    let items = state.db.products_by_store(store_id).await?;
    if items.is_empty() {
        return Err(AppError::NotFound(
            "No products found for this store".to_string(),
        ));
    }
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("OK", ProductList { items }, Some(meta)))
}

/// Groups one store's products by category, categories in first-seen order.
/// Unlike the flat listing this returns an empty array rather than 404.
pub async fn categories_with_products(
    state: &AppState,
    store_id: Uuid,
) -> AppResult<ApiResponse<CategoryProductsList>> {
    let products = state.db.products_by_store(store_id).await?;

    let mut groups: Vec<CategoryProducts> = Vec::new();
    for product in products {
        match groups.iter_mut().find(|g| g.category == product.category) {
            Some(group) => group.products.push(product),
            None => groups.push(CategoryProducts {
                category: product.category.clone(),
                products: vec![product],
            }),
        }
    }

    let meta = Meta::total(groups.len() as i64);
    Ok(ApiResponse::success(
        "OK",
        CategoryProductsList { items: groups },
        Some(meta),
    ))
}

pub async fn get_product(
    state: &AppState,
    store_id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = state
        .db
        .product_in_store(store_id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found in this store".to_string()))?;
    Ok(ApiResponse::success("OK", product, None))
}

pub async fn update_product(
    state: &AppState,
    store_id: Uuid,
    product_id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let UpdateProductRequest {
        name,
        description,
        category,
        image,
        is_top_product,
        quantities,
    } = payload;

    if let Some(quantities) = &quantities {
        if quantities.is_empty() {
            return Err(AppError::Validation(
                "At least one quantity tier is required".to_string(),
            ));
        }
    }

    let patch = ProductPatch {
        name,
        description,
        category,
        image,
        is_top_product,
        quantities,
    };
    let product = state
        .db
        .update_product(store_id, product_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found in this store".to_string()))?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        None,
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product_id, "store_id": store_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product updated successfully",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    store_id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let deleted = state.db.delete_product(store_id, product_id).await?;
    if !deleted {
        return Err(AppError::NotFound(
            "Product not found in this store".to_string(),
        ));
    }

    if let Err(err) = log_audit(
        state.db.as_ref(),
        None,
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": product_id, "store_id": store_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
