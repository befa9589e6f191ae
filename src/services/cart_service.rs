use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartItemView, CartQuery, CartView, UpdateCartItemRequest},
    error::{AppError, AppResult},
    models::Cart,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Read view with product references resolved against the current catalog.
/// Lines whose product has since been deleted keep their id and price but
/// carry `product: null`. No cart yet reads as `{items: [], totalPrice: 0}`.
pub async fn get_cart(state: &AppState, query: CartQuery) -> AppResult<ApiResponse<CartView>> {
    let Some(cart) = state.db.cart_by_customer(query.user_id).await? else {
        let view = CartView {
            id: None,
            customer_id: None,
            items: Vec::new(),
            total_price: 0,
        };
        return Ok(ApiResponse::success("OK", view, None));
    };

    let ids: Vec<Uuid> = cart.items.iter().map(|item| item.product_id).collect();
    let products = state.db.products_by_ids(&ids).await?;

    let items = cart
        .items
        .into_iter()
        .map(|item| {
            let product = products.iter().find(|p| p.id == item.product_id).cloned();
            CartItemView {
                id: item.id,
                product_id: item.product_id,
                product,
                quantity: item.quantity,
                unit_price: item.unit_price,
            }
        })
        .collect();

    let view = CartView {
        id: Some(cart.id),
        customer_id: Some(cart.customer_id),
        items,
        total_price: cart.total_price,
    };
    Ok(ApiResponse::success("OK", view, None))
}

pub async fn add_item(
    state: &AppState,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let AddToCartRequest {
        user_id,
        product_id,
        quantity,
        price,
    } = payload;

    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if price < 0 {
        return Err(AppError::Validation(
            "price must not be negative".to_string(),
        ));
    }

    let cart = state
        .db
        .add_cart_item(user_id, product_id, quantity, price)
        .await?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(user_id),
        "cart_add_item",
        Some("carts"),
        Some(serde_json::json!({ "product_id": product_id, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Item added to cart",
        cart,
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let cart = state
        .db
        .update_cart_item(item_id, payload.quantity)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(cart.customer_id),
        "cart_update_item",
        Some("carts"),
        Some(serde_json::json!({ "item_id": item_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Cart updated", cart, Some(Meta::empty())))
}

pub async fn remove_item(state: &AppState, item_id: Uuid) -> AppResult<ApiResponse<Cart>> {
    let cart = state
        .db
        .remove_cart_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(cart.customer_id),
        "cart_remove_item",
        Some("carts"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Item removed from cart",
        cart,
        Some(Meta::empty()),
    ))
}

/// Drops the whole cart document. Answers the same whether or not one existed.
pub async fn clear_cart(
    state: &AppState,
    query: CartQuery,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.db.delete_cart(query.user_id).await?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(query.user_id),
        "cart_clear",
        Some("carts"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
