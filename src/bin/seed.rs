use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use marketplace_api::{
    config::AppConfig,
    db::{PgStore, create_pool},
    dto::{auth::RegisterRequest, cart::AddToCartRequest},
    models::{GeoPoint, Principal, Product, QuantityTier, Role, Store},
    services::{auth_service, cart_service},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState::new(Arc::new(PgStore::new(pool)), config);

    let admin = ensure_principal(
        &state,
        Role::Admin,
        "Site Admin",
        "admin@example.com",
        "+15550100",
        "admin123",
    )
    .await?;
    let customer = ensure_principal(
        &state,
        Role::Customer,
        "Demo Customer",
        "customer@example.com",
        "+15550101",
        "customer123",
    )
    .await?;

    let store = ensure_store(&state, admin.id).await?;
    seed_products(&state, store.id).await?;
    seed_cart(&state, customer.id, store.id).await?;

    println!(
        "Seed completed. Admin ID: {}, Customer ID: {}, Store ID: {}",
        admin.id, customer.id, store.id
    );
    Ok(())
}

async fn ensure_principal(
    state: &AppState,
    role: Role,
    name: &str,
    email: &str,
    phone: &str,
    password: &str,
) -> anyhow::Result<Principal> {
    if let Some(existing) = state.db.principal_by_email(role, email).await? {
        println!("Found {} {email}", role.as_str());
        return Ok(existing);
    }

    let payload = RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        password: password.to_string(),
    };
    let resp = match role {
        Role::Admin => auth_service::register_admin(state, payload).await?,
        _ => auth_service::register_customer(state, payload).await?,
    };
    let principal = resp
        .data
        .ok_or_else(|| anyhow::anyhow!("registration returned no principal"))?;

    println!("Registered {} {email}", role.as_str());
    Ok(principal)
}

async fn ensure_store(state: &AppState, owner: Uuid) -> anyhow::Result<Store> {
    let stores = state.db.list_active_stores(Some("Portland")).await?;
    if let Some(existing) = stores.into_iter().find(|s| s.name == "Riverside Market") {
        println!("Found store {}", existing.name);
        return Ok(existing);
    }

    let store = Store {
        id: Uuid::new_v4(),
        name: "Riverside Market".to_string(),
        city: "Portland".to_string(),
        address: "44 Riverside Dr".to_string(),
        owner,
        is_active: true,
        location: GeoPoint {
            longitude: -122.6765,
            latitude: 45.5231,
        },
        created_at: Utc::now(),
    };
    let store = state.db.insert_store(store).await?;
    println!("Created store {}", store.name);
    Ok(store)
}

async fn seed_products(state: &AppState, store_id: Uuid) -> anyhow::Result<()> {
    let existing = state.db.products_by_store(store_id).await?;

    let catalog: [(&str, &str, &str, Vec<(i32, i64)>); 4] = [
        (
            "Cold Brew Concentrate",
            "Drinks",
            "cold-brew.jpg",
            vec![(1, 650), (6, 3600)],
        ),
        ("Sourdough Loaf", "Bakery", "sourdough.jpg", vec![(1, 550)]),
        (
            "Valencia Oranges",
            "Produce",
            "oranges.jpg",
            vec![(4, 300), (12, 800)],
        ),
        ("Oat Milk", "Drinks", "oat-milk.jpg", vec![(1, 420)]),
    ];

    for (name, category, image, tiers) in catalog {
        if existing.iter().any(|p| p.name == name) {
            continue;
        }
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            image: image.to_string(),
            store_id,
            is_top_product: false,
            quantities: tiers
                .into_iter()
                .map(|(quantity, price)| QuantityTier { quantity, price })
                .collect(),
            created_at: Utc::now(),
        };
        state.db.insert_product(product).await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_cart(state: &AppState, customer_id: Uuid, store_id: Uuid) -> anyhow::Result<()> {
    if state.db.cart_by_customer(customer_id).await?.is_some() {
        println!("Cart already present");
        return Ok(());
    }

    let products = state.db.products_by_store(store_id).await?;
    let Some(product) = products.first() else {
        return Ok(());
    };
    let price = product.quantities.first().map(|t| t.price).unwrap_or(650);

    cart_service::add_item(
        state,
        AddToCartRequest {
            user_id: customer_id,
            product_id: product.id,
            quantity: 2,
            price,
        },
    )
    .await?;

    println!("Seeded cart for {customer_id}");
    Ok(())
}
