use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Cart, CartItem, CustomerProfile, GeoPoint, Principal, Product, QuantityTier, Role, RoleData,
    StaffProfile, Store,
};

use super::{AuditEntry, Datastore, PrincipalPatch, ProductPatch};

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Postgres-backed [`Datastore`]. Role payloads and quantity tiers are kept
/// as JSONB; every cart mutation runs in a transaction holding the cart row
/// `FOR UPDATE`, then writes the items back whole, document style.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PrincipalRow {
    id: Uuid,
    role: String,
    name: String,
    email: String,
    phone: String,
    password_hash: String,
    profile: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    fn into_principal(self) -> AppResult<Principal> {
        let role =
            Role::from_str(&self.role).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        let data = role_data_from_columns(role, self.profile)?;
        Ok(Principal {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn role_data_from_columns(role: Role, profile: Option<Value>) -> AppResult<RoleData> {
    Ok(match role {
        Role::Admin => RoleData::Admin,
        Role::Customer => {
            let profile: CustomerProfile = match profile {
                Some(value) => {
                    serde_json::from_value(value).map_err(|e| AppError::Internal(e.into()))?
                }
                None => CustomerProfile::default(),
            };
            RoleData::Customer(profile)
        }
        Role::StoreManager => RoleData::StoreManager(staff_from_column(profile)?),
        Role::DeliveryPerson => RoleData::DeliveryPerson(staff_from_column(profile)?),
    })
}

fn staff_from_column(profile: Option<Value>) -> AppResult<StaffProfile> {
    let value = profile.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("staff principal without store binding"))
    })?;
    serde_json::from_value(value).map_err(|e| AppError::Internal(e.into()))
}

fn profile_column(data: &RoleData) -> AppResult<Option<Value>> {
    Ok(match data {
        RoleData::Admin => None,
        RoleData::Customer(profile) => {
            Some(serde_json::to_value(profile).map_err(|e| AppError::Internal(e.into()))?)
        }
        RoleData::StoreManager(staff) | RoleData::DeliveryPerson(staff) => {
            Some(serde_json::to_value(staff).map_err(|e| AppError::Internal(e.into()))?)
        }
    })
}

#[derive(FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    city: String,
    address: String,
    owner: Uuid,
    is_active: bool,
    longitude: f64,
    latitude: f64,
    created_at: DateTime<Utc>,
}

impl StoreRow {
    fn into_store(self) -> Store {
        Store {
            id: self.id,
            name: self.name,
            city: self.city,
            address: self.address,
            owner: self.owner,
            is_active: self.is_active,
            location: GeoPoint {
                longitude: self.longitude,
                latitude: self.latitude,
            },
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    store_id: Uuid,
    name: String,
    description: Option<String>,
    category: String,
    image: String,
    is_top_product: bool,
    quantities: Value,
    created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> AppResult<Product> {
        let quantities: Vec<QuantityTier> =
            serde_json::from_value(self.quantities).map_err(|e| AppError::Internal(e.into()))?;
        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            image: self.image,
            store_id: self.store_id,
            is_top_product: self.is_top_product,
            quantities,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CartRow {
    id: Uuid,
    customer_id: Uuid,
    total_price: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CartItemRow {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: i64,
}

impl CartRow {
    fn into_cart(self, items: Vec<CartItemRow>) -> Cart {
        Cart {
            id: self.id,
            customer_id: self.customer_id,
            items: items
                .into_iter()
                .map(|row| CartItem {
                    id: row.id,
                    product_id: row.product_id,
                    quantity: row.quantity,
                    unit_price: row.unit_price,
                })
                .collect(),
            total_price: self.total_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

impl PgStore {
    async fn lock_cart(
        tx: &mut Transaction<'_, Postgres>,
        customer_id: Uuid,
    ) -> AppResult<Option<Cart>> {
        let row: Option<CartRow> =
            sqlx::query_as("SELECT * FROM carts WHERE customer_id = $1 FOR UPDATE")
                .bind(customer_id)
                .fetch_optional(&mut **tx)
                .await?;
        let Some(row) = row else { return Ok(None) };
        let items: Vec<CartItemRow> =
            sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY position")
                .bind(row.id)
                .fetch_all(&mut **tx)
                .await?;
        Ok(Some(row.into_cart(items)))
    }

    async fn lock_cart_by_item(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
    ) -> AppResult<Option<Cart>> {
        let row: Option<CartRow> = sqlx::query_as(
            r#"
            SELECT c.* FROM carts c
            JOIN cart_items ci ON ci.cart_id = c.id
            WHERE ci.id = $1
            FOR UPDATE OF c
            "#,
        )
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;
        let Some(row) = row else { return Ok(None) };
        let items: Vec<CartItemRow> =
            sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY position")
                .bind(row.id)
                .fetch_all(&mut **tx)
                .await?;
        Ok(Some(row.into_cart(items)))
    }

    /// Writes the mutated cart back whole: items are replaced like the array
    /// of an embedded document, then the total and timestamp follow.
    async fn write_cart(tx: &mut Transaction<'_, Postgres>, cart: &Cart) -> AppResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut **tx)
            .await?;
        for (position, item) in cart.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (id, cart_id, product_id, quantity, unit_price, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id)
            .bind(cart.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(position as i32)
            .execute(&mut **tx)
            .await?;
        }
        sqlx::query("UPDATE carts SET total_price = $2, updated_at = $3 WHERE id = $1")
            .bind(cart.id)
            .bind(cart.total_price)
            .bind(cart.updated_at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn insert_principal(&self, principal: Principal) -> AppResult<Principal> {
        let profile = profile_column(&principal.data)?;
        let result = sqlx::query(
            r#"
            INSERT INTO principals (id, role, name, email, phone, password_hash, profile, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(principal.id)
        .bind(principal.data.role().as_str())
        .bind(&principal.name)
        .bind(&principal.email)
        .bind(&principal.phone)
        .bind(&principal.password_hash)
        .bind(profile)
        .bind(principal.created_at)
        .bind(principal.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(principal),
            Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(format!(
                "{} already exists",
                principal.data.role().display_name()
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn principal_by_email(&self, role: Role, email: &str) -> AppResult<Option<Principal>> {
        let row: Option<PrincipalRow> =
            sqlx::query_as("SELECT * FROM principals WHERE role = $1 AND email = $2")
                .bind(role.as_str())
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn principal_by_phone(&self, role: Role, phone: &str) -> AppResult<Option<Principal>> {
        let row: Option<PrincipalRow> =
            sqlx::query_as("SELECT * FROM principals WHERE role = $1 AND phone = $2")
                .bind(role.as_str())
                .bind(phone)
                .fetch_optional(&self.pool)
                .await?;
        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn principal_by_id(&self, role: Role, id: Uuid) -> AppResult<Option<Principal>> {
        let row: Option<PrincipalRow> =
            sqlx::query_as("SELECT * FROM principals WHERE role = $1 AND id = $2")
                .bind(role.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn list_principals(
        &self,
        role: Role,
        store_id: Option<Uuid>,
    ) -> AppResult<Vec<Principal>> {
        let rows: Vec<PrincipalRow> = match store_id {
            Some(store) => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM principals
                    WHERE role = $1 AND (profile->>'storeId')::uuid = $2
                    ORDER BY created_at
                    "#,
                )
                .bind(role.as_str())
                .bind(store)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM principals WHERE role = $1 ORDER BY created_at")
                    .bind(role.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter()
            .map(PrincipalRow::into_principal)
            .collect()
    }

    async fn update_principal(
        &self,
        role: Role,
        id: Uuid,
        store_id: Option<Uuid>,
        patch: PrincipalPatch,
    ) -> AppResult<Option<Principal>> {
        let mut tx = self.pool.begin().await?;
        let row: Option<PrincipalRow> =
            sqlx::query_as("SELECT * FROM principals WHERE id = $1 AND role = $2 FOR UPDATE")
                .bind(id)
                .bind(role.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(row) = row else { return Ok(None) };
        let mut principal = row.into_principal()?;
        if let Some(store) = store_id {
            if principal.data.store_id() != Some(store) {
                return Ok(None);
            }
        }

        patch.apply_to(&mut principal);
        let profile = profile_column(&principal.data)?;
        let result = sqlx::query(
            r#"
            UPDATE principals
            SET name = $2, phone = $3, password_hash = $4, profile = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(principal.id)
        .bind(&principal.name)
        .bind(&principal.phone)
        .bind(&principal.password_hash)
        .bind(profile)
        .bind(principal.updated_at)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {
                tx.commit().await?;
                Ok(Some(principal))
            }
            Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(format!(
                "{} already exists",
                role.display_name()
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_principal(
        &self,
        role: Role,
        id: Uuid,
        store_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let result = match store_id {
            Some(store) => {
                sqlx::query(
                    r#"
                    DELETE FROM principals
                    WHERE id = $1 AND role = $2 AND (profile->>'storeId')::uuid = $3
                    "#,
                )
                .bind(id)
                .bind(role.as_str())
                .bind(store)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("DELETE FROM principals WHERE id = $1 AND role = $2")
                    .bind(id)
                    .bind(role.as_str())
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    async fn insert_store(&self, store: Store) -> AppResult<Store> {
        sqlx::query(
            r#"
            INSERT INTO stores (id, name, city, address, owner, is_active, longitude, latitude, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(store.id)
        .bind(&store.name)
        .bind(&store.city)
        .bind(&store.address)
        .bind(store.owner)
        .bind(store.is_active)
        .bind(store.location.longitude)
        .bind(store.location.latitude)
        .bind(store.created_at)
        .execute(&self.pool)
        .await?;
        Ok(store)
    }

    async fn store_by_id(&self, id: Uuid) -> AppResult<Option<Store>> {
        let row: Option<StoreRow> = sqlx::query_as("SELECT * FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(StoreRow::into_store))
    }

    async fn list_active_stores(&self, city: Option<&str>) -> AppResult<Vec<Store>> {
        let rows: Vec<StoreRow> = match city {
            Some(city) => {
                sqlx::query_as(
                    "SELECT * FROM stores WHERE is_active AND city = $1 ORDER BY created_at",
                )
                .bind(city)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM stores WHERE is_active ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(StoreRow::into_store).collect())
    }

    async fn delete_store(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_product(&self, product: Product) -> AppResult<Product> {
        let quantities =
            serde_json::to_value(&product.quantities).map_err(|e| AppError::Internal(e.into()))?;
        sqlx::query(
            r#"
            INSERT INTO products (id, store_id, name, description, category, image, is_top_product, quantities, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id)
        .bind(product.store_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.is_top_product)
        .bind(quantities)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(product)
    }

    async fn products_by_store(&self, store_id: Uuid) -> AppResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as("SELECT * FROM products WHERE store_id = $1 ORDER BY created_at")
                .bind(store_id)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn product_in_store(
        &self,
        store_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT * FROM products WHERE id = $1 AND store_id = $2")
                .bind(product_id)
                .bind(store_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(ProductRow::into_product).transpose()
    }

    async fn update_product(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        patch: ProductPatch,
    ) -> AppResult<Option<Product>> {
        let mut tx = self.pool.begin().await?;
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT * FROM products WHERE id = $1 AND store_id = $2 FOR UPDATE")
                .bind(product_id)
                .bind(store_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(row) = row else { return Ok(None) };
        let mut product = row.into_product()?;
        patch.apply_to(&mut product);

        let quantities =
            serde_json::to_value(&product.quantities).map_err(|e| AppError::Internal(e.into()))?;
        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, category = $4, image = $5, is_top_product = $6, quantities = $7
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.is_top_product)
        .bind(quantities)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(product))
    }

    async fn delete_product(&self, store_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND store_id = $2")
            .bind(product_id)
            .bind(store_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn cart_by_customer(&self, customer_id: Uuid) -> AppResult<Option<Cart>> {
        let row: Option<CartRow> = sqlx::query_as("SELECT * FROM carts WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let items: Vec<CartItemRow> =
            sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY position")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;
        Ok(Some(row.into_cart(items)))
    }

    async fn add_cart_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: i64,
    ) -> AppResult<Cart> {
        let mut tx = self.pool.begin().await?;
        // Lazy creation: the conflict target makes two racing first adds
        // converge on a single cart row.
        let fresh = Cart::empty(customer_id);
        sqlx::query(
            r#"
            INSERT INTO carts (id, customer_id, total_price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (customer_id) DO NOTHING
            "#,
        )
        .bind(fresh.id)
        .bind(customer_id)
        .bind(fresh.total_price)
        .bind(fresh.created_at)
        .bind(fresh.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut cart = Self::lock_cart(&mut tx, customer_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart row missing after upsert")))?;
        cart.add_line(product_id, quantity, unit_price);
        Self::write_cart(&mut tx, &cart).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn update_cart_item(&self, item_id: Uuid, quantity: i32) -> AppResult<Option<Cart>> {
        let mut tx = self.pool.begin().await?;
        let Some(mut cart) = Self::lock_cart_by_item(&mut tx, item_id).await? else {
            return Ok(None);
        };
        if !cart.set_line_quantity(item_id, quantity) {
            return Ok(None);
        }
        Self::write_cart(&mut tx, &cart).await?;
        tx.commit().await?;
        Ok(Some(cart))
    }

    async fn remove_cart_item(&self, item_id: Uuid) -> AppResult<Option<Cart>> {
        let mut tx = self.pool.begin().await?;
        let Some(mut cart) = Self::lock_cart_by_item(&mut tx, item_id).await? else {
            return Ok(None);
        };
        if !cart.remove_line(item_id) {
            return Ok(None);
        }
        Self::write_cart(&mut tx, &cart).await?;
        tx.commit().await?;
        Ok(Some(cart))
    }

    async fn delete_cart(&self, customer_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM carts WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_audit(&self, entry: AuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, principal_id, action, resource, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.principal_id)
        .bind(&entry.action)
        .bind(&entry.resource)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
