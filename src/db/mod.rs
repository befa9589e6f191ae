use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Cart, GeoPoint, Principal, Product, QuantityTier, Role, RoleData, Store};

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::{PgStore, create_pool};

/// Partial update for a principal. `profile` only applies to customers and
/// is ignored for the other roles.
#[derive(Debug, Default, Clone)]
pub struct PrincipalPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub profile: Option<ProfilePatch>,
}

#[derive(Debug, Default, Clone)]
pub struct ProfilePatch {
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub saved_addresses: Option<Vec<String>>,
    pub favorite_stores: Option<Vec<Uuid>>,
    pub payment_methods: Option<Vec<String>>,
    pub notification_preferences: Option<bool>,
    pub location: Option<GeoPoint>,
}

impl PrincipalPatch {
    pub fn apply_to(&self, principal: &mut Principal) {
        if let Some(name) = &self.name {
            principal.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            principal.phone = phone.clone();
        }
        if let Some(hash) = &self.password_hash {
            principal.password_hash = hash.clone();
        }
        if let (Some(patch), RoleData::Customer(profile)) = (&self.profile, &mut principal.data) {
            patch.apply_to(profile);
        }
        principal.updated_at = Utc::now();
    }
}

impl ProfilePatch {
    fn apply_to(&self, profile: &mut crate::models::CustomerProfile) {
        if let Some(address) = &self.address {
            profile.address = Some(address.clone());
        }
        if let Some(picture) = &self.profile_picture {
            profile.profile_picture = Some(picture.clone());
        }
        if let Some(addresses) = &self.saved_addresses {
            profile.saved_addresses = addresses.clone();
        }
        if let Some(stores) = &self.favorite_stores {
            profile.favorite_stores = stores.clone();
        }
        if let Some(methods) = &self.payment_methods {
            profile.payment_methods = methods.clone();
        }
        if let Some(prefs) = self.notification_preferences {
            profile.notification_preferences = prefs;
        }
        if let Some(location) = self.location {
            profile.location = Some(location);
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub is_top_product: Option<bool>,
    pub quantities: Option<Vec<QuantityTier>>,
}

impl ProductPatch {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
        if let Some(top) = self.is_top_product {
            product.is_top_product = top;
        }
        if let Some(quantities) = &self.quantities {
            product.quantities = quantities.clone();
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: Uuid,
    pub principal_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Persistence contract behind the services. Constructed once at startup and
/// handed around through `AppState`, so tests can swap in [`MemStore`].
///
/// Cart mutations are atomic per cart: a backend must apply the whole
/// read-modify-write under a per-cart lock (or equivalent) so concurrent
/// mutations of one customer's cart cannot lose updates.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn insert_principal(&self, principal: Principal) -> AppResult<Principal>;
    async fn principal_by_email(&self, role: Role, email: &str) -> AppResult<Option<Principal>>;
    async fn principal_by_phone(&self, role: Role, phone: &str) -> AppResult<Option<Principal>>;
    async fn principal_by_id(&self, role: Role, id: Uuid) -> AppResult<Option<Principal>>;
    /// Principals of one role, optionally narrowed to one store's staff.
    async fn list_principals(
        &self,
        role: Role,
        store_id: Option<Uuid>,
    ) -> AppResult<Vec<Principal>>;
    /// Applies a patch to the principal matched by role, id and (when given)
    /// store binding. Returns None when nothing matches.
    async fn update_principal(
        &self,
        role: Role,
        id: Uuid,
        store_id: Option<Uuid>,
        patch: PrincipalPatch,
    ) -> AppResult<Option<Principal>>;
    async fn delete_principal(
        &self,
        role: Role,
        id: Uuid,
        store_id: Option<Uuid>,
    ) -> AppResult<bool>;

    async fn insert_store(&self, store: Store) -> AppResult<Store>;
    async fn store_by_id(&self, id: Uuid) -> AppResult<Option<Store>>;
    async fn list_active_stores(&self, city: Option<&str>) -> AppResult<Vec<Store>>;
    async fn delete_store(&self, id: Uuid) -> AppResult<bool>;

    async fn insert_product(&self, product: Product) -> AppResult<Product>;
    async fn products_by_store(&self, store_id: Uuid) -> AppResult<Vec<Product>>;
    async fn product_in_store(
        &self,
        store_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<Product>>;
    /// Store-scoped patch: a product id under the wrong store matches nothing.
    async fn update_product(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        patch: ProductPatch,
    ) -> AppResult<Option<Product>>;
    async fn delete_product(&self, store_id: Uuid, product_id: Uuid) -> AppResult<bool>;
    async fn products_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Product>>;

    async fn cart_by_customer(&self, customer_id: Uuid) -> AppResult<Option<Cart>>;
    /// Adds to the customer's cart, creating it when absent.
    async fn add_cart_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: i64,
    ) -> AppResult<Cart>;
    /// Item-addressed: finds whichever cart holds the line. None when no cart does.
    async fn update_cart_item(&self, item_id: Uuid, quantity: i32) -> AppResult<Option<Cart>>;
    async fn remove_cart_item(&self, item_id: Uuid) -> AppResult<Option<Cart>>;
    /// Drops the customer's whole cart. Succeeds whether or not one existed.
    async fn delete_cart(&self, customer_id: Uuid) -> AppResult<()>;

    async fn append_audit(&self, entry: AuditEntry) -> AppResult<()>;
}
