use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Cart, Principal, Product, Role, Store};

use super::{AuditEntry, Datastore, PrincipalPatch, ProductPatch};

/// In-memory [`Datastore`] for the test suites. Vectors keep insertion
/// order so listings and category grouping come back in the same order the
/// SQL backend produces.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    principals: Vec<Principal>,
    stores: Vec<Store>,
    products: Vec<Product>,
    carts: Vec<Cart>,
    audit: Vec<AuditEntry>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.inner.lock().await.audit.clone()
    }
}

#[async_trait]
impl Datastore for MemStore {
    async fn insert_principal(&self, principal: Principal) -> AppResult<Principal> {
        let mut inner = self.inner.lock().await;
        let role = principal.data.role();
        let clash = inner.principals.iter().any(|p| {
            p.data.role() == role && (p.email == principal.email || p.phone == principal.phone)
        });
        if clash {
            return Err(AppError::Conflict(format!(
                "{} already exists",
                role.display_name()
            )));
        }
        inner.principals.push(principal.clone());
        Ok(principal)
    }

    async fn principal_by_email(&self, role: Role, email: &str) -> AppResult<Option<Principal>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .principals
            .iter()
            .find(|p| p.data.role() == role && p.email == email)
            .cloned())
    }

    async fn principal_by_phone(&self, role: Role, phone: &str) -> AppResult<Option<Principal>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .principals
            .iter()
            .find(|p| p.data.role() == role && p.phone == phone)
            .cloned())
    }

    async fn principal_by_id(&self, role: Role, id: Uuid) -> AppResult<Option<Principal>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .principals
            .iter()
            .find(|p| p.data.role() == role && p.id == id)
            .cloned())
    }

    async fn list_principals(
        &self,
        role: Role,
        store_id: Option<Uuid>,
    ) -> AppResult<Vec<Principal>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .principals
            .iter()
            .filter(|p| p.data.role() == role)
            .filter(|p| store_id.is_none() || p.data.store_id() == store_id)
            .cloned()
            .collect())
    }

    async fn update_principal(
        &self,
        role: Role,
        id: Uuid,
        store_id: Option<Uuid>,
        patch: PrincipalPatch,
    ) -> AppResult<Option<Principal>> {
        let mut inner = self.inner.lock().await;
        let Some(idx) = inner
            .principals
            .iter()
            .position(|p| p.data.role() == role && p.id == id)
        else {
            return Ok(None);
        };
        if let Some(store) = store_id {
            if inner.principals[idx].data.store_id() != Some(store) {
                return Ok(None);
            }
        }
        if let Some(phone) = patch.phone.as_deref() {
            let taken = inner
                .principals
                .iter()
                .any(|p| p.data.role() == role && p.id != id && p.phone == phone);
            if taken {
                return Err(AppError::Conflict(format!(
                    "{} already exists",
                    role.display_name()
                )));
            }
        }
        let principal = &mut inner.principals[idx];
        patch.apply_to(principal);
        Ok(Some(principal.clone()))
    }

    async fn delete_principal(
        &self,
        role: Role,
        id: Uuid,
        store_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        let Some(idx) = inner.principals.iter().position(|p| {
            p.data.role() == role
                && p.id == id
                && (store_id.is_none() || p.data.store_id() == store_id)
        }) else {
            return Ok(false);
        };
        inner.principals.remove(idx);
        Ok(true)
    }

    async fn insert_store(&self, store: Store) -> AppResult<Store> {
        let mut inner = self.inner.lock().await;
        inner.stores.push(store.clone());
        Ok(store)
    }

    async fn store_by_id(&self, id: Uuid) -> AppResult<Option<Store>> {
        let inner = self.inner.lock().await;
        Ok(inner.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn list_active_stores(&self, city: Option<&str>) -> AppResult<Vec<Store>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .stores
            .iter()
            .filter(|s| s.is_active)
            .filter(|s| city.is_none_or(|c| s.city == c))
            .cloned()
            .collect())
    }

    async fn delete_store(&self, id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        let Some(idx) = inner.stores.iter().position(|s| s.id == id) else {
            return Ok(false);
        };
        inner.stores.remove(idx);
        Ok(true)
    }

    async fn insert_product(&self, product: Product) -> AppResult<Product> {
        let mut inner = self.inner.lock().await;
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn products_by_store(&self, store_id: Uuid) -> AppResult<Vec<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .iter()
            .filter(|p| p.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn product_in_store(
        &self,
        store_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .iter()
            .find(|p| p.id == product_id && p.store_id == store_id)
            .cloned())
    }

    async fn update_product(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        patch: ProductPatch,
    ) -> AppResult<Option<Product>> {
        let mut inner = self.inner.lock().await;
        let Some(product) = inner
            .products
            .iter_mut()
            .find(|p| p.id == product_id && p.store_id == store_id)
        else {
            return Ok(None);
        };
        patch.apply_to(product);
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, store_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        let Some(idx) = inner
            .products
            .iter()
            .position(|p| p.id == product_id && p.store_id == store_id)
        else {
            return Ok(false);
        };
        inner.products.remove(idx);
        Ok(true)
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn cart_by_customer(&self, customer_id: Uuid) -> AppResult<Option<Cart>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .carts
            .iter()
            .find(|c| c.customer_id == customer_id)
            .cloned())
    }

    async fn add_cart_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: i64,
    ) -> AppResult<Cart> {
        let mut inner = self.inner.lock().await;
        let idx = match inner
            .carts
            .iter()
            .position(|c| c.customer_id == customer_id)
        {
            Some(idx) => idx,
            None => {
                inner.carts.push(Cart::empty(customer_id));
                inner.carts.len() - 1
            }
        };
        let cart = &mut inner.carts[idx];
        cart.add_line(product_id, quantity, unit_price);
        Ok(cart.clone())
    }

    async fn update_cart_item(&self, item_id: Uuid, quantity: i32) -> AppResult<Option<Cart>> {
        let mut inner = self.inner.lock().await;
        let Some(cart) = inner
            .carts
            .iter_mut()
            .find(|c| c.items.iter().any(|i| i.id == item_id))
        else {
            return Ok(None);
        };
        if !cart.set_line_quantity(item_id, quantity) {
            return Ok(None);
        }
        Ok(Some(cart.clone()))
    }

    async fn remove_cart_item(&self, item_id: Uuid) -> AppResult<Option<Cart>> {
        let mut inner = self.inner.lock().await;
        let Some(cart) = inner
            .carts
            .iter_mut()
            .find(|c| c.items.iter().any(|i| i.id == item_id))
        else {
            return Ok(None);
        };
        if !cart.remove_line(item_id) {
            return Ok(None);
        }
        Ok(Some(cart.clone()))
    }

    async fn delete_cart(&self, customer_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.carts.retain(|c| c.customer_id != customer_id);
        Ok(())
    }

    async fn append_audit(&self, entry: AuditEntry) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.audit.push(entry);
        Ok(())
    }
}
