use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
    StoreManager,
    DeliveryPerson,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
            Role::StoreManager => "store_manager",
            Role::DeliveryPerson => "delivery_person",
        }
    }

    /// Human-facing name used in response messages ("Store Manager not found").
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Customer => "User",
            Role::Admin => "Admin",
            Role::StoreManager => "Store Manager",
            Role::DeliveryPerson => "Delivery Person",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            "store_manager" => Ok(Role::StoreManager),
            "delivery_person" => Ok(Role::DeliveryPerson),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub saved_addresses: Vec<String>,
    #[serde(default)]
    pub favorite_stores: Vec<Uuid>,
    #[serde(default)]
    pub payment_methods: Vec<String>,
    #[serde(default = "default_true")]
    pub notification_preferences: bool,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

fn default_true() -> bool {
    true
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            address: None,
            profile_picture: None,
            saved_addresses: Vec::new(),
            favorite_stores: Vec::new(),
            payment_methods: Vec::new(),
            notification_preferences: true,
            location: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub store_id: Uuid,
}

/// Role tag plus the role-specific payload, flattened into the principal on
/// the wire: customers carry their profile, staff carry their store binding.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleData {
    Customer(CustomerProfile),
    Admin,
    StoreManager(StaffProfile),
    DeliveryPerson(StaffProfile),
}

impl RoleData {
    pub fn role(&self) -> Role {
        match self {
            RoleData::Customer(_) => Role::Customer,
            RoleData::Admin => Role::Admin,
            RoleData::StoreManager(_) => Role::StoreManager,
            RoleData::DeliveryPerson(_) => Role::DeliveryPerson,
        }
    }

    pub fn store_id(&self) -> Option<Uuid> {
        match self {
            RoleData::StoreManager(staff) | RoleData::DeliveryPerson(staff) => {
                Some(staff.store_id)
            }
            _ => None,
        }
    }
}

/// One record for every authenticated actor. Uniqueness of email and phone is
/// scoped per role, so the same person may hold accounts of different kinds.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(flatten)]
    pub data: RoleData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
    pub owner: Uuid,
    pub is_active: bool,
    pub location: GeoPoint,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuantityTier {
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub image: String,
    pub store_id: Uuid,
    pub is_top_product: bool,
    pub quantities: Vec<QuantityTier>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

impl CartItem {
    fn contribution(&self) -> i64 {
        self.quantity as i64 * self.unit_price
    }
}

/// One cart per customer. `total_price` is maintained incrementally by the
/// mutation methods below and must always equal `recomputed_total()`; both
/// datastore backends go through these methods so the arithmetic lives once.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub items: Vec<CartItem>,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn empty(customer_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            items: Vec::new(),
            total_price: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a line item, merging into an existing line when the product is
    /// already present. On merge the line's stored unit price governs the
    /// total increment; the caller-supplied price only applies to new lines.
    /// Returns the id of the touched line.
    pub fn add_line(&mut self, product_id: Uuid, quantity: i32, unit_price: i64) -> Uuid {
        self.updated_at = Utc::now();
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity += quantity;
            self.total_price += quantity as i64 * item.unit_price;
            return item.id;
        }
        let item = CartItem {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            unit_price,
        };
        self.total_price += item.contribution();
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Replaces a line's quantity. The stale contribution is subtracted
    /// before the new one is added back; the order matters for the running
    /// total. Returns false when no line has that id.
    pub fn set_line_quantity(&mut self, item_id: Uuid, quantity: i32) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) else {
            return false;
        };
        self.total_price -= item.contribution();
        item.quantity = quantity;
        self.total_price += item.contribution();
        self.updated_at = Utc::now();
        true
    }

    /// Removes a line and its contribution to the total. Returns false when
    /// no line has that id.
    pub fn remove_line(&mut self, item_id: Uuid) -> bool {
        let Some(pos) = self.items.iter().position(|i| i.id == item_id) else {
            return false;
        };
        self.total_price -= self.items[pos].contribution();
        self.items.remove(pos);
        self.updated_at = Utc::now();
        true
    }

    /// Total derived from the items alone, used to check the incrementally
    /// maintained one for drift.
    pub fn recomputed_total(&self) -> i64 {
        self.items.iter().map(CartItem::contribution).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_line_merges_same_product() {
        let product = Uuid::new_v4();
        let mut cart = Cart::empty(Uuid::new_v4());

        let first = cart.add_line(product, 2, 50);
        let second = cart.add_line(product, 3, 50);

        assert_eq!(first, second);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.total_price, 250);
    }

    #[test]
    fn merge_keeps_stored_unit_price() {
        let product = Uuid::new_v4();
        let mut cart = Cart::empty(Uuid::new_v4());

        cart.add_line(product, 2, 50);
        // A different price on the second add must not apply to the merged line.
        cart.add_line(product, 3, 999);

        assert_eq!(cart.items[0].unit_price, 50);
        assert_eq!(cart.total_price, 250);
        assert_eq!(cart.total_price, cart.recomputed_total());
    }

    #[test]
    fn set_line_quantity_swaps_contribution() {
        let mut cart = Cart::empty(Uuid::new_v4());
        let item = cart.add_line(Uuid::new_v4(), 4, 10);
        assert_eq!(cart.total_price, 40);

        assert!(cart.set_line_quantity(item, 1));
        assert_eq!(cart.total_price, 10);
        assert_eq!(cart.total_price, cart.recomputed_total());
    }

    #[test]
    fn set_line_quantity_unknown_item() {
        let mut cart = Cart::empty(Uuid::new_v4());
        cart.add_line(Uuid::new_v4(), 1, 5);
        assert!(!cart.set_line_quantity(Uuid::new_v4(), 3));
        assert_eq!(cart.total_price, 5);
    }

    #[test]
    fn remove_line_drops_contribution() {
        let mut cart = Cart::empty(Uuid::new_v4());
        let keep = cart.add_line(Uuid::new_v4(), 2, 100);
        let gone = cart.add_line(Uuid::new_v4(), 1, 30);

        assert!(cart.remove_line(gone));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, keep);
        assert_eq!(cart.total_price, 200);
        assert_eq!(cart.total_price, cart.recomputed_total());
    }

    #[test]
    fn total_never_drifts_across_mixed_operations() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cart = Cart::empty(Uuid::new_v4());

        cart.add_line(a, 2, 50);
        let b_item = cart.add_line(b, 7, 15);
        cart.add_line(a, 1, 50);
        cart.set_line_quantity(b_item, 2);
        cart.remove_line(b_item);
        cart.add_line(b, 4, 20);

        assert_eq!(cart.total_price, cart.recomputed_total());
    }
}
