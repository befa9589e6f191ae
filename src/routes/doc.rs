use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, ProfileUpdateRequest, RegisterRequest},
        cart::{AddToCartRequest, CartItemView, CartView, UpdateCartItemRequest},
        principals::{PrincipalList, StaffRegisterRequest, StaffUpdateRequest},
        products::{
            CategoryProducts, CategoryProductsList, CreateProductRequest, ProductList,
            UpdateProductRequest,
        },
        stores::{CreateStoreRequest, StoreList},
    },
    models::{
        Cart, CartItem, CustomerProfile, GeoPoint, Principal, Product, QuantityTier, Role,
        StaffProfile, Store,
    },
    response::{ApiResponse, Meta},
    routes::{admins, auth, cart, deliveries, health, products, store_managers, stores},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::list_profiles,
        auth::get_profile,
        auth::update_profile,
        auth::delete_profile,
        stores::add_store,
        stores::list_stores,
        stores::stores_by_city,
        stores::remove_store,
        products::add_product,
        products::products_by_store,
        products::categories_with_products,
        products::get_product,
        products::update_product,
        products::remove_product,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        admins::register,
        admins::login,
        admins::list_admins,
        admins::update_admin,
        admins::remove_admin,
        store_managers::register,
        store_managers::login,
        store_managers::list_managers,
        store_managers::update_manager,
        store_managers::remove_manager,
        deliveries::register,
        deliveries::login,
        deliveries::list_by_store,
        deliveries::update_person,
        deliveries::remove_person
    ),
    components(
        schemas(
            Role,
            GeoPoint,
            CustomerProfile,
            StaffProfile,
            Principal,
            Store,
            QuantityTier,
            Product,
            Cart,
            CartItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ProfileUpdateRequest,
            StaffRegisterRequest,
            StaffUpdateRequest,
            PrincipalList,
            CreateStoreRequest,
            StoreList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CategoryProducts,
            CategoryProductsList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartView,
            CartItemView,
            Meta,
            ApiResponse<Principal>,
            ApiResponse<LoginResponse>,
            ApiResponse<PrincipalList>,
            ApiResponse<Store>,
            ApiResponse<StoreList>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryProductsList>,
            ApiResponse<Cart>,
            ApiResponse<CartView>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Customer registration, login and profile endpoints"),
        (name = "Stores", description = "Store endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Cart", description = "Shopping cart endpoints"),
        (name = "Admins", description = "Admin account endpoints"),
        (name = "Store Managers", description = "Store manager account endpoints"),
        (name = "Deliveries", description = "Delivery staff account endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
