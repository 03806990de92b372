// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Orders (público) ---
        handlers::orders::create_order,
        handlers::orders::get_order_status,
        handlers::orders::check_eligibility,
        handlers::orders::complete_via_link,

        // --- Catalog (público) ---
        handlers::catalog::list_locations,
        handlers::catalog::list_categories,
        handlers::catalog::category_eligibility,
        handlers::catalog::list_products,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Admin Orders ---
        handlers::admin_orders::list_orders,
        handlers::admin_orders::get_order,
        handlers::admin_orders::update_order_status,

        // --- Admin Catalog ---
        handlers::catalog::create_location,
        handlers::catalog::update_location,
        handlers::catalog::create_category,
        handlers::catalog::update_category,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
    ),
    components(
        schemas(
            // --- Catálogo ---
            models::catalog::Translations,
            models::catalog::ProductTranslations,
            models::catalog::LocationType,
            models::catalog::Location,
            models::catalog::Category,
            models::catalog::Product,

            // --- Pedidos ---
            models::order::OrderStatus,
            models::order::OrderLine,
            models::order::Order,
            models::order::OrderSummary,

            // --- Auth ---
            models::auth::AdminRole,
            models::auth::AdminProfile,
            models::auth::LoginPayload,

            // --- Elegibilidade ---
            services::eligibility::Rejection,
            services::eligibility::Decision,

            // --- Payloads ---
            handlers::orders::OrderLinePayload,
            handlers::orders::CreateOrderPayload,
            handlers::orders::CheckoutEligibilityPayload,
            handlers::admin_orders::UpdateStatusPayload,
            handlers::catalog::CreateLocationPayload,
            handlers::catalog::UpdateLocationPayload,
            handlers::catalog::CreateCategoryPayload,
            handlers::catalog::UpdateCategoryPayload,
            handlers::catalog::CreateProductPayload,
            handlers::catalog::UpdateProductPayload,
            handlers::catalog::CategoryEligibilityResponse,
        )
    ),
    tags(
        (name = "Orders", description = "Pedidos do cliente"),
        (name = "Catalog", description = "Locais, categorias e produtos"),
        (name = "Auth", description = "Sessão do staff"),
        (name = "Admin Orders", description = "Painel de pedidos"),
        (name = "Admin Catalog", description = "Manutenção do catálogo")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
        components.add_security_scheme(
            "admin_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("admin_token"))),
        );
    }
}
