// src/routes.rs

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    common::response::ApiResponse,
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::auth_guard,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Origem CORS inválida ignorada");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    // Com origens explícitas o painel pode mandar o cookie de sessão
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT_LANGUAGE])
        .allow_credentials(true)
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas do cliente
    let order_routes = Router::new()
        .route("/", post(handlers::orders::create_order))
        .route("/eligibility", post(handlers::orders::check_eligibility))
        .route("/{id}", get(handlers::orders::get_order_status))
        .route("/{id}/complete", get(handlers::orders::complete_via_link));

    let catalog_routes = Router::new()
        .route("/locations", get(handlers::catalog::list_locations))
        .route("/categories", get(handlers::catalog::list_categories))
        .route("/categories/{id}/eligibility", get(handlers::catalog::category_eligibility))
        .route("/products", get(handlers::catalog::list_products));

    // Login e logout não passam pelo guard
    let admin_session_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout));

    let admin_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/orders", get(handlers::admin_orders::list_orders))
        .route(
            "/orders/{id}",
            get(handlers::admin_orders::get_order).patch(handlers::admin_orders::update_order_status),
        )
        .route("/orders/{id}/status", put(handlers::admin_orders::update_order_status))
        .route("/locations", post(handlers::catalog::create_location))
        .route("/locations/{id}", patch(handlers::catalog::update_location))
        .route("/categories", post(handlers::catalog::create_category))
        .route("/categories/{id}", patch(handlers::catalog::update_category))
        .route("/products", post(handlers::catalog::create_product))
        .route("/products/{id}", patch(handlers::catalog::update_product))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let cors = cors_layer(&app_state.settings.cors_origins);

    // Combina tudo no router principal
    Router::new()
        .route(
            "/api/health",
            get(|| async { ApiResponse::ok(serde_json::json!({ "status": "ok" })) }),
        )
        .nest("/api/orders", order_routes)
        .nest("/api", catalog_routes)
        .nest("/api/admin", admin_session_routes.merge(admin_routes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
