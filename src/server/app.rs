use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    compatibility_rules, health, index, option_categories, option_choices, product_templates,
};
use super::openapi;
use super::response::{set_environment, ErrorBody};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

pub async fn create_app(db: DatabaseConnection, config: AppConfig) -> Result<Router> {
    set_environment(config.environment);

    let cors = match config.server.cors_origin.as_deref() {
        Some(origin) if origin != "*" => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin '{}'", origin))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let state = AppState {
        db,
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index::api_index))
        .route("/openapi.json", get(openapi::openapi_json))
        // Product templates
        .route(
            "/product-templates",
            get(product_templates::list_product_templates)
                .post(product_templates::create_product_template),
        )
        .route(
            "/product-templates/:template_str_id",
            get(product_templates::get_product_template)
                .put(product_templates::update_product_template)
                .delete(product_templates::delete_product_template),
        )
        .route(
            "/product-templates/:template_str_id/configurations/check",
            post(compatibility_rules::check_configuration),
        )
        .route(
            "/product-templates/:template_str_id/compatibility-rules/conflicts",
            get(compatibility_rules::list_rule_conflicts),
        )
        // Option categories
        .route(
            "/option-categories",
            get(option_categories::list_option_categories)
                .post(option_categories::create_option_category),
        )
        .route(
            "/option-categories/:category_str_id",
            get(option_categories::get_option_category)
                .put(option_categories::update_option_category)
                .delete(option_categories::delete_option_category),
        )
        // Option choices
        .route(
            "/option-choices",
            get(option_choices::list_option_choices).post(option_choices::create_option_choice),
        )
        .route(
            "/option-choices/:choice_str_id",
            get(option_choices::get_option_choice)
                .put(option_choices::update_option_choice)
                .delete(option_choices::delete_option_choice),
        )
        .route(
            "/option-choices/:choice_str_id/compatibility-rules",
            get(option_choices::list_choice_rules).post(option_choices::create_choice_rule),
        )
        // Compatibility rules
        .route(
            "/compatibility-rules/:rule_id",
            get(compatibility_rules::get_rule)
                .put(compatibility_rules::update_rule)
                .delete(compatibility_rules::delete_rule),
        )
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("Route not found", "NOT_FOUND")),
    )
}
