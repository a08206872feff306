use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::database::entities::product_templates;
use crate::errors::CatalogError;
use crate::server::app::AppState;
use crate::server::middleware::validation::ProductTemplatePayload;
use crate::server::middleware::{Params, Valid};
use crate::server::response::{created, ApiResponse, ErrorBody};
use crate::services::views::TemplateView;
use crate::services::ProductTemplateService;

#[utoipa::path(
    get,
    path = "/api/product-templates",
    tag = "product-templates",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size, capped at the configured maximum"),
        ("include_categories" = Option<bool>, Query, description = "Embed option categories")
    ),
    responses(
        (status = 200, description = "Product templates, newest first"),
        (status = 400, description = "Validation Error", body = ErrorBody)
    )
)]
pub async fn list_product_templates(
    State(state): State<AppState>,
    params: Params,
) -> Result<ApiResponse<Vec<TemplateView>>, CatalogError> {
    let page = params.page(&state.config.pagination)?;
    let page = ProductTemplateService::new(state.db.clone())
        .list(page, params.flag("include_categories"))
        .await?;
    Ok(ApiResponse::page(page))
}

#[utoipa::path(
    post,
    path = "/api/product-templates",
    tag = "product-templates",
    request_body = ProductTemplatePayload,
    responses(
        (status = 201, description = "Product template created successfully"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 409, description = "Resource already exists", body = ErrorBody)
    )
)]
pub async fn create_product_template(
    State(state): State<AppState>,
    Valid(input): Valid<ProductTemplatePayload>,
) -> Result<Response, CatalogError> {
    let template = ProductTemplateService::new(state.db.clone()).create(input).await?;
    Ok(created(template, "Product template created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/product-templates/{template_str_id}",
    tag = "product-templates",
    params(
        ("template_str_id" = String, Path, description = "Product template key"),
        ("include_categories" = Option<bool>, Query, description = "Embed option categories")
    ),
    responses(
        (status = 200, description = "Product template found"),
        (status = 404, description = "Product template not found", body = ErrorBody)
    )
)]
pub async fn get_product_template(
    State(state): State<AppState>,
    Path(template_str_id): Path<String>,
    params: Params,
) -> Result<ApiResponse<TemplateView>, CatalogError> {
    let view = ProductTemplateService::new(state.db.clone())
        .get(&template_str_id, params.flag("include_categories"))
        .await?;
    Ok(ApiResponse::ok(view))
}

#[utoipa::path(
    put,
    path = "/api/product-templates/{template_str_id}",
    tag = "product-templates",
    params(("template_str_id" = String, Path, description = "Product template key")),
    request_body = ProductTemplatePayload,
    responses(
        (status = 200, description = "Product template updated successfully"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 404, description = "Product template not found", body = ErrorBody),
        (status = 409, description = "Resource already exists", body = ErrorBody)
    )
)]
pub async fn update_product_template(
    State(state): State<AppState>,
    Path(template_str_id): Path<String>,
    Valid(input): Valid<ProductTemplatePayload>,
) -> Result<ApiResponse<product_templates::Model>, CatalogError> {
    let template = ProductTemplateService::new(state.db.clone())
        .update(&template_str_id, input)
        .await?;
    Ok(ApiResponse::with_message(template, "Product template updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/product-templates/{template_str_id}",
    tag = "product-templates",
    params(("template_str_id" = String, Path, description = "Product template key")),
    responses(
        (status = 200, description = "Product template and everything under it deleted"),
        (status = 404, description = "Product template not found", body = ErrorBody)
    )
)]
pub async fn delete_product_template(
    State(state): State<AppState>,
    Path(template_str_id): Path<String>,
) -> Result<ApiResponse<()>, CatalogError> {
    ProductTemplateService::new(state.db.clone())
        .delete(&template_str_id)
        .await?;
    Ok(ApiResponse::message("Product template deleted successfully"))
}
