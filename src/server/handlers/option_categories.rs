use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::database::entities::option_categories;
use crate::errors::CatalogError;
use crate::server::app::AppState;
use crate::server::middleware::validation::OptionCategoryPayload;
use crate::server::middleware::{Params, Valid};
use crate::server::response::{created, ApiResponse, ErrorBody};
use crate::services::views::CategoryView;
use crate::services::{OptionCategoryService, ParentScope};

#[utoipa::path(
    get,
    path = "/api/option-categories",
    tag = "option-categories",
    params(
        ("template_str_id" = String, Query, description = "Owning product template"),
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size, capped at the configured maximum"),
        ("include_choices" = Option<bool>, Query, description = "Embed option choices")
    ),
    responses(
        (status = 200, description = "Categories by display order"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 404, description = "Product template not found", body = ErrorBody)
    )
)]
pub async fn list_option_categories(
    State(state): State<AppState>,
    params: Params,
) -> Result<ApiResponse<Vec<CategoryView>>, CatalogError> {
    let template_str_id = params.required_key("template_str_id")?;
    let page = params.page(&state.config.pagination)?;
    let page = OptionCategoryService::new(state.db.clone())
        .list(&template_str_id, page, params.flag("include_choices"))
        .await?;
    Ok(ApiResponse::page(page))
}

#[utoipa::path(
    post,
    path = "/api/option-categories",
    tag = "option-categories",
    params(("template_str_id" = String, Query, description = "Owning product template")),
    request_body = OptionCategoryPayload,
    responses(
        (status = 201, description = "Option category created successfully"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 404, description = "Product template not found", body = ErrorBody),
        (status = 409, description = "Resource already exists", body = ErrorBody)
    )
)]
pub async fn create_option_category(
    State(state): State<AppState>,
    params: Params,
    Valid(input): Valid<OptionCategoryPayload>,
) -> Result<Response, CatalogError> {
    let template_str_id = params.required_key("template_str_id")?;
    let category = OptionCategoryService::new(state.db.clone())
        .create(&template_str_id, input)
        .await?;
    Ok(created(category, "Option category created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/option-categories/{category_str_id}",
    tag = "option-categories",
    params(
        ("category_str_id" = String, Path, description = "Option category key"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates keys shared between templates"),
        ("include_choices" = Option<bool>, Query, description = "Embed option choices")
    ),
    responses(
        (status = 200, description = "Option category found"),
        (status = 400, description = "Ambiguous key", body = ErrorBody),
        (status = 404, description = "Option category not found", body = ErrorBody)
    )
)]
pub async fn get_option_category(
    State(state): State<AppState>,
    Path(category_str_id): Path<String>,
    params: Params,
) -> Result<ApiResponse<CategoryView>, CatalogError> {
    let scope = template_scope(&params)?;
    let view = OptionCategoryService::new(state.db.clone())
        .get(&category_str_id, &scope, params.flag("include_choices"))
        .await?;
    Ok(ApiResponse::ok(view))
}

#[utoipa::path(
    put,
    path = "/api/option-categories/{category_str_id}",
    tag = "option-categories",
    params(
        ("category_str_id" = String, Path, description = "Option category key"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates keys shared between templates")
    ),
    request_body = OptionCategoryPayload,
    responses(
        (status = 200, description = "Option category updated successfully"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 404, description = "Option category not found", body = ErrorBody),
        (status = 409, description = "Resource already exists", body = ErrorBody)
    )
)]
pub async fn update_option_category(
    State(state): State<AppState>,
    Path(category_str_id): Path<String>,
    params: Params,
    Valid(input): Valid<OptionCategoryPayload>,
) -> Result<ApiResponse<option_categories::Model>, CatalogError> {
    let scope = template_scope(&params)?;
    let category = OptionCategoryService::new(state.db.clone())
        .update(&category_str_id, &scope, input)
        .await?;
    Ok(ApiResponse::with_message(category, "Option category updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/option-categories/{category_str_id}",
    tag = "option-categories",
    params(
        ("category_str_id" = String, Path, description = "Option category key"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates keys shared between templates")
    ),
    responses(
        (status = 200, description = "Option category, its choices and their rules deleted"),
        (status = 404, description = "Option category not found", body = ErrorBody)
    )
)]
pub async fn delete_option_category(
    State(state): State<AppState>,
    Path(category_str_id): Path<String>,
    params: Params,
) -> Result<ApiResponse<()>, CatalogError> {
    let scope = template_scope(&params)?;
    OptionCategoryService::new(state.db.clone())
        .delete(&category_str_id, &scope)
        .await?;
    Ok(ApiResponse::message("Option category deleted successfully"))
}

fn template_scope(params: &Params) -> Result<ParentScope, CatalogError> {
    Ok(ParentScope {
        template_str_id: params.optional_key("template_str_id")?,
        category_str_id: None,
    })
}
