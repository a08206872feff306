use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::database::entities::option_choices;
use crate::errors::CatalogError;
use crate::server::app::AppState;
use crate::server::middleware::validation::{CompatibilityRulePayload, OptionChoicePayload};
use crate::server::middleware::{Params, Valid};
use crate::server::response::{created, ApiResponse, ErrorBody};
use crate::services::views::{ChoiceRulesView, ChoiceSummary, ChoiceView};
use crate::services::{CompatibilityRuleService, OptionChoiceService, ParentScope};

#[utoipa::path(
    get,
    path = "/api/option-choices",
    tag = "option-choices",
    params(
        ("category_str_id" = String, Query, description = "Owning option category"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates the category key"),
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size, capped at the configured maximum"),
        ("include_rules" = Option<bool>, Query, description = "Embed compatibility rules")
    ),
    responses(
        (status = 200, description = "Choices by display order"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 404, description = "Option category not found", body = ErrorBody)
    )
)]
pub async fn list_option_choices(
    State(state): State<AppState>,
    params: Params,
) -> Result<ApiResponse<Vec<ChoiceView>>, CatalogError> {
    let category_str_id = params.required_key("category_str_id")?;
    let scope = template_scope(&params)?;
    let page = params.page(&state.config.pagination)?;
    let page = OptionChoiceService::new(state.db.clone())
        .list(&category_str_id, &scope, page, params.flag("include_rules"))
        .await?;
    Ok(ApiResponse::page(page))
}

#[utoipa::path(
    post,
    path = "/api/option-choices",
    tag = "option-choices",
    params(
        ("category_str_id" = String, Query, description = "Owning option category"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates the category key")
    ),
    request_body = OptionChoicePayload,
    responses(
        (status = 201, description = "Option choice created successfully"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 404, description = "Option category not found", body = ErrorBody),
        (status = 409, description = "Resource already exists", body = ErrorBody)
    )
)]
pub async fn create_option_choice(
    State(state): State<AppState>,
    params: Params,
    Valid(input): Valid<OptionChoicePayload>,
) -> Result<Response, CatalogError> {
    let category_str_id = params.required_key("category_str_id")?;
    let scope = template_scope(&params)?;
    let choice = OptionChoiceService::new(state.db.clone())
        .create(&category_str_id, &scope, input)
        .await?;
    Ok(created(choice, "Option choice created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/option-choices/{choice_str_id}",
    tag = "option-choices",
    params(
        ("choice_str_id" = String, Path, description = "Option choice key"),
        ("category_str_id" = Option<String>, Query, description = "Disambiguates keys shared between categories"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates keys shared between templates"),
        ("include_rules" = Option<bool>, Query, description = "Embed compatibility rules")
    ),
    responses(
        (status = 200, description = "Option choice found"),
        (status = 400, description = "Ambiguous key", body = ErrorBody),
        (status = 404, description = "Option choice not found", body = ErrorBody)
    )
)]
pub async fn get_option_choice(
    State(state): State<AppState>,
    Path(choice_str_id): Path<String>,
    params: Params,
) -> Result<ApiResponse<ChoiceView>, CatalogError> {
    let scope = params.scope()?;
    let view = OptionChoiceService::new(state.db.clone())
        .get(&choice_str_id, &scope, params.flag("include_rules"))
        .await?;
    Ok(ApiResponse::ok(view))
}

#[utoipa::path(
    put,
    path = "/api/option-choices/{choice_str_id}",
    tag = "option-choices",
    params(
        ("choice_str_id" = String, Path, description = "Option choice key"),
        ("category_str_id" = Option<String>, Query, description = "Disambiguates keys shared between categories"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates keys shared between templates")
    ),
    request_body = OptionChoicePayload,
    responses(
        (status = 200, description = "Option choice updated successfully"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 404, description = "Option choice not found", body = ErrorBody),
        (status = 409, description = "Resource already exists", body = ErrorBody)
    )
)]
pub async fn update_option_choice(
    State(state): State<AppState>,
    Path(choice_str_id): Path<String>,
    params: Params,
    Valid(input): Valid<OptionChoicePayload>,
) -> Result<ApiResponse<option_choices::Model>, CatalogError> {
    let scope = params.scope()?;
    let choice = OptionChoiceService::new(state.db.clone())
        .update(&choice_str_id, &scope, input)
        .await?;
    Ok(ApiResponse::with_message(choice, "Option choice updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/option-choices/{choice_str_id}",
    tag = "option-choices",
    params(
        ("choice_str_id" = String, Path, description = "Option choice key"),
        ("category_str_id" = Option<String>, Query, description = "Disambiguates keys shared between categories"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates keys shared between templates")
    ),
    responses(
        (status = 200, description = "Option choice and its rules deleted"),
        (status = 404, description = "Option choice not found", body = ErrorBody)
    )
)]
pub async fn delete_option_choice(
    State(state): State<AppState>,
    Path(choice_str_id): Path<String>,
    params: Params,
) -> Result<ApiResponse<()>, CatalogError> {
    let scope = params.scope()?;
    OptionChoiceService::new(state.db.clone())
        .delete(&choice_str_id, &scope)
        .await?;
    Ok(ApiResponse::message("Option choice deleted successfully"))
}

#[utoipa::path(
    get,
    path = "/api/option-choices/{choice_str_id}/compatibility-rules",
    tag = "compatibility-rules",
    params(
        ("choice_str_id" = String, Path, description = "Option choice key"),
        ("category_str_id" = Option<String>, Query, description = "Disambiguates keys shared between categories"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates keys shared between templates")
    ),
    responses(
        (status = 200, description = "Rules where the choice is source or target, by priority"),
        (status = 404, description = "Option choice not found", body = ErrorBody)
    )
)]
pub async fn list_choice_rules(
    State(state): State<AppState>,
    Path(choice_str_id): Path<String>,
    params: Params,
) -> Result<ApiResponse<ChoiceRulesView>, CatalogError> {
    let scope = params.scope()?;
    let choice = OptionChoiceService::new(state.db.clone())
        .resolve(&choice_str_id, &scope)
        .await?;
    let rules = CompatibilityRuleService::new(state.db.clone())
        .lookup(&choice)
        .await?;

    Ok(ApiResponse::ok(ChoiceRulesView {
        choice: ChoiceSummary::from(&choice),
        rules,
    }))
}

#[utoipa::path(
    post,
    path = "/api/option-choices/{choice_str_id}/compatibility-rules",
    tag = "compatibility-rules",
    params(
        ("choice_str_id" = String, Path, description = "Source option choice key"),
        ("category_str_id" = Option<String>, Query, description = "Disambiguates keys shared between categories"),
        ("template_str_id" = Option<String>, Query, description = "Disambiguates keys shared between templates")
    ),
    request_body = CompatibilityRulePayload,
    responses(
        (status = 201, description = "Compatibility rule created successfully"),
        (status = 400, description = "Validation Error or self-referencing rule", body = ErrorBody),
        (status = 404, description = "Source or target choice not found", body = ErrorBody),
        (status = 409, description = "Rule of this type already exists for the pair", body = ErrorBody)
    )
)]
pub async fn create_choice_rule(
    State(state): State<AppState>,
    Path(choice_str_id): Path<String>,
    params: Params,
    Valid(input): Valid<CompatibilityRulePayload>,
) -> Result<Response, CatalogError> {
    let scope = params.scope()?;
    let source = OptionChoiceService::new(state.db.clone())
        .resolve(&choice_str_id, &scope)
        .await?;
    let rule = CompatibilityRuleService::new(state.db.clone())
        .create_for_choice(&source, input)
        .await?;
    Ok(created(rule, "Compatibility rule created successfully"))
}

fn template_scope(params: &Params) -> Result<ParentScope, CatalogError> {
    Ok(ParentScope {
        template_str_id: params.optional_key("template_str_id")?,
        category_str_id: None,
    })
}
