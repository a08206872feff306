use axum::response::Json;
use utoipa::OpenApi;

use super::handlers::{
    compatibility_rules, health, index, option_categories, option_choices, product_templates,
};
use super::middleware::validation::{
    CompatibilityRulePayload, ConfigurationCheckPayload, OptionCategoryPayload, OptionChoicePayload,
    ProductTemplatePayload, RuleUpdatePayload,
};
use super::response::ErrorBody;
use crate::compatibility::RuleKind;
use crate::services::pagination::Pagination;
use crate::services::validation::FieldError;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Configurator API",
        description = "Product templates, option categories, option choices and compatibility rules"
    ),
    paths(
        health::health_check,
        index::api_index,
        product_templates::list_product_templates,
        product_templates::create_product_template,
        product_templates::get_product_template,
        product_templates::update_product_template,
        product_templates::delete_product_template,
        option_categories::list_option_categories,
        option_categories::create_option_category,
        option_categories::get_option_category,
        option_categories::update_option_category,
        option_categories::delete_option_category,
        option_choices::list_option_choices,
        option_choices::create_option_choice,
        option_choices::get_option_choice,
        option_choices::update_option_choice,
        option_choices::delete_option_choice,
        option_choices::list_choice_rules,
        option_choices::create_choice_rule,
        compatibility_rules::get_rule,
        compatibility_rules::update_rule,
        compatibility_rules::delete_rule,
        compatibility_rules::check_configuration,
        compatibility_rules::list_rule_conflicts,
        openapi_json
    ),
    components(schemas(
        ProductTemplatePayload,
        OptionCategoryPayload,
        OptionChoicePayload,
        CompatibilityRulePayload,
        RuleUpdatePayload,
        ConfigurationCheckPayload,
        RuleKind,
        Pagination,
        ErrorBody,
        FieldError
    )),
    tags(
        (name = "product-templates", description = "Configurable products"),
        (name = "option-categories", description = "Configurable aspects of a product"),
        (name = "option-choices", description = "Selectable values within a category"),
        (name = "compatibility-rules", description = "Directed rules between choices"),
        (name = "configurations", description = "Evaluating selections against the rules")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/api/openapi.json",
    tag = "index",
    responses((status = 200, description = "This document"))
)]
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
