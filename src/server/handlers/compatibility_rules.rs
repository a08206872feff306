use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::Value;

use crate::database::entities::compatibility_rules;
use crate::errors::CatalogError;
use crate::server::app::AppState;
use crate::server::middleware::validation::{ConfigurationCheckPayload, RuleUpdatePayload};
use crate::server::middleware::Valid;
use crate::server::response::{ApiResponse, ErrorBody};
use crate::services::validation::ValidationError;
use crate::services::views::{ConfigurationReport, ConflictReport, TemplateSummary};
use crate::services::{CompatibilityRuleService, ProductTemplateService};

fn parse_rule_id(raw: &str) -> Result<i32, CatalogError> {
    raw.parse::<i32>().map_err(|_| {
        ValidationError::field("rule_id", "rule_id must be an integer", Value::from(raw)).into()
    })
}

#[utoipa::path(
    get,
    path = "/api/compatibility-rules/{rule_id}",
    tag = "compatibility-rules",
    params(("rule_id" = i32, Path, description = "Compatibility rule id")),
    responses(
        (status = 200, description = "Compatibility rule found"),
        (status = 404, description = "Compatibility rule not found", body = ErrorBody)
    )
)]
pub async fn get_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<ApiResponse<compatibility_rules::Model>, CatalogError> {
    let rule = CompatibilityRuleService::new(state.db.clone())
        .find(parse_rule_id(&rule_id)?)
        .await?;
    Ok(ApiResponse::ok(rule))
}

#[utoipa::path(
    put,
    path = "/api/compatibility-rules/{rule_id}",
    tag = "compatibility-rules",
    params(("rule_id" = i32, Path, description = "Compatibility rule id")),
    request_body = RuleUpdatePayload,
    responses(
        (status = 200, description = "Compatibility rule updated successfully"),
        (status = 400, description = "Validation Error", body = ErrorBody),
        (status = 404, description = "Compatibility rule not found", body = ErrorBody)
    )
)]
pub async fn update_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
    Valid(update): Valid<RuleUpdatePayload>,
) -> Result<ApiResponse<compatibility_rules::Model>, CatalogError> {
    let rule = CompatibilityRuleService::new(state.db.clone())
        .update_rule(parse_rule_id(&rule_id)?, update)
        .await?;
    Ok(ApiResponse::with_message(rule, "Compatibility rule updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/compatibility-rules/{rule_id}",
    tag = "compatibility-rules",
    params(("rule_id" = i32, Path, description = "Compatibility rule id")),
    responses(
        (status = 200, description = "Compatibility rule deleted successfully"),
        (status = 404, description = "Compatibility rule not found", body = ErrorBody)
    )
)]
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<ApiResponse<()>, CatalogError> {
    CompatibilityRuleService::new(state.db.clone())
        .delete_rule(parse_rule_id(&rule_id)?)
        .await?;
    Ok(ApiResponse::message("Compatibility rule deleted successfully"))
}

#[utoipa::path(
    post,
    path = "/api/product-templates/{template_str_id}/configurations/check",
    tag = "configurations",
    params(("template_str_id" = String, Path, description = "Product template key")),
    request_body = ConfigurationCheckPayload,
    responses(
        (status = 200, description = "Evaluation result, accepted or not"),
        (status = 400, description = "Validation Error or ambiguous choice key", body = ErrorBody),
        (status = 404, description = "Template or choice not found", body = ErrorBody),
        (status = 409, description = "Equal-priority REQUIRES and INCOMPATIBLE rules govern a pair", body = ErrorBody)
    )
)]
pub async fn check_configuration(
    State(state): State<AppState>,
    Path(template_str_id): Path<String>,
    Valid(check): Valid<ConfigurationCheckPayload>,
) -> Result<ApiResponse<ConfigurationReport>, CatalogError> {
    let template = ProductTemplateService::new(state.db.clone())
        .find(&template_str_id)
        .await?;
    let policy = check.policy.unwrap_or(state.config.compatibility.policy);

    let report = CompatibilityRuleService::new(state.db.clone())
        .check_configuration(&template, &check.keys, policy)
        .await?;
    Ok(ApiResponse::ok(report))
}

#[derive(Debug, Serialize)]
pub struct ConflictsView {
    pub product_template: TemplateSummary,
    pub conflicts: Vec<ConflictReport>,
}

#[utoipa::path(
    get,
    path = "/api/product-templates/{template_str_id}/compatibility-rules/conflicts",
    tag = "configurations",
    params(("template_str_id" = String, Path, description = "Product template key")),
    responses(
        (status = 200, description = "Pairs governed by equal-priority REQUIRES and INCOMPATIBLE rules"),
        (status = 404, description = "Product template not found", body = ErrorBody)
    )
)]
pub async fn list_rule_conflicts(
    State(state): State<AppState>,
    Path(template_str_id): Path<String>,
) -> Result<ApiResponse<ConflictsView>, CatalogError> {
    let template = ProductTemplateService::new(state.db.clone())
        .find(&template_str_id)
        .await?;
    let conflicts = CompatibilityRuleService::new(state.db.clone())
        .find_conflicts(&template)
        .await?;

    Ok(ApiResponse::ok(ConflictsView {
        product_template: TemplateSummary::from(&template),
        conflicts,
    }))
}
