use axum::response::Json;
use serde_json::{json, Value};

use crate::compatibility::RuleKind;

/// Endpoint catalogue with example payloads.
#[utoipa::path(
    get,
    path = "/api",
    tag = "index",
    responses((status = 200, description = "Endpoint catalogue"))
)]
pub async fn api_index() -> Json<Value> {
    let rule_types: Vec<String> = RuleKind::ALL.iter().map(|kind| kind.to_string()).collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "Product Configurator API",
            "version": env!("CARGO_PKG_VERSION"),
            "openapi": "/api/openapi.json",
            "endpoints": {
                "product_templates": {
                    "list": "GET /api/product-templates?page=1&limit=10&include_categories=true",
                    "create": "POST /api/product-templates",
                    "get": "GET /api/product-templates/{template_str_id}?include_categories=true",
                    "update": "PUT /api/product-templates/{template_str_id}",
                    "delete": "DELETE /api/product-templates/{template_str_id}",
                    "check_configuration": "POST /api/product-templates/{template_str_id}/configurations/check",
                    "rule_conflicts": "GET /api/product-templates/{template_str_id}/compatibility-rules/conflicts"
                },
                "option_categories": {
                    "list": "GET /api/option-categories?template_str_id={template_str_id}&page=1&limit=10&include_choices=true",
                    "create": "POST /api/option-categories?template_str_id={template_str_id}",
                    "get": "GET /api/option-categories/{category_str_id}?include_choices=true",
                    "update": "PUT /api/option-categories/{category_str_id}",
                    "delete": "DELETE /api/option-categories/{category_str_id}"
                },
                "option_choices": {
                    "list": "GET /api/option-choices?category_str_id={category_str_id}&page=1&limit=10&include_rules=true",
                    "create": "POST /api/option-choices?category_str_id={category_str_id}",
                    "get": "GET /api/option-choices/{choice_str_id}?include_rules=true",
                    "update": "PUT /api/option-choices/{choice_str_id}",
                    "delete": "DELETE /api/option-choices/{choice_str_id}",
                    "list_rules": "GET /api/option-choices/{choice_str_id}/compatibility-rules",
                    "create_rule": "POST /api/option-choices/{choice_str_id}/compatibility-rules"
                },
                "compatibility_rules": {
                    "get": "GET /api/compatibility-rules/{rule_id}",
                    "update": "PUT /api/compatibility-rules/{rule_id}",
                    "delete": "DELETE /api/compatibility-rules/{rule_id}"
                }
            },
            "rule_types": rule_types,
            "examples": {
                "product_template": {
                    "template_str_id": "laptop_x",
                    "name": "Laptop X",
                    "base_price": 800.00,
                    "description": "Configurable 14 inch laptop"
                },
                "option_category": {
                    "category_str_id": "processor",
                    "name": "Processor",
                    "is_required": true,
                    "display_order": 1
                },
                "option_choice": {
                    "choice_str_id": "intel_i7",
                    "name": "Intel Core i7",
                    "price_delta": 150.00
                },
                "compatibility_rule": {
                    "rule_type": "REQUIRES",
                    "target_choice_str_id": "ddr5_ram",
                    "priority": 10,
                    "description": "The i7 board only takes DDR5"
                },
                "configuration_check": {
                    "choices": ["intel_i7", "memory:ddr5_ram"],
                    "policy": "permissive"
                }
            }
        }
    }))
}
