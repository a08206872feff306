//! API integration tests
//!
//! Tests for the catalog REST endpoints and the configuration check

use anyhow::Result;
use axum::http::StatusCode;
use axum_test::TestServer;
use configurator::config::{AppConfig, Environment};
use configurator::database::connection::setup_database;
use configurator::server::app::create_app;
use sea_orm::Database;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

/// Test server backed by a fresh SQLite file; keep the file alive for the test.
async fn setup_test_server() -> Result<(TestServer, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    let config = AppConfig {
        environment: Environment::Test,
        ..Default::default()
    };
    let app = create_app(db, config).await?;
    let server = TestServer::new(app)?;

    Ok((server, temp_file))
}

async fn create_template(server: &TestServer, template_str_id: &str) -> Value {
    let response = server
        .post("/api/product-templates")
        .json(&json!({
            "template_str_id": template_str_id,
            "name": format!("Template {}", template_str_id),
            "base_price": 999.99
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

async fn create_category(server: &TestServer, template_str_id: &str, category_str_id: &str) -> Value {
    let response = server
        .post("/api/option-categories")
        .add_query_param("template_str_id", template_str_id)
        .json(&json!({
            "category_str_id": category_str_id,
            "name": category_str_id.to_uppercase()
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

async fn create_choice(
    server: &TestServer,
    template_str_id: &str,
    category_str_id: &str,
    choice_str_id: &str,
) -> Value {
    let response = server
        .post("/api/option-choices")
        .add_query_param("category_str_id", category_str_id)
        .add_query_param("template_str_id", template_str_id)
        .json(&json!({
            "choice_str_id": choice_str_id,
            "name": choice_str_id,
            "price_delta": 10.0
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

async fn create_rule(server: &TestServer, source: &str, rule_type: &str, target: &str, priority: i64) -> Value {
    let response = server
        .post(&format!("/api/option-choices/{}/compatibility-rules", source))
        .json(&json!({
            "rule_type": rule_type,
            "target_choice_str_id": target,
            "priority": priority
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

/// laptop_x with processor {intel_i5, intel_i7}, memory {ddr4_16gb, ddr5_32gb}
/// and graphics {integrated, rtx_4060}.
async fn create_laptop_catalog(server: &TestServer) {
    create_template(server, "laptop_x").await;
    for (category, choices) in [
        ("processor", ["intel_i5", "intel_i7"]),
        ("memory", ["ddr4_16gb", "ddr5_32gb"]),
        ("graphics", ["integrated", "rtx_4060"]),
    ] {
        create_category(server, "laptop_x", category).await;
        for choice in choices {
            create_choice(server, "laptop_x", category, choice).await;
        }
    }
}

async fn check(server: &TestServer, choices: &[&str]) -> Value {
    let response = server
        .post("/api/product-templates/laptop_x/configurations/check")
        .json(&json!({ "choices": choices }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()["data"].clone()
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["service"], "product-configurator");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_api_index_and_openapi() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;

    let response = server.get("/api").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.get("/api/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let doc: Value = response.json();
    assert!(doc["paths"]["/api/product-templates"].is_object());
    assert!(doc["paths"]["/api/option-choices/{choice_str_id}/compatibility-rules"].is_object());

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;

    let response = server.get("/api/does-not-exist").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn test_product_templates_crud_api() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;

    let response = server
        .post("/api/product-templates")
        .json(&json!({
            "template_str_id": "laptop_x",
            "name": "Laptop X",
            "base_price": 999.99,
            "description": "Entry laptop"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Product template created successfully");
    assert_eq!(body["data"]["template_str_id"], "laptop_x");
    assert_eq!(body["data"]["is_active"], true);

    let response = server.get("/api/product-templates/laptop_x").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Laptop X");
    assert!(body["data"].get("option_categories").is_none());

    let response = server
        .put("/api/product-templates/laptop_x")
        .json(&json!({
            "template_str_id": "laptop_x",
            "name": "Laptop X Pro",
            "base_price": 1299.0
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Laptop X Pro");
    assert_eq!(body["data"]["base_price"], 1299.0);

    let response = server.delete("/api/product-templates/laptop_x").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "Product template deleted successfully");

    let response = server.get("/api/product-templates/laptop_x").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "Product template not found");

    Ok(())
}

#[tokio::test]
async fn test_product_template_validation_errors() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;

    let response = server
        .post("/api/product-templates")
        .json(&json!({
            "template_str_id": "Laptop X",
            "name": "",
            "base_price": -5
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .expect("details")
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"template_str_id"));
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"base_price"));
    assert!(body.get("stack").is_none());

    let response = server
        .post("/api/product-templates")
        .content_type("application/json")
        .text("not json")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_template_conflict() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_template(&server, "laptop_x").await;

    let response = server
        .post("/api/product-templates")
        .json(&json!({
            "template_str_id": "laptop_x",
            "name": "Again",
            "base_price": 1.0
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "CONFLICT");

    Ok(())
}

#[tokio::test]
async fn test_product_template_pagination() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    for i in 1..=3 {
        create_template(&server, &format!("template_{}", i)).await;
    }

    let response = server
        .get("/api/product-templates")
        .add_query_param("page", 1)
        .add_query_param("limit", 2)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"][0]["template_str_id"], "template_3");
    assert_eq!(body["pagination"]["current_page"], 1);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["items_per_page"], 2);

    let response = server
        .get("/api/product-templates")
        .add_query_param("page", 2)
        .add_query_param("limit", 2)
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["template_str_id"], "template_1");

    let response = server
        .get("/api/product-templates")
        .add_query_param("page", 0)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_categories_and_choices_api() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;

    let response = server
        .get("/api/option-categories")
        .add_query_param("template_str_id", "laptop_x")
        .add_query_param("include_choices", "true")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let categories = body["data"].as_array().expect("categories");
    assert_eq!(categories.len(), 3);
    let processor = categories
        .iter()
        .find(|c| c["category_str_id"] == "processor")
        .expect("processor");
    assert_eq!(processor["option_choices"].as_array().map(Vec::len), Some(2));

    let response = server.get("/api/option-choices/intel_i7").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["choice_str_id"], "intel_i7");
    assert_eq!(body["data"]["price_delta"], 10.0);
    assert_eq!(body["data"]["option_category"]["category_str_id"], "processor");

    let response = server
        .put("/api/option-choices/intel_i7")
        .json(&json!({
            "choice_str_id": "intel_i7",
            "name": "Intel Core i7",
            "price_delta": 150.0
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["price_delta"], 150.0);

    // Category key required for listing choices
    let response = server.get("/api/option-choices").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/option-choices")
        .add_query_param("category_str_id", "missing")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .post("/api/option-categories")
        .add_query_param("template_str_id", "laptop_x")
        .json(&json!({ "category_str_id": "processor", "name": "Dup" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn test_shared_keys_need_parent_scope() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_template(&server, "laptop_x").await;
    create_template(&server, "laptop_y").await;
    create_category(&server, "laptop_x", "processor").await;
    create_category(&server, "laptop_y", "processor").await;

    let response = server.get("/api/option-categories/processor").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["details"][0]["field"], "template_str_id");

    let response = server
        .get("/api/option-categories/processor")
        .add_query_param("template_str_id", "laptop_y")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["product_template"]["template_str_id"], "laptop_y");

    Ok(())
}

#[tokio::test]
async fn test_rule_creation_and_lookup_order() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;

    let a = create_rule(&server, "intel_i7", "REQUIRES", "ddr5_32gb", 5).await;
    let b = create_rule(&server, "intel_i7", "COMPATIBLE", "rtx_4060", 5).await;
    let c = create_rule(&server, "intel_i7", "INCOMPATIBLE", "integrated", 10).await;
    assert_eq!(a["rule_type"], "REQUIRES");
    assert_eq!(a["is_active"], true);
    assert_eq!(a["source_choice"]["choice_str_id"], "intel_i7");
    assert_eq!(a["target_choice"]["choice_str_id"], "ddr5_32gb");

    let response = server.get("/api/option-choices/intel_i7/compatibility-rules").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["choice"]["choice_str_id"], "intel_i7");
    let ids: Vec<&Value> = body["data"]["source_rules"]
        .as_array()
        .expect("source rules")
        .iter()
        .map(|r| &r["id"])
        .collect();
    assert_eq!(ids, vec![&c["id"], &a["id"], &b["id"]]);
    assert_eq!(body["data"]["target_rules"].as_array().map(Vec::len), Some(0));

    let response = server.get("/api/option-choices/ddr5_32gb/compatibility-rules").await;
    let body: Value = response.json();
    assert_eq!(body["data"]["source_rules"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["data"]["target_rules"][0]["id"], a["id"]);

    let response = server
        .get("/api/option-choices/intel_i7")
        .add_query_param("include_rules", "true")
        .await;
    let body: Value = response.json();
    assert_eq!(
        body["data"]["compatibility_rules"]["source_rules"].as_array().map(Vec::len),
        Some(3)
    );

    Ok(())
}

#[tokio::test]
async fn test_invalid_and_duplicate_rules() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;

    let response = server
        .post("/api/option-choices/intel_i7/compatibility-rules")
        .json(&json!({ "rule_type": "REQUIRES", "target_choice_str_id": "intel_i7" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INVALID_RULE");

    create_rule(&server, "intel_i7", "REQUIRES", "ddr5_32gb", 1).await;
    let response = server
        .post("/api/option-choices/intel_i7/compatibility-rules")
        .json(&json!({ "rule_type": "REQUIRES", "target_choice_str_id": "ddr5_32gb", "priority": 3 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "DUPLICATE_RULE");

    // Same pair, different kind is a separate rule
    create_rule(&server, "intel_i7", "COMPATIBLE", "ddr5_32gb", 1).await;

    let response = server
        .post("/api/option-choices/intel_i7/compatibility-rules")
        .json(&json!({ "rule_type": "EXCLUDES", "target_choice_str_id": "ddr4_16gb" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["details"][0]["field"], "rule_type");

    let response = server
        .post("/api/option-choices/intel_i7/compatibility-rules")
        .json(&json!({ "rule_type": "REQUIRES", "target_choice_str_id": "nope" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_rule_update_and_delete() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;
    let rule = create_rule(&server, "rtx_4060", "INCOMPATIBLE", "intel_i5", 5).await;
    let rule_path = format!("/api/compatibility-rules/{}", rule["id"]);

    let report = check(&server, &["rtx_4060", "intel_i5"]).await;
    assert_eq!(report["accepted"], false);

    let response = server.put(&rule_path).json(&json!({ "is_active": false })).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["is_active"], false);

    let report = check(&server, &["rtx_4060", "intel_i5"]).await;
    assert_eq!(report["accepted"], true);

    let response = server.put(&rule_path).json(&json!({})).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server.delete(&rule_path).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.get(&rule_path).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.get("/api/compatibility-rules/abc").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_configuration_check() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;
    create_rule(&server, "intel_i7", "REQUIRES", "ddr5_32gb", 10).await;
    create_rule(&server, "rtx_4060", "INCOMPATIBLE", "intel_i5", 5).await;

    let report = check(&server, &["intel_i7", "ddr5_32gb", "rtx_4060"]).await;
    assert_eq!(report["accepted"], true);
    assert_eq!(report["policy"], "permissive");
    assert_eq!(report["violations"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["choices"].as_array().map(Vec::len), Some(3));

    let report = check(&server, &["intel_i7", "ddr4_16gb"]).await;
    assert_eq!(report["accepted"], false);
    assert_eq!(report["violations"][0]["type"], "missing_requirement");

    let report = check(&server, &["processor:intel_i5", "graphics:rtx_4060"]).await;
    assert_eq!(report["accepted"], false);
    assert_eq!(report["violations"][0]["type"], "incompatible");

    // Allow-list: every selected pair needs a covering rule
    let response = server
        .post("/api/product-templates/laptop_x/configurations/check")
        .json(&json!({ "choices": ["intel_i7", "ddr5_32gb", "integrated"], "policy": "allow_list" }))
        .await;
    let report = response.json::<Value>()["data"].clone();
    assert_eq!(report["accepted"], false);
    assert_eq!(report["policy"], "allow_list");
    assert!(report["violations"]
        .as_array()
        .expect("violations")
        .iter()
        .all(|v| v["type"] == "not_allowed"));

    let response = server
        .post("/api/product-templates/laptop_x/configurations/check")
        .json(&json!({ "choices": ["intel_i9"] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .post("/api/product-templates/laptop_x/configurations/check")
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_equal_priority_conflicts() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;
    let requires = create_rule(&server, "intel_i7", "REQUIRES", "rtx_4060", 7).await;
    let incompatible = create_rule(&server, "rtx_4060", "INCOMPATIBLE", "intel_i7", 7).await;

    let response = server
        .get("/api/product-templates/laptop_x/compatibility-rules/conflicts")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let conflicts = body["data"]["conflicts"].as_array().expect("conflicts");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["priority"], 7);
    assert_eq!(conflicts[0]["requires_rule_id"], requires["id"]);
    assert_eq!(conflicts[0]["incompatible_rule_id"], incompatible["id"]);

    let response = server
        .post("/api/product-templates/laptop_x/configurations/check")
        .json(&json!({ "choices": ["intel_i7", "rtx_4060"] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "CONFLICTING_RULES");

    // Raising one side resolves the tie
    server
        .put(&format!("/api/compatibility-rules/{}", requires["id"]))
        .json(&json!({ "priority": 8 }))
        .await;
    let report = check(&server, &["intel_i7", "rtx_4060"]).await;
    assert_eq!(report["accepted"], true);

    Ok(())
}

#[tokio::test]
async fn test_cascade_delete_removes_rules() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;
    let rule = create_rule(&server, "intel_i7", "REQUIRES", "ddr5_32gb", 1).await;

    let response = server.delete("/api/option-choices/ddr5_32gb").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!("/api/compatibility-rules/{}", rule["id"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.get("/api/option-choices/intel_i7/compatibility-rules").await;
    let body: Value = response.json();
    assert_eq!(body["data"]["source_rules"].as_array().map(Vec::len), Some(0));

    let response = server.delete("/api/product-templates/laptop_x").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.get("/api/option-choices/intel_i7").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_category_and_choice_pagination() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;

    let response = server
        .get("/api/option-categories")
        .add_query_param("template_str_id", "laptop_x")
        .add_query_param("page", 2)
        .add_query_param("limit", 1)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["category_str_id"], "memory");
    assert_eq!(body["pagination"]["current_page"], 2);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["items_per_page"], 1);

    let response = server
        .get("/api/option-choices")
        .add_query_param("category_str_id", "processor")
        .add_query_param("page", 2)
        .add_query_param("limit", 1)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["choice_str_id"], "intel_i7");
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["total_items"], 2);

    let response = server
        .get("/api/option-choices")
        .add_query_param("category_str_id", "processor")
        .add_query_param("limit", "abc")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["details"][0]["field"], "limit");

    Ok(())
}

#[tokio::test]
async fn test_choice_list_embeds_rules_per_choice() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;
    let within = create_rule(&server, "intel_i5", "INCOMPATIBLE", "intel_i7", 2).await;
    let outside = create_rule(&server, "intel_i7", "REQUIRES", "ddr5_32gb", 4).await;

    let response = server
        .get("/api/option-choices")
        .add_query_param("category_str_id", "processor")
        .add_query_param("include_rules", "true")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let choices = body["data"].as_array().expect("choices");
    assert_eq!(choices.len(), 2);

    let i5 = &choices[0];
    assert_eq!(i5["choice_str_id"], "intel_i5");
    assert_eq!(i5["compatibility_rules"]["source_rules"][0]["id"], within["id"]);
    assert_eq!(i5["compatibility_rules"]["target_rules"].as_array().map(Vec::len), Some(0));

    let i7 = &choices[1];
    assert_eq!(i7["compatibility_rules"]["source_rules"][0]["id"], outside["id"]);
    assert_eq!(
        i7["compatibility_rules"]["source_rules"][0]["target_choice"]["choice_str_id"],
        "ddr5_32gb"
    );
    assert_eq!(i7["compatibility_rules"]["target_rules"][0]["id"], within["id"]);
    assert_eq!(
        i7["compatibility_rules"]["target_rules"][0]["source_choice"]["choice_str_id"],
        "intel_i5"
    );

    Ok(())
}

#[tokio::test]
async fn test_rule_round_trips_through_both_endpoints() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;

    let response = server
        .post("/api/option-choices/rtx_4060/compatibility-rules")
        .json(&json!({
            "rule_type": "INCOMPATIBLE",
            "target_choice_str_id": "ddr4_16gb",
            "priority": 42,
            "description": "Needs the faster memory bus"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: Value = response.json::<Value>()["data"].clone();

    let response = server.get("/api/option-choices/rtx_4060/compatibility-rules").await;
    let body: Value = response.json();
    let source_rules = body["data"]["source_rules"].as_array().expect("source rules");
    assert_eq!(source_rules.len(), 1);

    let response = server.get("/api/option-choices/ddr4_16gb/compatibility-rules").await;
    let body: Value = response.json();
    let target_rules = body["data"]["target_rules"].as_array().expect("target rules");
    assert_eq!(target_rules.len(), 1);

    for rule in [&source_rules[0], &target_rules[0]] {
        assert_eq!(rule["id"], created["id"]);
        assert_eq!(rule["rule_type"], "INCOMPATIBLE");
        assert_eq!(rule["priority"], 42);
        assert_eq!(rule["description"], "Needs the faster memory bus");
        assert_eq!(rule["is_active"], true);
        assert_eq!(rule["source_choice"]["choice_str_id"], "rtx_4060");
        assert_eq!(rule["target_choice"]["choice_str_id"], "ddr4_16gb");
    }

    Ok(())
}

#[tokio::test]
async fn test_rule_description_can_be_cleared() -> Result<()> {
    let (server, _db_file) = setup_test_server().await?;
    create_laptop_catalog(&server).await;
    let rule = create_rule(&server, "intel_i7", "REQUIRES", "ddr5_32gb", 1).await;
    let rule_path = format!("/api/compatibility-rules/{}", rule["id"]);

    let response = server
        .put(&rule_path)
        .json(&json!({ "description": "Board only takes DDR5" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["description"], "Board only takes DDR5");

    let response = server.put(&rule_path).json(&json!({ "priority": 3 })).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["priority"], 3);
    assert_eq!(body["data"]["description"], "Board only takes DDR5");

    let response = server.put(&rule_path).json(&json!({ "description": null })).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.json::<Value>()["data"]["description"].is_null());

    Ok(())
}
