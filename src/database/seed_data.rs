use anyhow::Result;
use sea_orm::*;
use tracing::info;

use crate::compatibility::RuleKind;
use crate::database::entities::product_templates;
use crate::services::{
    CompatibilityRuleService, NewOptionCategory, NewOptionChoice, NewProductTemplate, NewRule,
    OptionCategoryService, OptionChoiceService, ParentScope, ProductTemplateService,
};

pub const EXAMPLE_TEMPLATE: &str = "laptop_x";

pub async fn create_example_catalog(db: &DatabaseConnection) -> Result<()> {
    // First check if the example template already exists
    let existing = product_templates::Entity::find()
        .filter(product_templates::Column::TemplateStrId.eq(EXAMPLE_TEMPLATE))
        .one(db)
        .await?;

    if existing.is_some() {
        info!("Example catalog already exists, skipping seed data creation");
        return Ok(());
    }

    info!("Creating example catalog: {}", EXAMPLE_TEMPLATE);

    ProductTemplateService::new(db.clone())
        .create(NewProductTemplate {
            template_str_id: EXAMPLE_TEMPLATE.to_string(),
            name: "Laptop X".to_string(),
            base_price: 800.0,
            description: Some("Configurable 14 inch laptop".to_string()),
            is_active: true,
        })
        .await?;

    create_example_categories(db).await?;
    create_example_choices(db).await?;
    create_example_rules(db).await?;

    info!("Successfully created example catalog {}", EXAMPLE_TEMPLATE);
    Ok(())
}

async fn create_example_categories(db: &DatabaseConnection) -> Result<()> {
    info!("Creating example categories...");

    let categories = OptionCategoryService::new(db.clone());
    let data = [
        ("processor", "Processor", true, 1),
        ("memory", "Memory", true, 2),
        ("graphics", "Graphics", false, 3),
    ];

    for (category_str_id, name, is_required, display_order) in data {
        categories
            .create(
                EXAMPLE_TEMPLATE,
                NewOptionCategory {
                    category_str_id: category_str_id.to_string(),
                    name: name.to_string(),
                    description: None,
                    is_required,
                    display_order,
                },
            )
            .await?;
    }
    Ok(())
}

async fn create_example_choices(db: &DatabaseConnection) -> Result<()> {
    info!("Creating example choices...");

    let choices = OptionChoiceService::new(db.clone());
    let scope = ParentScope::template(EXAMPLE_TEMPLATE);
    let data = [
        ("processor", "intel_i5", "Intel Core i5", 0.0, true),
        ("processor", "intel_i7", "Intel Core i7", 150.0, false),
        ("memory", "ddr4_16gb", "16 GB DDR4", 0.0, true),
        ("memory", "ddr5_32gb", "32 GB DDR5", 120.0, false),
        ("graphics", "integrated", "Integrated graphics", 0.0, true),
        ("graphics", "rtx_4060", "NVIDIA RTX 4060", 299.99, false),
    ];

    for (display_order, (category_str_id, choice_str_id, name, price_delta, is_default)) in
        data.into_iter().enumerate()
    {
        choices
            .create(
                category_str_id,
                &scope,
                NewOptionChoice {
                    choice_str_id: choice_str_id.to_string(),
                    name: name.to_string(),
                    description: None,
                    price_delta,
                    is_default,
                    is_available: true,
                    display_order: display_order as i32,
                },
            )
            .await?;
    }
    Ok(())
}

async fn create_example_rules(db: &DatabaseConnection) -> Result<()> {
    info!("Creating example compatibility rules...");

    let choices = OptionChoiceService::new(db.clone());
    let rules = CompatibilityRuleService::new(db.clone());
    let scope = ParentScope::template(EXAMPLE_TEMPLATE);
    let data = [
        ("intel_i7", RuleKind::Requires, "ddr5_32gb", 10, "The i7 board only takes DDR5"),
        ("rtx_4060", RuleKind::Incompatible, "intel_i5", 5, "Power budget too small"),
        ("rtx_4060", RuleKind::Compatible, "intel_i7", 0, "Validated combination"),
    ];

    for (source, kind, target, priority, description) in data {
        let source = choices.resolve(source, &scope).await?;
        rules
            .create_for_choice(
                &source,
                NewRule {
                    kind,
                    target_choice_str_id: target.to_string(),
                    target_category_str_id: None,
                    priority,
                    description: Some(description.to_string()),
                },
            )
            .await?;
    }
    Ok(())
}
