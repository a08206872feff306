use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Foreign keys are declared without ON DELETE CASCADE; services delete
        // dependents explicitly inside one transaction.
        manager
            .create_table(
                Table::create()
                    .table(ProductTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductTemplates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductTemplates::TemplateStrId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductTemplates::Name).string_len(255).not_null())
                    .col(ColumnDef::new(ProductTemplates::BasePrice).double().not_null())
                    .col(ColumnDef::new(ProductTemplates::Description).text())
                    .col(
                        ColumnDef::new(ProductTemplates::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(ProductTemplates::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(ProductTemplates::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_product_templates_template_str_id")
                    .table(ProductTemplates::Table)
                    .col(ProductTemplates::TemplateStrId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OptionCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OptionCategories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OptionCategories::CategoryStrId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OptionCategories::Name).string_len(255).not_null())
                    .col(ColumnDef::new(OptionCategories::Description).text())
                    .col(
                        ColumnDef::new(OptionCategories::IsRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OptionCategories::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OptionCategories::ProductTemplateId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OptionCategories::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(OptionCategories::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_option_categories_product_template_id")
                            .from(OptionCategories::Table, OptionCategories::ProductTemplateId)
                            .to(ProductTemplates::Table, ProductTemplates::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_option_categories_template_str_id")
                    .table(OptionCategories::Table)
                    .col(OptionCategories::ProductTemplateId)
                    .col(OptionCategories::CategoryStrId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_option_categories_product_template_id")
                    .table(OptionCategories::Table)
                    .col(OptionCategories::ProductTemplateId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OptionChoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OptionChoices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OptionChoices::ChoiceStrId).string_len(100).not_null())
                    .col(ColumnDef::new(OptionChoices::Name).string_len(255).not_null())
                    .col(ColumnDef::new(OptionChoices::Description).text())
                    .col(
                        ColumnDef::new(OptionChoices::PriceDelta)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(OptionChoices::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OptionChoices::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(OptionChoices::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(OptionChoices::OptionCategoryId).integer().not_null())
                    .col(ColumnDef::new(OptionChoices::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(OptionChoices::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_option_choices_option_category_id")
                            .from(OptionChoices::Table, OptionChoices::OptionCategoryId)
                            .to(OptionCategories::Table, OptionCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_option_choices_category_str_id")
                    .table(OptionChoices::Table)
                    .col(OptionChoices::OptionCategoryId)
                    .col(OptionChoices::ChoiceStrId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_option_choices_option_category_id")
                    .table(OptionChoices::Table)
                    .col(OptionChoices::OptionCategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompatibilityRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompatibilityRules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CompatibilityRules::RuleType).string_len(16).not_null())
                    .col(ColumnDef::new(CompatibilityRules::Description).text())
                    .col(
                        ColumnDef::new(CompatibilityRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CompatibilityRules::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CompatibilityRules::SourceChoiceId).integer().not_null())
                    .col(ColumnDef::new(CompatibilityRules::TargetChoiceId).integer().not_null())
                    .col(ColumnDef::new(CompatibilityRules::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(CompatibilityRules::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_compatibility_rules_source_choice_id")
                            .from(CompatibilityRules::Table, CompatibilityRules::SourceChoiceId)
                            .to(OptionChoices::Table, OptionChoices::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_compatibility_rules_target_choice_id")
                            .from(CompatibilityRules::Table, CompatibilityRules::TargetChoiceId)
                            .to(OptionChoices::Table, OptionChoices::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_compatibility_rules_triple")
                    .table(CompatibilityRules::Table)
                    .col(CompatibilityRules::SourceChoiceId)
                    .col(CompatibilityRules::TargetChoiceId)
                    .col(CompatibilityRules::RuleType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_compatibility_rules_source_choice_id", CompatibilityRules::SourceChoiceId),
            ("idx_compatibility_rules_target_choice_id", CompatibilityRules::TargetChoiceId),
            ("idx_compatibility_rules_rule_type", CompatibilityRules::RuleType),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(CompatibilityRules::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompatibilityRules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OptionChoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OptionCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductTemplates::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProductTemplates {
    Table,
    Id,
    TemplateStrId,
    Name,
    BasePrice,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum OptionCategories {
    Table,
    Id,
    CategoryStrId,
    Name,
    Description,
    IsRequired,
    DisplayOrder,
    ProductTemplateId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum OptionChoices {
    Table,
    Id,
    ChoiceStrId,
    Name,
    Description,
    PriceDelta,
    IsDefault,
    IsAvailable,
    DisplayOrder,
    OptionCategoryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CompatibilityRules {
    Table,
    Id,
    RuleType,
    Description,
    IsActive,
    Priority,
    SourceChoiceId,
    TargetChoiceId,
    CreatedAt,
    UpdatedAt,
}
