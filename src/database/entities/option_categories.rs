use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "option_categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category_str_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_required: bool,
    pub display_order: i32,
    pub product_template_id: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_templates::Entity",
        from = "Column::ProductTemplateId",
        to = "super::product_templates::Column::Id"
    )]
    ProductTemplates,
    #[sea_orm(has_many = "super::option_choices::Entity")]
    OptionChoices,
}

impl Related<super::product_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductTemplates.def()
    }
}

impl Related<super::option_choices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OptionChoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
