use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "option_choices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub choice_str_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_delta: f64,
    pub is_default: bool,
    pub is_available: bool,
    pub display_order: i32,
    pub option_category_id: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::option_categories::Entity",
        from = "Column::OptionCategoryId",
        to = "super::option_categories::Column::Id"
    )]
    OptionCategories,
}

impl Related<super::option_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OptionCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
