use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub template_str_id: String,
    pub name: String,
    pub base_price: f64,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::option_categories::Entity")]
    OptionCategories,
}

impl Related<super::option_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OptionCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
