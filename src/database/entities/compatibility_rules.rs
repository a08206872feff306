use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compatibility::{Rule, RuleKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "compatibility_rules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub rule_type: String, // REQUIRES | INCOMPATIBLE | COMPATIBLE
    pub description: Option<String>,
    pub is_active: bool,
    pub priority: i32,
    pub source_choice_id: i32,
    pub target_choice_id: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::option_choices::Entity",
        from = "Column::SourceChoiceId",
        to = "super::option_choices::Column::Id"
    )]
    SourceChoice,
    #[sea_orm(
        belongs_to = "super::option_choices::Entity",
        from = "Column::TargetChoiceId",
        to = "super::option_choices::Column::Id"
    )]
    TargetChoice,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn kind(&self) -> Result<RuleKind, DbErr> {
        RuleKind::from_str(&self.rule_type)
            .map_err(|_| DbErr::Type(format!("Unknown rule type '{}'", self.rule_type)))
    }
}

impl TryFrom<&Model> for Rule {
    type Error = DbErr;

    fn try_from(model: &Model) -> Result<Self, Self::Error> {
        Ok(Rule {
            id: model.id,
            kind: model.kind()?,
            source: model.source_choice_id,
            target: model.target_choice_id,
            priority: model.priority,
            is_active: model.is_active,
            description: model.description.clone(),
            created_at: model.created_at,
        })
    }
}
