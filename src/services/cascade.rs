//! Explicit dependent-row cleanup
//!
//! Foreign keys carry no ON DELETE action, so parents are removed only after
//! their dependents. Callers run these inside a transaction.

use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use tracing::debug;

use crate::compatibility::{Rule, RuleIndex};
use crate::database::entities::{compatibility_rules, option_categories, option_choices, product_templates};

/// Rows removed by one cascading delete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeSummary {
    pub templates: u64,
    pub categories: u64,
    pub choices: u64,
    pub rules: u64,
}

/// Delete every rule where one of the choices is source or target.
pub async fn delete_rules_touching<C: ConnectionTrait>(conn: &C, choice_ids: &[i32]) -> Result<u64, DbErr> {
    if choice_ids.is_empty() {
        return Ok(0);
    }
    let models = compatibility_rules::Entity::find()
        .filter(
            Condition::any()
                .add(compatibility_rules::Column::SourceChoiceId.is_in(choice_ids.iter().copied()))
                .add(compatibility_rules::Column::TargetChoiceId.is_in(choice_ids.iter().copied())),
        )
        .all(conn)
        .await?;
    let rules = models.iter().map(Rule::try_from).collect::<Result<Vec<_>, DbErr>>()?;
    let mut index = RuleIndex::from_rules(rules).map_err(|e| DbErr::Custom(e.to_string()))?;

    let rule_ids: Vec<i32> = choice_ids
        .iter()
        .flat_map(|&choice| index.remove_choice(choice))
        .map(|rule| rule.id)
        .collect();
    if rule_ids.is_empty() {
        return Ok(0);
    }

    let result = compatibility_rules::Entity::delete_many()
        .filter(compatibility_rules::Column::Id.is_in(rule_ids))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_choices<C: ConnectionTrait>(conn: &C, choice_ids: &[i32]) -> Result<CascadeSummary, DbErr> {
    let mut summary = CascadeSummary {
        rules: delete_rules_touching(conn, choice_ids).await?,
        ..Default::default()
    };
    if !choice_ids.is_empty() {
        summary.choices = option_choices::Entity::delete_many()
            .filter(option_choices::Column::Id.is_in(choice_ids.iter().copied()))
            .exec(conn)
            .await?
            .rows_affected;
    }
    debug!("Deleted {} choices and {} rules", summary.choices, summary.rules);
    Ok(summary)
}

pub async fn delete_categories<C: ConnectionTrait>(
    conn: &C,
    category_ids: &[i32],
) -> Result<CascadeSummary, DbErr> {
    if category_ids.is_empty() {
        return Ok(CascadeSummary::default());
    }
    let choice_ids: Vec<i32> = option_choices::Entity::find()
        .select_only()
        .column(option_choices::Column::Id)
        .filter(option_choices::Column::OptionCategoryId.is_in(category_ids.iter().copied()))
        .into_tuple()
        .all(conn)
        .await?;

    let mut summary = delete_choices(conn, &choice_ids).await?;
    summary.categories = option_categories::Entity::delete_many()
        .filter(option_categories::Column::Id.is_in(category_ids.iter().copied()))
        .exec(conn)
        .await?
        .rows_affected;
    Ok(summary)
}

pub async fn delete_template<C: ConnectionTrait>(conn: &C, template_id: i32) -> Result<CascadeSummary, DbErr> {
    let category_ids: Vec<i32> = option_categories::Entity::find()
        .select_only()
        .column(option_categories::Column::Id)
        .filter(option_categories::Column::ProductTemplateId.eq(template_id))
        .into_tuple()
        .all(conn)
        .await?;

    let mut summary = delete_categories(conn, &category_ids).await?;
    summary.templates = product_templates::Entity::delete_by_id(template_id)
        .exec(conn)
        .await?
        .rows_affected;
    Ok(summary)
}
