use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, instrument};

use super::cascade::{self, CascadeSummary};
use super::pagination::{Page, PageRequest, Pagination};
use super::views::{CategorySummary, ChoiceView};
use super::{ambiguous_key, CompatibilityRuleService, OptionCategoryService, ParentScope, ProductTemplateService};
use crate::database::entities::{option_categories, option_choices};
use crate::errors::{CatalogError, CatalogResult};

#[derive(Debug, Clone, PartialEq)]
pub struct NewOptionChoice {
    pub choice_str_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_delta: f64,
    pub is_default: bool,
    pub is_available: bool,
    pub display_order: i32,
}

#[derive(Clone)]
pub struct OptionChoiceService {
    db: DatabaseConnection,
    templates: ProductTemplateService,
    categories: OptionCategoryService,
    rules: CompatibilityRuleService,
}

impl OptionChoiceService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            templates: ProductTemplateService::new(db.clone()),
            categories: OptionCategoryService::new(db.clone()),
            rules: CompatibilityRuleService::new(db.clone()),
            db,
        }
    }

    /// `template_scope` narrows the category key when it is shared between
    /// templates.
    #[instrument(skip(self, template_scope, input), fields(choice_str_id = %input.choice_str_id))]
    pub async fn create(
        &self,
        category_str_id: &str,
        template_scope: &ParentScope,
        input: NewOptionChoice,
    ) -> CatalogResult<ChoiceView> {
        let category = self.categories.resolve(category_str_id, template_scope).await?;

        let now = Utc::now();
        let choice = option_choices::ActiveModel {
            choice_str_id: Set(input.choice_str_id),
            name: Set(input.name),
            description: Set(input.description),
            price_delta: Set(input.price_delta),
            is_default: Set(input.is_default),
            is_available: Set(input.is_available),
            display_order: Set(input.display_order),
            option_category_id: Set(category.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| CatalogError::from_db("create option choice", e))?;

        info!(
            "Created option choice {} in category {}",
            choice.choice_str_id, category.category_str_id
        );
        Ok(ChoiceView {
            choice,
            option_category: Some(CategorySummary::from(&category)),
            compatibility_rules: None,
        })
    }

    /// Choices of one category, by display order then creation.
    pub async fn list(
        &self,
        category_str_id: &str,
        template_scope: &ParentScope,
        page: PageRequest,
        include_rules: bool,
    ) -> CatalogResult<Page<ChoiceView>> {
        let category = self.categories.resolve(category_str_id, template_scope).await?;

        let paginator = option_choices::Entity::find()
            .filter(option_choices::Column::OptionCategoryId.eq(category.id))
            .order_by_asc(option_choices::Column::DisplayOrder)
            .order_by_asc(option_choices::Column::CreatedAt)
            .order_by_asc(option_choices::Column::Id)
            .paginate(&self.db, page.limit);

        let total_items = paginator
            .num_items()
            .await
            .map_err(|e| CatalogError::from_db("count option choices", e))?;
        let choices = paginator
            .fetch_page(page.page - 1)
            .await
            .map_err(|e| CatalogError::from_db("list option choices", e))?;

        let mut rules = if include_rules {
            self.rules.lookup_many(&choices).await?
        } else {
            HashMap::new()
        };

        let items = choices
            .into_iter()
            .map(|choice| {
                let compatibility_rules =
                    include_rules.then(|| rules.remove(&choice.id).unwrap_or_default());
                ChoiceView {
                    choice,
                    option_category: None,
                    compatibility_rules,
                }
            })
            .collect();

        Ok(Page {
            items,
            pagination: Pagination::new(page, total_items),
        })
    }

    /// Find a choice by key, narrowed by category and/or template when given.
    pub async fn resolve(&self, choice_str_id: &str, scope: &ParentScope) -> CatalogResult<option_choices::Model> {
        let category_ids = self.scope_category_ids(scope).await?;

        let mut query = option_choices::Entity::find()
            .filter(option_choices::Column::ChoiceStrId.eq(choice_str_id));
        if let Some(ids) = category_ids {
            query = query.filter(option_choices::Column::OptionCategoryId.is_in(ids));
        }

        let mut matches = query
            .order_by_asc(option_choices::Column::Id)
            .limit(2)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find option choice", e))?;

        match matches.len() {
            0 => Err(CatalogError::not_found("Option choice", choice_str_id)),
            1 => Ok(matches.remove(0)),
            _ => Err(ambiguous_key("choice_str_id", choice_str_id, "category_str_id")),
        }
    }

    pub async fn get(&self, choice_str_id: &str, scope: &ParentScope, include_rules: bool) -> CatalogResult<ChoiceView> {
        let choice = self.resolve(choice_str_id, scope).await?;
        let option_category = self.categories.summary(choice.option_category_id).await?;
        let compatibility_rules = if include_rules {
            Some(self.rules.lookup(&choice).await?)
        } else {
            None
        };

        Ok(ChoiceView {
            choice,
            option_category,
            compatibility_rules,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        choice_str_id: &str,
        scope: &ParentScope,
        input: NewOptionChoice,
    ) -> CatalogResult<option_choices::Model> {
        let choice = self.resolve(choice_str_id, scope).await?;

        let mut active: option_choices::ActiveModel = choice.into();
        active.choice_str_id = Set(input.choice_str_id);
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.price_delta = Set(input.price_delta);
        active.is_default = Set(input.is_default);
        active.is_available = Set(input.is_available);
        active.display_order = Set(input.display_order);
        active.updated_at = Set(Utc::now());

        active
            .update(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("update option choice", e))
    }

    /// Delete a choice and every rule where it is source or target.
    #[instrument(skip(self))]
    pub async fn delete(&self, choice_str_id: &str, scope: &ParentScope) -> CatalogResult<CascadeSummary> {
        let choice = self.resolve(choice_str_id, scope).await?;

        let txn = self.db.begin().await?;
        let summary = cascade::delete_choices(&txn, &[choice.id])
            .await
            .map_err(|e| CatalogError::from_db("delete option choice", e))?;
        txn.commit().await?;

        info!("Deleted option choice {} and {} rules", choice.choice_str_id, summary.rules);
        Ok(summary)
    }

    async fn scope_category_ids(&self, scope: &ParentScope) -> CatalogResult<Option<Vec<i32>>> {
        if let Some(category_str_id) = &scope.category_str_id {
            let template_scope = ParentScope {
                template_str_id: scope.template_str_id.clone(),
                category_str_id: None,
            };
            let category = self.categories.resolve(category_str_id, &template_scope).await?;
            return Ok(Some(vec![category.id]));
        }

        if let Some(template_str_id) = &scope.template_str_id {
            let template = self.templates.find(template_str_id).await?;
            let ids: Vec<i32> = option_categories::Entity::find()
                .select_only()
                .column(option_categories::Column::Id)
                .filter(option_categories::Column::ProductTemplateId.eq(template.id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| CatalogError::from_db("list option categories", e))?;
            return Ok(Some(ids));
        }

        Ok(None)
    }
}

/// Index loaded choices by id, for attaching summaries.
pub(crate) fn by_id(choices: Vec<option_choices::Model>) -> HashMap<i32, option_choices::Model> {
    choices.into_iter().map(|choice| (choice.id, choice)).collect()
}
