use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, instrument};

use super::cascade::{self, CascadeSummary};
use super::pagination::{Page, PageRequest, Pagination};
use super::views::{CategorySummary, CategoryView, ChoiceView, TemplateSummary};
use super::{ambiguous_key, ParentScope, ProductTemplateService};
use crate::database::entities::{option_categories, option_choices, product_templates};
use crate::errors::{CatalogError, CatalogResult};

#[derive(Debug, Clone, PartialEq)]
pub struct NewOptionCategory {
    pub category_str_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_required: bool,
    pub display_order: i32,
}

#[derive(Clone)]
pub struct OptionCategoryService {
    db: DatabaseConnection,
    templates: ProductTemplateService,
}

impl OptionCategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        let templates = ProductTemplateService::new(db.clone());
        Self { db, templates }
    }

    #[instrument(skip(self, input), fields(category_str_id = %input.category_str_id))]
    pub async fn create(
        &self,
        template_str_id: &str,
        input: NewOptionCategory,
    ) -> CatalogResult<CategoryView> {
        let template = self.templates.find(template_str_id).await?;

        let now = Utc::now();
        let category = option_categories::ActiveModel {
            category_str_id: Set(input.category_str_id),
            name: Set(input.name),
            description: Set(input.description),
            is_required: Set(input.is_required),
            display_order: Set(input.display_order),
            product_template_id: Set(template.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| CatalogError::from_db("create option category", e))?;

        info!(
            "Created option category {} in template {}",
            category.category_str_id, template.template_str_id
        );
        Ok(CategoryView {
            category,
            product_template: Some(TemplateSummary::from(&template)),
            option_choices: None,
        })
    }

    /// Categories of one template, by display order then creation.
    pub async fn list(
        &self,
        template_str_id: &str,
        page: PageRequest,
        include_choices: bool,
    ) -> CatalogResult<Page<CategoryView>> {
        let template = self.templates.find(template_str_id).await?;

        let paginator = option_categories::Entity::find()
            .filter(option_categories::Column::ProductTemplateId.eq(template.id))
            .order_by_asc(option_categories::Column::DisplayOrder)
            .order_by_asc(option_categories::Column::CreatedAt)
            .order_by_asc(option_categories::Column::Id)
            .paginate(&self.db, page.limit);

        let total_items = paginator
            .num_items()
            .await
            .map_err(|e| CatalogError::from_db("count option categories", e))?;
        let categories = paginator
            .fetch_page(page.page - 1)
            .await
            .map_err(|e| CatalogError::from_db("list option categories", e))?;

        let mut choices = if include_choices {
            let ids: Vec<i32> = categories.iter().map(|c| c.id).collect();
            self.choices_by_category(&ids).await?
        } else {
            HashMap::new()
        };

        let items = categories
            .into_iter()
            .map(|category| {
                let option_choices =
                    include_choices.then(|| choices.remove(&category.id).unwrap_or_default());
                CategoryView {
                    category,
                    product_template: None,
                    option_choices,
                }
            })
            .collect();

        Ok(Page {
            items,
            pagination: Pagination::new(page, total_items),
        })
    }

    /// Find a category by key. Without a template scope the key must be
    /// unique across templates.
    pub async fn resolve(
        &self,
        category_str_id: &str,
        scope: &ParentScope,
    ) -> CatalogResult<option_categories::Model> {
        let mut query = option_categories::Entity::find()
            .filter(option_categories::Column::CategoryStrId.eq(category_str_id));

        if let Some(template_str_id) = &scope.template_str_id {
            let template = self.templates.find(template_str_id).await?;
            query = query.filter(option_categories::Column::ProductTemplateId.eq(template.id));
        }

        let mut matches = query
            .order_by_asc(option_categories::Column::Id)
            .limit(2)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find option category", e))?;

        match matches.len() {
            0 => Err(CatalogError::not_found("Option category", category_str_id)),
            1 => Ok(matches.remove(0)),
            _ => Err(ambiguous_key("category_str_id", category_str_id, "template_str_id")),
        }
    }

    pub async fn get(
        &self,
        category_str_id: &str,
        scope: &ParentScope,
        include_choices: bool,
    ) -> CatalogResult<CategoryView> {
        let category = self.resolve(category_str_id, scope).await?;
        let template = product_templates::Entity::find_by_id(category.product_template_id)
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find product template", e))?;

        let option_choices = if include_choices {
            Some(
                self.choices_by_category(&[category.id])
                    .await?
                    .remove(&category.id)
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        Ok(CategoryView {
            category,
            product_template: template.as_ref().map(TemplateSummary::from),
            option_choices,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        category_str_id: &str,
        scope: &ParentScope,
        input: NewOptionCategory,
    ) -> CatalogResult<option_categories::Model> {
        let category = self.resolve(category_str_id, scope).await?;

        let mut active: option_categories::ActiveModel = category.into();
        active.category_str_id = Set(input.category_str_id);
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.is_required = Set(input.is_required);
        active.display_order = Set(input.display_order);
        active.updated_at = Set(Utc::now());

        active
            .update(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("update option category", e))
    }

    /// Delete a category, its choices and every rule touching them.
    #[instrument(skip(self))]
    pub async fn delete(&self, category_str_id: &str, scope: &ParentScope) -> CatalogResult<CascadeSummary> {
        let category = self.resolve(category_str_id, scope).await?;

        let txn = self.db.begin().await?;
        let summary = cascade::delete_categories(&txn, &[category.id])
            .await
            .map_err(|e| CatalogError::from_db("delete option category", e))?;
        txn.commit().await?;

        info!(
            "Deleted option category {} with {} choices, {} rules",
            category.category_str_id, summary.choices, summary.rules
        );
        Ok(summary)
    }

    /// Summary of a category with its template attached.
    pub async fn summary(&self, category_id: i32) -> CatalogResult<Option<CategorySummary>> {
        let Some(category) = option_categories::Entity::find_by_id(category_id)
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find option category", e))?
        else {
            return Ok(None);
        };
        let template = product_templates::Entity::find_by_id(category.product_template_id)
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find product template", e))?;

        let mut summary = CategorySummary::from(&category);
        summary.product_template = template.as_ref().map(TemplateSummary::from);
        Ok(Some(summary))
    }

    async fn choices_by_category(&self, category_ids: &[i32]) -> CatalogResult<HashMap<i32, Vec<ChoiceView>>> {
        if category_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let choices = option_choices::Entity::find()
            .filter(option_choices::Column::OptionCategoryId.is_in(category_ids.iter().copied()))
            .order_by_asc(option_choices::Column::DisplayOrder)
            .order_by_asc(option_choices::Column::CreatedAt)
            .order_by_asc(option_choices::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list option choices", e))?;

        let mut grouped: HashMap<i32, Vec<ChoiceView>> = HashMap::new();
        for choice in choices {
            grouped
                .entry(choice.option_category_id)
                .or_default()
                .push(ChoiceView::bare(choice));
        }
        Ok(grouped)
    }
}
