use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};

use super::cascade::{self, CascadeSummary};
use super::pagination::{Page, PageRequest, Pagination};
use super::views::{CategoryView, TemplateView};
use crate::database::entities::{option_categories, product_templates};
use crate::errors::{CatalogError, CatalogResult};

/// Validated input for creating or replacing a product template.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProductTemplate {
    pub template_str_id: String,
    pub name: String,
    pub base_price: f64,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct ProductTemplateService {
    db: DatabaseConnection,
}

impl ProductTemplateService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(template_str_id = %input.template_str_id))]
    pub async fn create(&self, input: NewProductTemplate) -> CatalogResult<product_templates::Model> {
        let now = Utc::now();
        let template = product_templates::ActiveModel {
            template_str_id: Set(input.template_str_id),
            name: Set(input.name),
            base_price: Set(input.base_price),
            description: Set(input.description),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let template = template
            .insert(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("create product template", e))?;

        info!("Created product template {} ({})", template.template_str_id, template.id);
        Ok(template)
    }

    /// Newest first.
    pub async fn list(
        &self,
        page: PageRequest,
        include_categories: bool,
    ) -> CatalogResult<Page<TemplateView>> {
        let paginator = product_templates::Entity::find()
            .order_by_desc(product_templates::Column::CreatedAt)
            .order_by_desc(product_templates::Column::Id)
            .paginate(&self.db, page.limit);

        let total_items = paginator
            .num_items()
            .await
            .map_err(|e| CatalogError::from_db("count product templates", e))?;
        let templates = paginator
            .fetch_page(page.page - 1)
            .await
            .map_err(|e| CatalogError::from_db("list product templates", e))?;

        let mut categories = if include_categories {
            let ids: Vec<i32> = templates.iter().map(|t| t.id).collect();
            self.categories_by_template(&ids).await?
        } else {
            HashMap::new()
        };

        let items = templates
            .into_iter()
            .map(|template| {
                let option_categories = include_categories
                    .then(|| categories.remove(&template.id).unwrap_or_default());
                TemplateView {
                    template,
                    option_categories,
                }
            })
            .collect();

        Ok(Page {
            items,
            pagination: Pagination::new(page, total_items),
        })
    }

    pub async fn find(&self, template_str_id: &str) -> CatalogResult<product_templates::Model> {
        product_templates::Entity::find()
            .filter(product_templates::Column::TemplateStrId.eq(template_str_id))
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find product template", e))?
            .ok_or_else(|| CatalogError::not_found("Product template", template_str_id))
    }

    pub async fn get(&self, template_str_id: &str, include_categories: bool) -> CatalogResult<TemplateView> {
        let template = self.find(template_str_id).await?;
        let option_categories = if include_categories {
            Some(
                self.categories_by_template(&[template.id])
                    .await?
                    .remove(&template.id)
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        Ok(TemplateView {
            template,
            option_categories,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        template_str_id: &str,
        input: NewProductTemplate,
    ) -> CatalogResult<product_templates::Model> {
        let template = self.find(template_str_id).await?;

        let mut active: product_templates::ActiveModel = template.into();
        active.template_str_id = Set(input.template_str_id);
        active.name = Set(input.name);
        active.base_price = Set(input.base_price);
        active.description = Set(input.description);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(Utc::now());

        active
            .update(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("update product template", e))
    }

    /// Delete a template together with its categories, their choices and
    /// every rule touching those choices.
    #[instrument(skip(self))]
    pub async fn delete(&self, template_str_id: &str) -> CatalogResult<CascadeSummary> {
        let template = self.find(template_str_id).await?;

        let txn = self.db.begin().await?;
        let summary = cascade::delete_template(&txn, template.id)
            .await
            .map_err(|e| CatalogError::from_db("delete product template", e))?;
        txn.commit().await?;

        info!(
            "Deleted product template {} with {} categories, {} choices, {} rules",
            template.template_str_id, summary.categories, summary.choices, summary.rules
        );
        Ok(summary)
    }

    async fn categories_by_template(&self, template_ids: &[i32]) -> CatalogResult<HashMap<i32, Vec<CategoryView>>> {
        if template_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let categories = option_categories::Entity::find()
            .filter(option_categories::Column::ProductTemplateId.is_in(template_ids.iter().copied()))
            .order_by_asc(option_categories::Column::DisplayOrder)
            .order_by_asc(option_categories::Column::CreatedAt)
            .order_by_asc(option_categories::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list option categories", e))?;

        let mut grouped: HashMap<i32, Vec<CategoryView>> = HashMap::new();
        for category in categories {
            grouped
                .entry(category.product_template_id)
                .or_default()
                .push(CategoryView::bare(category));
        }
        Ok(grouped)
    }
}
