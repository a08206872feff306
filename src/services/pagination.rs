use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::validation::ValidationError;

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// A requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Parse raw `page`/`limit` query values. A limit above `max_limit` is
    /// clamped rather than rejected.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: u64,
        max_limit: u64,
    ) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::new();
        let page = parse_positive("page", page, 1, &mut errors);
        let limit = parse_positive("limit", limit, default_limit, &mut errors);
        errors.into_result()?;

        Ok(Self {
            page,
            limit: limit.min(max_limit.max(1)),
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

fn parse_positive(field: &str, raw: Option<&str>, default: u64, errors: &mut ValidationError) -> u64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value >= 1 => value,
        _ => {
            errors.push(
                field,
                format!("{} must be an integer greater than or equal to 1", field),
                Value::from(raw),
            );
            default
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        Self {
            current_page: request.page,
            total_pages: total_items.div_ceil(request.limit),
            total_items,
            items_per_page: request.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
