use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;

pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Raw `page`/`limit` query values; bad ones are reported on `errors`.
pub fn page_and_limit(
    errors: &mut ValidationErrors,
    page: Option<&str>,
    limit: Option<&str>,
) -> (i64, i64) {
    let limit = match limit {
        None => DEFAULT_PAGE_SIZE,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
            _ => {
                errors.add("limit", format!("Limit must be between 1 and {MAX_PAGE_SIZE}"));
                DEFAULT_PAGE_SIZE
            }
        },
    };

    let page = match page {
        None => 1,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) if n >= 1 && (n - 1).checked_mul(limit).is_some() => n,
            Ok(n) if n >= 1 => {
                errors.add("page", "Page is out of range");
                1
            }
            _ => {
                errors.add("page", "Page must be a positive integer");
                1
            }
        },
    };

    (page, limit)
}

pub fn offset(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}
