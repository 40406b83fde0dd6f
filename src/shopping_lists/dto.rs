use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::aggregate::{CategoryGroup, ShoppingListItem};
use super::repo::{ShoppingListRow, ShoppingListSummaryRow};
use crate::dates::iso_date;
use crate::meal_plan::{dto::check_day_of_week, MealType};
use crate::pagination::{self, page_and_limit, Pagination};
use crate::validation::{check_len, parse_week_start, Validate, ValidationErrors};

pub const MAX_SELECTIONS: usize = 28;
pub const MAX_PREVIEW_RECIPES: usize = 20;
pub const MAX_LIST_ITEMS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MealSelection {
    pub day_of_week: i16,
    pub meal_type: MealType,
}

/// Body of `POST /shopping-lists/preview`, discriminated by `source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PreviewRequest {
    Calendar {
        #[serde(default)]
        week_start_date: String,
        #[serde(default)]
        selections: Vec<MealSelection>,
    },
    Recipes {
        #[serde(default)]
        recipe_ids: Vec<Uuid>,
    },
}

impl Validate for PreviewRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self {
            PreviewRequest::Calendar {
                week_start_date,
                selections,
            } => {
                if week_start_date.trim().is_empty() {
                    errors.add("week_start_date", "This field is required");
                } else if let Err(msg) = parse_week_start(week_start_date) {
                    errors.add("week_start_date", msg);
                }
                if selections.is_empty() {
                    errors.add("selections", "Select at least one meal");
                } else if selections.len() > MAX_SELECTIONS {
                    errors.add(
                        "selections",
                        format!("At most {MAX_SELECTIONS} meals can be selected"),
                    );
                }
                for (i, sel) in selections.iter().enumerate() {
                    check_day_of_week(&mut errors, &format!("selections.{i}.day_of_week"), sel.day_of_week);
                }
            }
            PreviewRequest::Recipes { recipe_ids } => {
                if recipe_ids.is_empty() {
                    errors.add("recipe_ids", "Select at least one recipe");
                } else if recipe_ids.len() > MAX_PREVIEW_RECIPES {
                    errors.add(
                        "recipe_ids",
                        format!("At most {MAX_PREVIEW_RECIPES} recipes can be selected"),
                    );
                }
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewSource {
    Calendar,
    Recipes,
}

/// A recipe that fed the preview and how many times it was counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecipe {
    pub id: Uuid,
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListPreview {
    pub source: PreviewSource,
    #[serde(
        default,
        with = "iso_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub week_start_date: Option<Date>,
    pub recipes: Vec<SourceRecipe>,
    pub items: Vec<ShoppingListItem>,
    pub categories: Vec<CategoryGroup>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub data: ShoppingListPreview,
}

/// Body of `POST /shopping-lists`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateShoppingListRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start_date: Option<String>,
    #[serde(default)]
    pub items: Vec<ShoppingListItem>,
}

impl CreateShoppingListRequest {
    pub fn week_start(&self) -> Option<Date> {
        self.week_start_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| parse_week_start(s).ok())
    }
}

impl Validate for CreateShoppingListRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_len(&mut errors, "name", &self.name, 1, 100);

        if let Some(raw) = self.week_start_date.as_deref().filter(|s| !s.trim().is_empty()) {
            if let Err(msg) = parse_week_start(raw) {
                errors.add("week_start_date", msg);
            }
        }

        if self.items.is_empty() {
            errors.add("items", "Add at least one item");
        } else if self.items.len() > MAX_LIST_ITEMS {
            errors.add("items", format!("At most {MAX_LIST_ITEMS} items are allowed"));
        }
        for (i, item) in self.items.iter().enumerate() {
            check_len(&mut errors, &format!("items.{i}.name"), &item.name, 1, 100);
            if let Some(q) = item.quantity {
                if !q.is_finite() || q <= 0.0 {
                    errors.add(format!("items.{i}.quantity"), "Quantity must be positive");
                }
            }
            if let Some(unit) = &item.unit {
                check_len(&mut errors, &format!("items.{i}.unit"), unit, 0, 20);
            }
        }
        errors.into_result()
    }
}

/// Body of `PATCH /shopping-lists/:id/items/:index`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub is_checked: Option<bool>,
}

impl Validate for UpdateItemRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.is_checked.is_none() {
            errors.add("is_checked", "This field is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// `(page, limit, offset)`.
    pub fn params(&self) -> Result<(i64, i64, i64), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let (page, limit) = page_and_limit(&mut errors, self.page.as_deref(), self.limit.as_deref());
        errors.into_result()?;
        Ok((page, limit, pagination::offset(page, limit)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListView {
    pub id: Uuid,
    pub name: String,
    #[serde(default, with = "iso_date::option")]
    pub week_start_date: Option<Date>,
    pub items: Vec<ShoppingListItem>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ShoppingListRow> for ShoppingListView {
    fn from(row: ShoppingListRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            week_start_date: row.week_start_date,
            items: row.items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(default, with = "iso_date::option")]
    pub week_start_date: Option<Date>,
    pub items_count: i64,
    pub checked_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ShoppingListSummaryRow> for ShoppingListSummary {
    fn from(row: ShoppingListSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            week_start_date: row.week_start_date,
            items_count: row.items_count,
            checked_count: row.checked_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShoppingListResponse {
    pub success: bool,
    pub data: ShoppingListView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShoppingListsResponse {
    pub success: bool,
    pub data: Vec<ShoppingListSummary>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopping_lists::categories::Category;
    use serde_json::json;

    fn calendar(week: &str, selections: usize) -> PreviewRequest {
        PreviewRequest::Calendar {
            week_start_date: week.into(),
            selections: (0..selections)
                .map(|i| MealSelection {
                    day_of_week: (i % 7) as i16 + 1,
                    meal_type: MealType::Lunch,
                })
                .collect(),
        }
    }

    #[test]
    fn preview_request_is_tagged_by_source() {
        let req: PreviewRequest = serde_json::from_value(json!({
            "source": "calendar",
            "week_start_date": "2024-01-01",
            "selections": [{"day_of_week": 1, "meal_type": "dinner"}]
        }))
        .unwrap();
        assert!(matches!(req, PreviewRequest::Calendar { ref selections, .. } if selections.len() == 1));

        let req: PreviewRequest = serde_json::from_value(json!({
            "source": "recipes",
            "recipe_ids": [Uuid::nil()]
        }))
        .unwrap();
        assert!(matches!(req, PreviewRequest::Recipes { ref recipe_ids } if recipe_ids.len() == 1));

        assert!(serde_json::from_value::<PreviewRequest>(json!({"source": "pantry"})).is_err());
    }

    #[test]
    fn calendar_preview_bounds() {
        assert!(calendar("2024-01-01", 1).validate().is_ok());
        assert!(calendar("2024-01-01", MAX_SELECTIONS).validate().is_ok());

        let errors = calendar("2024-01-01", 0).validate().unwrap_err();
        assert!(errors.field("selections").is_some());
        let errors = calendar("2024-01-01", MAX_SELECTIONS + 1).validate().unwrap_err();
        assert!(errors.field("selections").is_some());

        let errors = calendar("2024-01-03", 1).validate().unwrap_err();
        assert_eq!(
            errors.field("week_start_date").unwrap(),
            ["Week start date must be a Monday"]
        );
    }

    #[test]
    fn calendar_selection_days_are_checked() {
        let req = PreviewRequest::Calendar {
            week_start_date: "2024-01-01".into(),
            selections: vec![MealSelection {
                day_of_week: 0,
                meal_type: MealType::Breakfast,
            }],
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field("selections.0.day_of_week").is_some());
    }

    #[test]
    fn recipe_preview_bounds() {
        let ids = |n: usize| PreviewRequest::Recipes {
            recipe_ids: (0..n).map(|_| Uuid::new_v4()).collect(),
        };
        assert!(ids(1).validate().is_ok());
        assert!(ids(MAX_PREVIEW_RECIPES).validate().is_ok());
        assert!(ids(0).validate().is_err());
        assert!(ids(MAX_PREVIEW_RECIPES + 1).validate().is_err());
    }

    #[test]
    fn create_request_defaults_item_fields() {
        let req: CreateShoppingListRequest = serde_json::from_value(json!({
            "name": "Week 1",
            "week_start_date": "2024-01-01",
            "items": [{"name": "milk", "quantity": 1, "unit": "l"}]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.items[0].category, Category::Other);
        assert!(!req.items[0].is_checked);
        assert!(req.week_start().is_some());
    }

    #[test]
    fn create_request_validation() {
        let req = CreateShoppingListRequest {
            name: " ".into(),
            week_start_date: Some("2024-01-02".into()),
            items: vec![ShoppingListItem {
                name: "".into(),
                quantity: Some(0.0),
                unit: None,
                category: Category::Other,
                is_checked: false,
            }],
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field("name").is_some());
        assert!(errors.field("week_start_date").is_some());
        assert!(errors.field("items.0.name").is_some());
        assert!(errors.field("items.0.quantity").is_some());

        let empty = CreateShoppingListRequest {
            name: "List".into(),
            ..Default::default()
        };
        assert_eq!(
            empty.validate().unwrap_err().field("items").unwrap(),
            ["Add at least one item"]
        );
    }

    #[test]
    fn preview_omits_missing_week() {
        let preview = ShoppingListPreview {
            source: PreviewSource::Recipes,
            week_start_date: None,
            recipes: vec![],
            items: vec![],
            categories: vec![],
        };
        let json = serde_json::to_value(&preview).unwrap();
        assert_eq!(json["source"], "recipes");
        assert!(json.get("week_start_date").is_none());
    }
}
