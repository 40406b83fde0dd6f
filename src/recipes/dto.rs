use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Ingredient, Recipe, RecipeSummaryRow};
use crate::pagination::{self, page_and_limit, Pagination};
use crate::validation::{check_len, Validate, ValidationErrors};

pub const MAX_INGREDIENTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RecipeSort {
    NameAsc,
    NameDesc,
    CreatedAsc,
    #[default]
    CreatedDesc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientInput {
    #[serde(default)]
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    /// Falls back to the position in the submitted list.
    pub sort_order: Option<i32>,
}

impl IngredientInput {
    pub fn normalized_unit(&self) -> Option<String> {
        self.unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    }
}

/// Body of `POST /recipes` and `PUT /recipes/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
}

impl Validate for RecipeInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_len(&mut errors, "name", &self.name, 3, 100);
        check_len(&mut errors, "instructions", &self.instructions, 10, 5000);

        if self.ingredients.is_empty() {
            errors.add("ingredients", "Add at least one ingredient");
        } else if self.ingredients.len() > MAX_INGREDIENTS {
            errors.add(
                "ingredients",
                format!("At most {MAX_INGREDIENTS} ingredients are allowed"),
            );
        }

        for (i, ing) in self.ingredients.iter().enumerate() {
            check_len(&mut errors, &format!("ingredients.{i}.name"), &ing.name, 1, 100);
            if let Some(q) = ing.quantity {
                if !q.is_finite() || q <= 0.0 {
                    errors.add(format!("ingredients.{i}.quantity"), "Quantity must be positive");
                }
            }
            if let Some(unit) = &ing.unit {
                check_len(&mut errors, &format!("ingredients.{i}.unit"), unit, 0, 20);
            }
            if matches!(ing.sort_order, Some(n) if n < 0) {
                errors.add(format!("ingredients.{i}.sort_order"), "Must not be negative");
            }
        }
        errors.into_result()
    }
}

/// Raw `GET /recipes` query; parsed by [`ListQuery::params`].
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub search: Option<String>,
    pub sort: RecipeSort,
    pub page: i64,
    pub limit: i64,
}

impl ListParams {
    pub fn offset(&self) -> i64 {
        pagination::offset(self.page, self.limit)
    }
}

impl ListQuery {
    pub fn params(&self) -> Result<ListParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let sort = match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => RecipeSort::default(),
            Some(s) => s.parse::<RecipeSort>().unwrap_or_else(|_| {
                errors.add(
                    "sort",
                    "Sort must be one of name_asc, name_desc, created_asc, created_desc",
                );
                RecipeSort::default()
            }),
        };

        let (page, limit) = page_and_limit(&mut errors, self.page.as_deref(), self.limit.as_deref());

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if matches!(&search, Some(s) if s.chars().count() > 100) {
            errors.add("search", "Must be at most 100 characters");
        }

        errors.into_result()?;
        Ok(ListParams {
            search,
            sort,
            page,
            limit,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientView {
    pub id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub sort_order: i32,
}

impl From<Ingredient> for IngredientView {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            quantity: i.quantity,
            unit: i.unit,
            sort_order: i.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetails {
    pub id: Uuid,
    pub name: String,
    pub instructions: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub ingredients: Vec<IngredientView>,
    pub assignments_count: i64,
}

impl RecipeDetails {
    /// Composes the response; ingredients end up in ascending `sort_order`.
    pub fn compose(recipe: Recipe, mut ingredients: Vec<Ingredient>, assignments_count: i64) -> Self {
        ingredients.sort_by_key(|i| i.sort_order);
        Self {
            id: recipe.id,
            name: recipe.name,
            instructions: recipe.instructions,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
            ingredients: ingredients.into_iter().map(IngredientView::from).collect(),
            assignments_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub ingredients_count: i64,
    pub assignments_count: i64,
}

impl From<RecipeSummaryRow> for RecipeSummary {
    fn from(r: RecipeSummaryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
            ingredients_count: r.ingredients_count,
            assignments_count: r.assignments_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeListResponse {
    pub success: bool,
    pub data: Vec<RecipeSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub success: bool,
    pub data: RecipeDetails,
}
