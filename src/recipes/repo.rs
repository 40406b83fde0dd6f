use anyhow::Context;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{IngredientInput, RecipeSort};

#[derive(Debug, Clone, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub instructions: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeSummaryRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub ingredients_count: i64,
    pub assignments_count: i64,
}

fn order_clause(sort: RecipeSort) -> &'static str {
    match sort {
        RecipeSort::NameAsc => "lower(r.name) ASC, r.id",
        RecipeSort::NameDesc => "lower(r.name) DESC, r.id",
        RecipeSort::CreatedAsc => "r.created_at ASC, r.id",
        RecipeSort::CreatedDesc => "r.created_at DESC, r.id",
    }
}

/// `%term%` for ILIKE with the pattern metacharacters escaped.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// One page of a user's recipes plus the total number of matches.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    search: Option<&str>,
    sort: RecipeSort,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(Vec<RecipeSummaryRow>, i64)> {
    let pattern = search.map(like_pattern);

    let sql = format!(
        r#"
        SELECT r.id, r.name, r.created_at, r.updated_at,
               (SELECT COUNT(*) FROM ingredients i WHERE i.recipe_id = r.id) AS ingredients_count,
               (SELECT COUNT(*) FROM meal_plan m WHERE m.recipe_id = r.id) AS assignments_count
          FROM recipes r
         WHERE r.user_id = $1
           AND ($2::text IS NULL OR r.name ILIKE $2)
         ORDER BY {}
         LIMIT $3 OFFSET $4
        "#,
        order_clause(sort)
    );
    let rows = sqlx::query_as::<_, RecipeSummaryRow>(&sql)
        .bind(user_id)
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list recipes")?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
          FROM recipes r
         WHERE r.user_id = $1
           AND ($2::text IS NULL OR r.name ILIKE $2)
        "#,
    )
    .bind(user_id)
    .bind(pattern.as_deref())
    .fetch_one(db)
    .await
    .context("count recipes")?;

    Ok((rows, total))
}

pub async fn find<'e, E: PgExecutor<'e>>(
    ex: E,
    user_id: Uuid,
    recipe_id: Uuid,
) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, user_id, name, instructions, created_at, updated_at
          FROM recipes
         WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(ex)
    .await
    .context("find recipe")?;
    Ok(recipe)
}

pub async fn list_ingredients<'e, E: PgExecutor<'e>>(
    ex: E,
    recipe_id: Uuid,
) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, recipe_id, name, quantity, unit, sort_order
          FROM ingredients
         WHERE recipe_id = $1
         ORDER BY sort_order ASC, id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(ex)
    .await
    .context("list ingredients")?;
    Ok(rows)
}

pub async fn count_assignments<'e, E: PgExecutor<'e>>(ex: E, recipe_id: Uuid) -> anyhow::Result<i64> {
    let n = sqlx::query_scalar("SELECT COUNT(*) FROM meal_plan WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_one(ex)
        .await
        .context("count assignments")?;
    Ok(n)
}

pub async fn insert_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    name: &str,
    instructions: &str,
) -> anyhow::Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        INSERT INTO recipes (user_id, name, instructions)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, name, instructions, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(instructions)
    .fetch_one(&mut **tx)
    .await
    .context("insert recipe")?;
    Ok(recipe)
}

/// Bulk insert in a single statement.
pub async fn insert_ingredients_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    ingredients: &[IngredientInput],
) -> anyhow::Result<()> {
    if ingredients.is_empty() {
        return Ok(());
    }
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO ingredients (recipe_id, name, quantity, unit, sort_order) ");
    qb.push_values(ingredients.iter().enumerate(), |mut b, (idx, ing)| {
        b.push_bind(recipe_id)
            .push_bind(ing.name.trim().to_string())
            .push_bind(ing.quantity)
            .push_bind(ing.normalized_unit())
            .push_bind(ing.sort_order.unwrap_or(idx as i32));
    });
    qb.build()
        .execute(&mut **tx)
        .await
        .context("insert ingredients")?;
    Ok(())
}

pub async fn update_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    recipe_id: Uuid,
    name: &str,
    instructions: &str,
) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        UPDATE recipes
           SET name = $3, instructions = $4, updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, instructions, created_at, updated_at
        "#,
    )
    .bind(recipe_id)
    .bind(user_id)
    .bind(name)
    .bind(instructions)
    .fetch_optional(&mut **tx)
    .await
    .context("update recipe")?;
    Ok(recipe)
}

pub async fn delete_ingredients_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .context("delete ingredients")?;
    Ok(())
}

/// Ingredients and meal-plan assignments go with it (ON DELETE CASCADE).
pub async fn delete(db: &PgPool, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(recipe_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete recipe")?;
    Ok(res.rows_affected() == 1)
}
