use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{ListParams, RecipeDetails, RecipeInput, RecipeSummary};
use super::repo;
use crate::error::{AppError, AppResult};
use crate::pagination::Pagination;

/// Inserts the recipe and its ingredients and reads the result back, all in one
/// transaction. Any failure drops the transaction, which rolls everything back.
pub async fn create_recipe(
    db: &PgPool,
    user_id: Uuid,
    input: &RecipeInput,
) -> anyhow::Result<RecipeDetails> {
    let mut tx = db.begin().await.context("begin tx")?;

    let recipe =
        repo::insert_recipe_tx(&mut tx, user_id, input.name.trim(), input.instructions.trim())
            .await?;

    if let Err(e) = repo::insert_ingredients_tx(&mut tx, recipe.id, &input.ingredients).await {
        warn!(error = %e, recipe_id = %recipe.id, "ingredient insert failed; rolling back recipe");
        return Err(e);
    }

    let ingredients = repo::list_ingredients(&mut *tx, recipe.id).await?;
    tx.commit().await.context("commit tx")?;

    info!(recipe_id = %recipe.id, ingredients = ingredients.len(), "recipe created");
    Ok(RecipeDetails::compose(recipe, ingredients, 0))
}

/// Replaces name, instructions and the whole ingredient list.
pub async fn update_recipe(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    input: &RecipeInput,
) -> AppResult<RecipeDetails> {
    let mut tx = db.begin().await.context("begin tx")?;

    let recipe = repo::update_recipe_tx(
        &mut tx,
        user_id,
        recipe_id,
        input.name.trim(),
        input.instructions.trim(),
    )
    .await?
    .ok_or(AppError::NotFound("Recipe"))?;

    repo::delete_ingredients_tx(&mut tx, recipe.id).await?;
    repo::insert_ingredients_tx(&mut tx, recipe.id, &input.ingredients).await?;
    let ingredients = repo::list_ingredients(&mut *tx, recipe.id).await?;
    let assignments = repo::count_assignments(&mut *tx, recipe.id).await?;
    tx.commit().await.context("commit tx")?;

    info!(recipe_id = %recipe.id, "recipe updated");
    Ok(RecipeDetails::compose(recipe, ingredients, assignments))
}

pub async fn get_recipe(db: &PgPool, user_id: Uuid, recipe_id: Uuid) -> AppResult<RecipeDetails> {
    let recipe = repo::find(db, user_id, recipe_id)
        .await?
        .ok_or(AppError::NotFound("Recipe"))?;
    let ingredients = repo::list_ingredients(db, recipe.id).await?;
    let assignments = repo::count_assignments(db, recipe.id).await?;
    Ok(RecipeDetails::compose(recipe, ingredients, assignments))
}

pub async fn list_recipes(
    db: &PgPool,
    user_id: Uuid,
    params: &ListParams,
) -> anyhow::Result<(Vec<RecipeSummary>, Pagination)> {
    let (rows, total) = repo::list_by_user(
        db,
        user_id,
        params.search.as_deref(),
        params.sort,
        params.limit,
        params.offset(),
    )
    .await?;
    Ok((
        rows.into_iter().map(RecipeSummary::from).collect(),
        Pagination::new(params.page, params.limit, total),
    ))
}

pub async fn delete_recipe(db: &PgPool, user_id: Uuid, recipe_id: Uuid) -> AppResult<()> {
    if !repo::delete(db, user_id, recipe_id).await? {
        return Err(AppError::NotFound("Recipe"));
    }
    info!(recipe_id = %recipe_id, "recipe deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::dto::IngredientInput;

    async fn seed_user(db: &PgPool) -> Uuid {
        sqlx::query_scalar("INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id")
            .bind(format!("{}@example.com", Uuid::new_v4()))
            .fetch_one(db)
            .await
            .unwrap()
    }

    fn input(ingredients: Vec<IngredientInput>) -> RecipeInput {
        RecipeInput {
            name: "Tomato soup".into(),
            instructions: "Blend the tomatoes and simmer.".into(),
            ingredients,
        }
    }

    fn ing(name: &str, quantity: Option<f64>, sort_order: i32) -> IngredientInput {
        IngredientInput {
            name: name.into(),
            quantity,
            unit: Some("g".into()),
            sort_order: Some(sort_order),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn created_recipe_reads_back_sorted(db: PgPool) {
        let user = seed_user(&db).await;
        let created = create_recipe(
            &db,
            user,
            &input(vec![ing("salt", Some(5.0), 2), ing("tomato", Some(500.0), 0), ing("onion", None, 1)]),
        )
        .await
        .unwrap();
        assert_eq!(created.assignments_count, 0);

        let fetched = get_recipe(&db, user, created.id).await.unwrap();
        let names: Vec<_> = fetched.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["tomato", "onion", "salt"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn failed_ingredient_insert_leaves_no_recipe(db: PgPool) {
        let user = seed_user(&db).await;
        // The CHECK constraint on quantity makes the ingredient insert fail.
        let res = create_recipe(&db, user, &input(vec![ing("tomato", Some(-1.0), 0)])).await;
        assert!(res.is_err());

        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE user_id = $1")
            .bind(user)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn other_users_cannot_read_or_delete(db: PgPool) {
        let owner = seed_user(&db).await;
        let stranger = seed_user(&db).await;
        let created = create_recipe(&db, owner, &input(vec![ing("tomato", Some(1.0), 0)]))
            .await
            .unwrap();
        assert!(matches!(
            get_recipe(&db, stranger, created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete_recipe(&db, stranger, created.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
