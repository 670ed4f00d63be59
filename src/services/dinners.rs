use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::{
    models::dinner::{CreateDinnerRequest, Dinner, UpdateDinnerRequest},
    services::metrics::{ASSIGNMENTS_DELETED_COUNTER, DINNERS_CREATED_COUNTER, DINNERS_DELETED_COUNTER, DINNERS_SEEDED_COUNTER},
};

/// One entry of the example catalog inserted into an empty store.
pub struct SeedDinner {
    pub name: &'static str,
    pub ingredients: &'static [&'static str],
    pub recipe: &'static str,
}

pub const SEED_DINNERS: &[SeedDinner] = &[
    SeedDinner {
        name: "Spaghetti Bolognese",
        ingredients: &["spaghetti", "ground beef", "tomato sauce", "onion", "garlic", "olive oil", "salt", "pepper"],
        recipe: "1. Cook spaghetti according to package.\n2. Brown beef with onion and garlic.\n3. Add tomato sauce, simmer.\n4. Serve over spaghetti.",
    },
    SeedDinner {
        name: "Chicken Stir Fry",
        ingredients: &["chicken breast", "broccoli", "carrot", "soy sauce", "ginger", "garlic", "vegetable oil"],
        recipe: "1. Slice chicken and veggies.\n2. Stir fry chicken, then veggies.\n3. Add soy sauce, ginger, garlic.\n4. Toss together and serve.",
    },
    SeedDinner {
        name: "Tacos",
        ingredients: &["ground beef", "taco shells", "lettuce", "tomato", "cheddar cheese", "taco seasoning", "sour cream"],
        recipe: "1. Cook beef with taco seasoning.\n2. Fill shells with beef and toppings.\n3. Serve with sour cream.",
    },
    SeedDinner {
        name: "Veggie Curry",
        ingredients: &["potato", "carrot", "peas", "coconut milk", "curry paste", "onion", "garlic", "ginger"],
        recipe: "1. Sauté onion, garlic, ginger.\n2. Add veggies and curry paste.\n3. Pour in coconut milk, simmer.\n4. Serve with rice.",
    },
    SeedDinner {
        name: "Salmon & Rice Bowl",
        ingredients: &["salmon fillet", "rice", "avocado", "cucumber", "soy sauce", "sesame seeds"],
        recipe: "1. Cook rice.\n2. Sear salmon.\n3. Assemble bowl with toppings.\n4. Drizzle with soy sauce.",
    },
];

pub struct DinnerService;

impl DinnerService {
    pub async fn list(pool: &SqlitePool) -> anyhow::Result<Vec<Dinner>> {
        let dinners = sqlx::query_as::<_, Dinner>(
            "SELECT id, name, recipe, ingredients FROM dinners ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(dinners)
    }

    /// List all dinners, populating the example catalog first if the table is empty.
    pub async fn list_or_seed(pool: &SqlitePool) -> anyhow::Result<Vec<Dinner>> {
        Self::seed_if_empty(pool).await?;
        Self::list(pool).await
    }

    /// Insert the example catalog when no dinner exists yet. Returns the number
    /// of rows inserted (0 or `SEED_DINNERS.len()`).
    ///
    /// The emptiness check and the insert are a single statement, so two
    /// concurrent first reads cannot both seed.
    pub async fn seed_if_empty(pool: &SqlitePool) -> anyhow::Result<u64> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO dinners (name, recipe, ingredients)
             SELECT column1, column2, column3 FROM (",
        );
        qb.push_values(SEED_DINNERS.iter(), |mut row, seed| {
            row.push_bind(seed.name)
                .push_bind(seed.recipe)
                .push_bind(Json(seed.ingredients));
        });
        qb.push(") WHERE NOT EXISTS (SELECT 1 FROM dinners)");

        let inserted = qb.build().execute(pool).await?.rows_affected();
        if inserted > 0 {
            DINNERS_SEEDED_COUNTER.inc_by(inserted);
            info!("Seeded {} example dinners", inserted);
        }
        Ok(inserted)
    }

    pub async fn find(pool: &SqlitePool, id: i64) -> anyhow::Result<Option<Dinner>> {
        let dinner = sqlx::query_as::<_, Dinner>(
            "SELECT id, name, recipe, ingredients FROM dinners WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(dinner)
    }

    /// Insert a dinner. The caller validates `name`.
    pub async fn create(pool: &SqlitePool, req: &CreateDinnerRequest) -> anyhow::Result<Dinner> {
        let dinner = sqlx::query_as::<_, Dinner>(
            "INSERT INTO dinners (name, recipe, ingredients)
             VALUES (?, ?, ?)
             RETURNING id, name, recipe, ingredients",
        )
        .bind(req.name())
        .bind(req.recipe.as_deref().unwrap_or_default())
        .bind(Json(&req.ingredients))
        .fetch_one(pool)
        .await?;
        DINNERS_CREATED_COUNTER.inc();
        Ok(dinner)
    }

    /// Partial update. Returns `None` when no dinner has this id. An explicit
    /// `null` recipe clears it; `name` and `ingredients` keep their value.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        req: &UpdateDinnerRequest,
    ) -> anyhow::Result<Option<Dinner>> {
        let dinner = sqlx::query_as::<_, Dinner>(
            "UPDATE dinners
             SET name        = COALESCE(?, name),
                 recipe      = CASE WHEN ? THEN ? ELSE recipe END,
                 ingredients = COALESCE(?, ingredients)
             WHERE id = ?
             RETURNING id, name, recipe, ingredients",
        )
        .bind(&req.name)
        .bind(req.recipe.is_some())
        .bind(req.recipe.as_ref().and_then(|r| r.as_deref()))
        .bind(req.ingredients.as_ref().map(Json))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(dinner)
    }

    /// Delete a dinner and every assignment pointing at it, in one transaction.
    /// Returns `None` when no dinner has this id (nothing is changed), otherwise
    /// the number of assignments removed alongside it.
    pub async fn delete(pool: &SqlitePool, id: i64) -> anyhow::Result<Option<u64>> {
        let mut tx = pool.begin().await?;

        let assignments = sqlx::query("DELETE FROM dinner_assignments WHERE dinner_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM dinners WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        DINNERS_DELETED_COUNTER.inc();
        ASSIGNMENTS_DELETED_COUNTER.inc_by(assignments);
        Ok(Some(assignments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn test_pool() -> SqlitePool {
        let pool = db::create_memory_pool().await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn create_request(name: &str, ingredients: &[&str]) -> CreateDinnerRequest {
        CreateDinnerRequest {
            name: Some(name.to_string()),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            recipe: None,
        }
    }

    #[tokio::test]
    async fn seeds_once_when_empty() {
        let pool = test_pool().await;

        let first = DinnerService::list_or_seed(&pool).await.unwrap();
        assert_eq!(first.len(), SEED_DINNERS.len());
        assert_eq!(first[0].name, "Spaghetti Bolognese");
        assert_eq!(first[4].name, "Salmon & Rice Bowl");
        assert_eq!(first[2].ingredients.len(), 7);

        let second = DinnerService::list_or_seed(&pool).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(DinnerService::seed_if_empty(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn does_not_seed_a_populated_store() {
        let pool = test_pool().await;
        DinnerService::create(&pool, &create_request("Soup", &[])).await.unwrap();

        let dinners = DinnerService::list_or_seed(&pool).await.unwrap();
        assert_eq!(dinners.len(), 1);
        assert_eq!(dinners[0].name, "Soup");
    }

    #[tokio::test]
    async fn create_keeps_ingredients_with_commas() {
        let pool = test_pool().await;
        let req = create_request("  Pizza ", &["flour", "salt, to taste", "tomato"]);

        let created = DinnerService::create(&pool, &req).await.unwrap();
        assert_eq!(created.name, "Pizza");
        assert_eq!(created.recipe.as_deref(), Some(""));

        let found = DinnerService::find(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(found.ingredients, vec!["flour", "salt, to taste", "tomato"]);
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let pool = test_pool().await;
        let created = DinnerService::create(&pool, &create_request("Chili", &["beans", "beef"]))
            .await
            .unwrap();

        let req = UpdateDinnerRequest {
            recipe: Some(Some("Simmer for an hour.".into())),
            ..Default::default()
        };
        let updated = DinnerService::update(&pool, created.id, &req).await.unwrap().unwrap();
        assert_eq!(updated.name, "Chili");
        assert_eq!(updated.ingredients, vec!["beans", "beef"]);
        assert_eq!(updated.recipe.as_deref(), Some("Simmer for an hour."));

        let req = UpdateDinnerRequest {
            ingredients: Some(vec![]),
            ..Default::default()
        };
        let updated = DinnerService::update(&pool, created.id, &req).await.unwrap().unwrap();
        assert!(updated.ingredients.is_empty());
        assert_eq!(updated.recipe.as_deref(), Some("Simmer for an hour."));
    }

    #[tokio::test]
    async fn update_with_null_recipe_clears_it() {
        let pool = test_pool().await;
        let created = DinnerService::create(&pool, &create_request("Chili", &["beans"]))
            .await
            .unwrap();

        let req = UpdateDinnerRequest {
            recipe: Some(None),
            ..Default::default()
        };
        let updated = DinnerService::update(&pool, created.id, &req).await.unwrap().unwrap();
        assert_eq!(updated.recipe, None);
        assert_eq!(updated.name, "Chili");
        assert_eq!(updated.ingredients, vec!["beans"]);
    }

    #[tokio::test]
    async fn update_missing_dinner_returns_none() {
        let pool = test_pool().await;
        let req = UpdateDinnerRequest {
            name: Some("Ghost".into()),
            ..Default::default()
        };
        assert!(DinnerService::update(&pool, 42, &req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_dependent_assignments() {
        let pool = test_pool().await;
        let dinner = DinnerService::create(&pool, &create_request("Stew", &[])).await.unwrap();
        for date in ["2024-06-01", "2024-06-02"] {
            sqlx::query("INSERT INTO dinner_assignments (date, dinner_id) VALUES (?, ?)")
                .bind(date)
                .bind(dinner.id)
                .execute(&pool)
                .await
                .unwrap();
        }

        assert_eq!(DinnerService::delete(&pool, dinner.id).await.unwrap(), Some(2));
        assert!(DinnerService::find(&pool, dinner.id).await.unwrap().is_none());

        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dinner_assignments")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn delete_missing_dinner_returns_none() {
        let pool = test_pool().await;
        assert_eq!(DinnerService::delete(&pool, 7).await.unwrap(), None);
    }
}
