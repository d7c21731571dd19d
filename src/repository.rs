use crate::models::{CreateDrinkRequest, Drink, Ingredient, UpdateDrinkRequest};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// StoreError
///
/// Failure taxonomy for the persistence layer. Unlike a catch-all "unknown
/// error", each cause is kept distinct so the boundary can map a duplicate
/// title to a conflict response while everything else becomes an internal
/// error with the original cause preserved for logging.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The title unique constraint was violated on create or retitle.
    #[error("a drink with this title already exists")]
    DuplicateTitle,
    /// Connectivity or query failure in the underlying database.
    #[error("database error")]
    Database(#[source] sqlx::Error),
    /// A stored recipe column did not deserialize back into ingredients.
    #[error("stored recipe data is corrupt")]
    Corrupt(#[from] serde_json::Error),
}

/// DrinkRepository Trait
///
/// Defines the abstract contract for all persistence operations over the
/// drinks table. Handlers interact with the data layer through this trait
/// without knowing the concrete implementation (Postgres in production, the
/// in-memory store in tests).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn DrinkRepository>`) safely shareable across Axum's asynchronous
/// task boundaries.
#[async_trait]
pub trait DrinkRepository: Send + Sync {
    /// All drinks, ordered by id so listings are deterministic.
    async fn list(&self) -> Result<Vec<Drink>, StoreError>;
    /// Single drink lookup; `None` when the id is absent.
    async fn get(&self, id: i64) -> Result<Option<Drink>, StoreError>;
    /// Inserts a new drink and assigns its id.
    async fn create(&self, req: CreateDrinkRequest) -> Result<Drink, StoreError>;
    /// Partial update; fields omitted from the request are left unchanged.
    /// `None` when the id is absent.
    async fn update(&self, id: i64, req: UpdateDrinkRequest) -> Result<Option<Drink>, StoreError>;
    /// Removes a drink; `false` when the id is absent. Ids are not reused.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn DrinkRepository>;

// --- Postgres Implementation ---

/// Raw database row. The recipe column holds the ingredient list serialized
/// as JSON text and is decoded on the way out.
#[derive(Debug, FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: String,
}

impl DrinkRow {
    fn into_drink(self) -> Result<Drink, StoreError> {
        let recipe: Vec<Ingredient> = serde_json::from_str(&self.recipe)?;
        Ok(Drink {
            id: self.id,
            title: self.title,
            recipe,
        })
    }
}

/// Maps a sqlx error, promoting a unique-constraint violation on the title
/// column to the dedicated conflict kind.
fn map_db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return StoreError::DuplicateTitle;
        }
    }
    StoreError::Database(e)
}

/// PostgresDrinkStore
///
/// The concrete implementation of the `DrinkRepository` trait, backed by the
/// PostgreSQL drinks table. Title uniqueness is enforced by the table's
/// unique constraint rather than a scan, so two concurrent creates with the
/// same title cannot both insert.
pub struct PostgresDrinkStore {
    pool: PgPool,
}

impl PostgresDrinkStore {
    /// Creates a new store instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DrinkRepository for PostgresDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        let rows = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(DrinkRow::into_drink).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        let row =
            sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        row.map(DrinkRow::into_drink).transpose()
    }

    async fn create(&self, req: CreateDrinkRequest) -> Result<Drink, StoreError> {
        let recipe_text = serde_json::to_string(&req.recipe)?;

        let row = sqlx::query_as::<_, DrinkRow>(
            "INSERT INTO drinks (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(&req.title)
        .bind(&recipe_text)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.into_drink()
    }

    /// Uses the PostgreSQL `COALESCE` function to handle the `Option<T>`
    /// fields, only touching a column when the corresponding request field is
    /// `Some`.
    async fn update(&self, id: i64, req: UpdateDrinkRequest) -> Result<Option<Drink>, StoreError> {
        let recipe_text = match &req.recipe {
            Some(recipe) => Some(serde_json::to_string(recipe)?),
            None => None,
        };

        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            UPDATE drinks
            SET title = COALESCE($2, title),
                recipe = COALESCE($3, recipe)
            WHERE id = $1
            RETURNING id, title, recipe
            "#,
        )
        .bind(id)
        .bind(&req.title)
        .bind(&recipe_text)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(DrinkRow::into_drink).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

// --- In-Memory Implementation ---

#[derive(Default)]
struct InMemoryInner {
    next_id: i64,
    drinks: Vec<Drink>,
}

/// InMemoryDrinkStore
///
/// A full-fidelity in-memory implementation of the `DrinkRepository` trait:
/// monotonically increasing ids that are never reused, and the same title
/// uniqueness rule as the Postgres table. Used by the end-to-end tests so
/// they exercise the real router and handlers without a database.
#[derive(Default)]
pub struct InMemoryDrinkStore {
    inner: Mutex<InMemoryInner>,
}

impl InMemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recovers the guard even if another thread panicked while holding the
    /// lock; the store data itself is always left consistent, so poisoning
    /// must not wedge every subsequent call.
    fn locked(&self) -> std::sync::MutexGuard<'_, InMemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DrinkRepository for InMemoryDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        let inner = self.locked();
        Ok(inner.drinks.clone())
    }

    async fn get(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        let inner = self.locked();
        Ok(inner.drinks.iter().find(|d| d.id == id).cloned())
    }

    async fn create(&self, req: CreateDrinkRequest) -> Result<Drink, StoreError> {
        let mut inner = self.locked();
        if inner.drinks.iter().any(|d| d.title == req.title) {
            return Err(StoreError::DuplicateTitle);
        }

        inner.next_id += 1;
        let drink = Drink {
            id: inner.next_id,
            title: req.title,
            recipe: req.recipe,
        };
        inner.drinks.push(drink.clone());
        Ok(drink)
    }

    async fn update(&self, id: i64, req: UpdateDrinkRequest) -> Result<Option<Drink>, StoreError> {
        let mut inner = self.locked();

        if let Some(new_title) = &req.title {
            if inner.drinks.iter().any(|d| d.title == *new_title && d.id != id) {
                return Err(StoreError::DuplicateTitle);
            }
        }

        let Some(drink) = inner.drinks.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            drink.title = title;
        }
        if let Some(recipe) = req.recipe {
            drink.recipe = recipe;
        }
        Ok(Some(drink.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.locked();
        let before = inner.drinks.len();
        inner.drinks.retain(|d| d.id != id);
        Ok(inner.drinks.len() < before)
    }
}
