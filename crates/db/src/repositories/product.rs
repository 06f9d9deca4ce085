use chrono::Utc;
use sqlx::Row;

use catalog_core::domain::product::{Product, ProductDraft, ProductId};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, description, price, quantity";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: Option<String> =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price: f64 = row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Product { id: ProductId(id), name, description, price, quantity })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Product>, RepositoryError> {
        // SQLite lower() only folds ASCII, so names are folded in Rust on write.
        // instr keeps `%` and `_` literal, unlike LIKE.
        let folded = keyword.to_lowercase();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE ?1 = '' OR instr(name_folded, ?1) > 0
             ORDER BY id ASC"
        ))
        .bind(&folded)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, draft: ProductDraft) -> Result<Product, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        match draft.id {
            None => {
                let result = sqlx::query(
                    "INSERT INTO product
                         (name, name_folded, description, price, quantity, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&draft.name)
                .bind(draft.name.to_lowercase())
                .bind(&draft.description)
                .bind(draft.price)
                .bind(draft.quantity)
                .bind(&now)
                .bind(&now)
                .execute(&self.pool)
                .await?;

                let id = ProductId(result.last_insert_rowid());
                Ok(draft.into_product(id))
            }
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE product
                     SET name = ?, name_folded = ?, description = ?, price = ?, quantity = ?,
                         updated_at = ?
                     WHERE id = ?",
                )
                .bind(&draft.name)
                .bind(draft.name.to_lowercase())
                .bind(&draft.description)
                .bind(draft.price)
                .bind(draft.quantity)
                .bind(&now)
                .bind(id.0)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound(id));
                }
                Ok(draft.into_product(id))
            }
        }
    }

    async fn delete_by_id(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(product_id = id.0, "delete matched no product");
        }
        Ok(())
    }
}
