use chrono::Utc;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Demo catalog loaded by `catalog seed`.
const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Computer",
        description: "Desktop workstation",
        price: 4300.0,
        quantity: 3,
    },
    SeedProduct { name: "Printer", description: "Laser printer", price: 1200.0, quantity: 4 },
    SeedProduct {
        name: "Smart Phone",
        description: "Unlocked handset",
        price: 3200.0,
        quantity: 32,
    },
];

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: f64,
    quantity: i64,
}

pub struct CatalogSeedDataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    /// Names inserted by this run; empty when the catalog already had rows.
    pub products_seeded: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl CatalogSeedDataset {
    /// Inserts the demo products, but only into an empty catalog so that
    /// operator data is never duplicated.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            tx.rollback().await?;
            return Ok(SeedResult { products_seeded: Vec::new() });
        }

        let now = Utc::now().to_rfc3339();
        for product in SEED_PRODUCTS {
            sqlx::query(
                "INSERT INTO product
                     (name, name_folded, description, price, quantity, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(product.name)
            .bind(product.name.to_lowercase())
            .bind(product.description)
            .bind(product.price)
            .bind(product.quantity)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(SeedResult { products_seeded: SEED_PRODUCTS.iter().map(|p| p.name).collect() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_PRODUCTS.len());

        for product in SEED_PRODUCTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product WHERE name = ?1 AND price = ?2)",
            )
            .bind(product.name)
            .bind(product.price)
            .fetch_one(pool)
            .await?;
            checks.push((product.name, present == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use super::CatalogSeedDataset;
    use crate::{connect_with_settings, migrations};

    async fn pool() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn load_then_verify_reports_every_product() {
        let pool = pool().await;

        let result = CatalogSeedDataset::load(&pool).await.expect("load");
        let verification = CatalogSeedDataset::verify(&pool).await.expect("verify");

        assert_eq!(result.products_seeded, vec!["Computer", "Printer", "Smart Phone"]);
        assert!(verification.all_present);
        assert_eq!(verification.checks.len(), 3);
    }

    #[tokio::test]
    async fn load_is_a_no_op_on_a_populated_catalog() {
        let pool = pool().await;
        CatalogSeedDataset::load(&pool).await.expect("first load");

        let second = CatalogSeedDataset::load(&pool).await.expect("second load");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product")
            .fetch_one(&pool)
            .await
            .expect("count");

        assert!(second.products_seeded.is_empty());
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn verify_flags_missing_products() {
        let pool = pool().await;

        let verification = CatalogSeedDataset::verify(&pool).await.expect("verify");

        assert!(!verification.all_present);
        assert!(verification.checks.iter().all(|(_, present)| !present));
    }
}
