use async_trait::async_trait;
use thiserror::Error;

use catalog_core::domain::product::{Product, ProductDraft, ProductId};

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("product {0} not found")]
    NotFound(ProductId),
}

/// Persistence for the product catalog.
///
/// `search` matches names by case-insensitive substring; an empty keyword
/// matches every product. Listing and search results are ordered by id.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn search(&self, keyword: &str) -> Result<Vec<Product>, RepositoryError>;

    /// Inserts when `draft.id` is unset, otherwise overwrites that row.
    /// Overwriting an id that does not exist fails with `NotFound`.
    async fn save(&self, draft: ProductDraft) -> Result<Product, RepositoryError>;

    /// Removing an absent id is not an error.
    async fn delete_by_id(&self, id: ProductId) -> Result<(), RepositoryError>;
}
