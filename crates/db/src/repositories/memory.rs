use std::collections::BTreeMap;

use tokio::sync::RwLock;

use catalog_core::domain::product::{Product, ProductDraft, ProductId};

use super::{ProductRepository, RepositoryError};

#[derive(Default)]
struct ProductTable {
    last_id: i64,
    rows: BTreeMap<ProductId, Product>,
}

/// Process-local catalog; ids increase monotonically and are never reused.
#[derive(Default)]
pub struct InMemoryProductRepository {
    table: RwLock<ProductTable>,
}

fn name_matches(name: &str, keyword: &str) -> bool {
    keyword.is_empty() || name.to_lowercase().contains(&keyword.to_lowercase())
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|product| name_matches(&product.name, keyword))
            .cloned()
            .collect())
    }

    async fn save(&self, draft: ProductDraft) -> Result<Product, RepositoryError> {
        let mut table = self.table.write().await;
        let id = match draft.id {
            Some(id) if table.rows.contains_key(&id) => id,
            Some(id) => return Err(RepositoryError::NotFound(id)),
            None => {
                table.last_id += 1;
                ProductId(table.last_id)
            }
        };

        let product = draft.into_product(id);
        table.rows.insert(id, product.clone());
        Ok(product)
    }

    async fn delete_by_id(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        table.rows.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{name_matches, InMemoryProductRepository};
    use crate::repositories::contract;

    #[tokio::test]
    async fn save_assigns_id_and_round_trips() {
        contract::save_assigns_id_and_round_trips(&InMemoryProductRepository::default()).await;
    }

    #[tokio::test]
    async fn ids_are_unique_and_listing_keeps_insertion_order() {
        contract::ids_are_unique_and_listing_keeps_insertion_order(
            &InMemoryProductRepository::default(),
        )
        .await;
    }

    #[tokio::test]
    async fn save_with_id_overwrites_existing_row() {
        contract::save_with_id_overwrites_existing_row(&InMemoryProductRepository::default()).await;
    }

    #[tokio::test]
    async fn save_with_unknown_id_is_not_found() {
        contract::save_with_unknown_id_is_not_found(&InMemoryProductRepository::default()).await;
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        contract::search_is_case_insensitive_substring(&InMemoryProductRepository::default())
            .await;
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        contract::search_folds_non_ascii_case(&InMemoryProductRepository::default()).await;
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        contract::search_treats_wildcards_literally(&InMemoryProductRepository::default()).await;
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        contract::delete_is_idempotent(&InMemoryProductRepository::default()).await;
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        contract::deleted_ids_are_not_reused(&InMemoryProductRepository::default()).await;
    }

    #[test]
    fn unicode_names_fold_case() {
        assert!(name_matches("Crème Brûlée", "BRÛLÉE"));
        assert!(name_matches("anything", ""));
        assert!(!name_matches("Widget", "gadget"));
    }
}
