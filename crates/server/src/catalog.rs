//! Product catalog workflow: turns one request into repository calls and a
//! view or redirect outcome. Holds no state besides the injected repository.

use std::sync::Arc;

use catalog_core::domain::product::{FieldErrors, Product, ProductForm, ProductId};
use catalog_core::errors::{ApplicationError, DomainError};
use catalog_db::repositories::{ProductRepository, RepositoryError};
use tracing::{info, warn};

pub const PRODUCT_LIST_PATH: &str = "/user/index";

#[derive(Clone, Debug, PartialEq)]
pub enum CatalogOutcome {
    ProductList { products: Vec<Product>, keyword: Option<String> },
    NewProductForm { form: ProductForm, errors: FieldErrors },
    EditProductForm { form: ProductForm, errors: FieldErrors },
    Redirect(&'static str),
}

impl CatalogOutcome {
    fn to_list() -> Self {
        Self::Redirect(PRODUCT_LIST_PATH)
    }
}

fn persistence_error(error: RepositoryError) -> ApplicationError {
    match error {
        RepositoryError::NotFound(id) => DomainError::UnknownProduct(id).into(),
        other => ApplicationError::Persistence(other.to_string()),
    }
}

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub async fn list(&self) -> Result<CatalogOutcome, ApplicationError> {
        let products = self.products.list_all().await.map_err(persistence_error)?;
        Ok(CatalogOutcome::ProductList { products, keyword: None })
    }

    pub fn home(&self) -> CatalogOutcome {
        CatalogOutcome::to_list()
    }

    pub async fn search(&self, keyword: &str) -> Result<CatalogOutcome, ApplicationError> {
        let products = self.products.search(keyword).await.map_err(persistence_error)?;
        info!(
            event_name = "catalog.product.searched",
            keyword = %keyword,
            matches = products.len(),
            "product search completed"
        );
        Ok(CatalogOutcome::ProductList { products, keyword: Some(keyword.to_string()) })
    }

    pub fn new_product_form(&self) -> CatalogOutcome {
        CatalogOutcome::NewProductForm { form: ProductForm::default(), errors: FieldErrors::default() }
    }

    pub async fn save_product(&self, form: ProductForm) -> Result<CatalogOutcome, ApplicationError> {
        let mut draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(errors) => {
                info!(
                    event_name = "catalog.product.rejected",
                    fields = %errors,
                    "new product failed validation"
                );
                return Ok(CatalogOutcome::NewProductForm { form, errors });
            }
        };
        // a create never overwrites, whatever id was posted
        draft.id = None;

        let product = self.products.save(draft).await.map_err(persistence_error)?;
        info!(
            event_name = "catalog.product.created",
            product_id = product.id.0,
            name = %product.name,
            "product created"
        );
        Ok(CatalogOutcome::to_list())
    }

    pub async fn edit_product_form(&self, id: ProductId) -> Result<CatalogOutcome, ApplicationError> {
        match self.products.find_by_id(id).await.map_err(persistence_error)? {
            Some(product) => Ok(CatalogOutcome::EditProductForm {
                form: ProductForm::from(&product),
                errors: FieldErrors::default(),
            }),
            None => {
                warn!(
                    event_name = "catalog.product.edit_missing",
                    product_id = id.0,
                    "edit requested for unknown product, redirecting to list"
                );
                Ok(CatalogOutcome::to_list())
            }
        }
    }

    pub async fn update_product(&self, form: ProductForm) -> Result<CatalogOutcome, ApplicationError> {
        let draft = match form.to_existing_draft() {
            Ok(draft) => draft,
            Err(errors) => {
                info!(
                    event_name = "catalog.product.rejected",
                    fields = %errors,
                    "product update failed validation"
                );
                return Ok(CatalogOutcome::EditProductForm { form, errors });
            }
        };

        match self.products.save(draft).await {
            Ok(product) => {
                info!(
                    event_name = "catalog.product.updated",
                    product_id = product.id.0,
                    name = %product.name,
                    "product updated"
                );
                Ok(CatalogOutcome::to_list())
            }
            Err(RepositoryError::NotFound(id)) => {
                warn!(
                    event_name = "catalog.product.update_missing",
                    product_id = id.0,
                    "update targeted unknown product, redirecting to list"
                );
                Ok(CatalogOutcome::to_list())
            }
            Err(error) => Err(persistence_error(error)),
        }
    }

    pub async fn delete(&self, id: ProductId) -> Result<CatalogOutcome, ApplicationError> {
        self.products.delete_by_id(id).await.map_err(persistence_error)?;
        info!(event_name = "catalog.product.deleted", product_id = id.0, "product deleted");
        Ok(CatalogOutcome::to_list())
    }
}
