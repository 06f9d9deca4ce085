pub mod config;
pub mod domain;
pub mod errors;

pub use domain::principal::{Principal, Role};
pub use domain::product::{FieldErrors, Product, ProductDraft, ProductForm, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
