pub mod principal;
pub mod product;
