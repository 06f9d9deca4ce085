//! Tera rendering for the catalog pages.

use std::collections::BTreeMap;
use std::sync::Arc;

use catalog_core::domain::principal::Principal;
use catalog_core::domain::product::{FieldErrors, Product, ProductForm};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::warn;

const FORM_FIELDS: &[&str] = &["id", "name", "description", "price", "quantity"];

const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../../templates/catalog/layout.html")),
    ("products.html", include_str!("../../../templates/catalog/products.html")),
    ("product-fields.html", include_str!("../../../templates/catalog/product-fields.html")),
    ("new-product.html", include_str!("../../../templates/catalog/new-product.html")),
    ("edit-product.html", include_str!("../../../templates/catalog/edit-product.html")),
    ("login.html", include_str!("../../../templates/catalog/login.html")),
    ("not-authorized.html", include_str!("../../../templates/catalog/not-authorized.html")),
    ("error.html", include_str!("../../../templates/catalog/error.html")),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: String,
    quantity: i64,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.0,
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: format_price(product.price),
            quantity: product.quantity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct FormView {
    id: String,
    name: String,
    description: String,
    price: String,
    quantity: String,
}

impl From<&ProductForm> for FormView {
    fn from(form: &ProductForm) -> Self {
        Self {
            id: form.id.clone().unwrap_or_default(),
            name: form.name.clone(),
            description: form.description.clone(),
            price: form.price.clone(),
            quantity: form.quantity.clone(),
        }
    }
}

fn format_price(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Every form field is present so templates can loop without existence checks.
fn error_map(errors: &FieldErrors) -> BTreeMap<&'static str, Vec<String>> {
    FORM_FIELDS.iter().map(|field| (*field, errors.messages(field).to_vec())).collect()
}

#[derive(Clone)]
pub struct Views {
    tera: Arc<Tera>,
    auth_enabled: bool,
}

impl Views {
    /// Loads `templates/catalog/` from the working directory, falling back to
    /// the templates compiled into the binary.
    pub fn load(auth_enabled: bool) -> Result<Self, tera::Error> {
        match Tera::new("templates/catalog/**/*.html") {
            Ok(tera) if has_all_templates(&tera) => {
                Ok(Self { tera: Arc::new(tera), auth_enabled })
            }
            Ok(_) => Self::embedded(auth_enabled),
            Err(error) => {
                warn!(
                    event_name = "system.templates.fallback",
                    correlation_id = "bootstrap",
                    error = %error,
                    "failed to load catalog templates from filesystem, using embedded copies"
                );
                Self::embedded(auth_enabled)
            }
        }
    }

    pub fn embedded(auth_enabled: bool) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(EMBEDDED_TEMPLATES.iter().copied())?;
        Ok(Self { tera: Arc::new(tera), auth_enabled })
    }

    fn context(&self, user: Option<&Principal>) -> Context {
        let mut context = Context::new();
        context.insert("auth_enabled", &self.auth_enabled);
        context.insert("username", &user.map(|p| p.username.as_str()).unwrap_or_default());
        context.insert("is_admin", &user.is_some_and(Principal::is_admin));
        context
    }

    pub fn products(
        &self,
        user: Option<&Principal>,
        products: &[Product],
        keyword: Option<&str>,
    ) -> Result<String, tera::Error> {
        let mut context = self.context(user);
        let rows = products.iter().map(ProductRow::from).collect::<Vec<_>>();
        context.insert("products", &rows);
        context.insert("keyword", &keyword.unwrap_or_default());
        context.insert("searched", &keyword.is_some());
        self.tera.render("products.html", &context)
    }

    pub fn new_product(
        &self,
        user: Option<&Principal>,
        form: &ProductForm,
        errors: &FieldErrors,
    ) -> Result<String, tera::Error> {
        self.product_form("new-product.html", user, form, errors)
    }

    pub fn edit_product(
        &self,
        user: Option<&Principal>,
        form: &ProductForm,
        errors: &FieldErrors,
    ) -> Result<String, tera::Error> {
        self.product_form("edit-product.html", user, form, errors)
    }

    fn product_form(
        &self,
        template: &str,
        user: Option<&Principal>,
        form: &ProductForm,
        errors: &FieldErrors,
    ) -> Result<String, tera::Error> {
        let mut context = self.context(user);
        context.insert("form", &FormView::from(form));
        context.insert("errors", &error_map(errors));
        self.tera.render(template, &context)
    }

    pub fn login(
        &self,
        attempted_username: &str,
        error: Option<&str>,
        message: Option<&str>,
    ) -> Result<String, tera::Error> {
        let mut context = self.context(None);
        context.insert("attempted_username", attempted_username);
        context.insert("error", &error.unwrap_or_default());
        context.insert("message", &message.unwrap_or_default());
        self.tera.render("login.html", &context)
    }

    pub fn not_authorized(&self, user: Option<&Principal>) -> Result<String, tera::Error> {
        self.tera.render("not-authorized.html", &self.context(user))
    }

    pub fn error(&self, message: &str, correlation_id: &str) -> Result<String, tera::Error> {
        let mut context = self.context(None);
        context.insert("message", message);
        context.insert("correlation_id", correlation_id);
        self.tera.render("error.html", &context)
    }
}

fn has_all_templates(tera: &Tera) -> bool {
    let loaded = tera.get_template_names().collect::<Vec<_>>();
    EMBEDDED_TEMPLATES.iter().all(|(name, _)| loaded.contains(name))
}
