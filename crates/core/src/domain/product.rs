use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i64,
}

/// A validated product ready to be written. `id` is unset for a create.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProductDraft {
    pub id: Option<ProductId>,
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: i64,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, price: f64, quantity: i64) -> Self {
        Self { id: None, name: name.into(), description: None, price, quantity }
    }

    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches the store-assigned id.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

impl From<Product> for ProductDraft {
    fn from(product: Product) -> Self {
        Self {
            id: Some(product.id),
            name: product.name,
            description: product.description,
            price: product.price,
            quantity: product.quantity,
        }
    }
}

/// Field name to messages, in field order for stable rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(report: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::default();
        for (field, failures) in report.field_errors() {
            for failure in failures.iter() {
                let message = failure
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid ({})", failure.code));
                errors.add(field.to_string(), message);
            }
        }
        errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join("; ")))
            .collect::<Vec<_>>();
        write!(f, "{}", rendered.join(", "))
    }
}

/// Raw product fields as submitted by the create and edit forms.
///
/// Every field is text so that a malformed number is reported next to the
/// field instead of rejecting the whole request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub quantity: String,
}

impl ProductForm {
    /// Parses and validates the form. A present but empty `id` counts as unset.
    pub fn to_draft(&self) -> Result<ProductDraft, FieldErrors> {
        let mut errors = FieldErrors::default();

        let id = match self.id.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) => Some(ProductId(value)),
                Err(_) => {
                    errors.add("id", "id must be a whole number");
                    None
                }
            },
        };

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.add("name", "name must not be empty");
        }

        let description = Some(self.description.trim().to_string()).filter(|text| !text.is_empty());

        let price = match self.price.trim() {
            "" => {
                errors.add("price", "price is required");
                0.0
            }
            raw => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    errors.add("price", "price must be a number");
                    0.0
                }
            },
        };

        let quantity = match self.quantity.trim() {
            "" => 0,
            raw => raw.parse::<i64>().unwrap_or_else(|_| {
                errors.add("quantity", "quantity must be a whole number");
                0
            }),
        };

        let draft = ProductDraft { id, name, description, price, quantity };
        if let Err(report) = draft.validate() {
            for (field, messages) in FieldErrors::from(report).0 {
                // an empty name already carries a clearer message
                if field == "name" && errors.contains("name") {
                    continue;
                }
                for message in messages {
                    errors.add(field.clone(), message);
                }
            }
        }

        if errors.is_empty() {
            Ok(draft)
        } else {
            Err(errors)
        }
    }

    /// Like [`ProductForm::to_draft`] but an id is mandatory.
    pub fn to_existing_draft(&self) -> Result<ProductDraft, FieldErrors> {
        let missing_id = self.id.as_deref().map(str::trim).unwrap_or_default().is_empty();
        match self.to_draft() {
            Ok(_) if missing_id => {
                let mut errors = FieldErrors::default();
                errors.add("id", "id is required");
                Err(errors)
            }
            Ok(draft) => Ok(draft),
            Err(mut errors) => {
                if missing_id {
                    errors.add("id", "id is required");
                }
                Err(errors)
            }
        }
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            id: Some(product.id.to_string()),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            quantity: product.quantity.to_string(),
        }
    }
}
