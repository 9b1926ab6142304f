use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    /// Fresh globally-unique token for a newly stored product.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A stored catalog entry. The identifier is owned by the catalog store and
/// never changes after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(flatten)]
    pub attributes: ProductAttributes,
}

/// Every product field except the identifier. Updates replace this whole
/// record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub name: String,
    pub category: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub storage_options: Vec<StorageOption>,
    #[serde(default)]
    pub images: ProductImages,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageOption {
    pub capacity: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImages {
    pub front: Option<String>,
    pub back: Option<String>,
    pub side: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specifications {
    pub screen_size: Option<String>,
    pub cpu: Option<String>,
    #[serde(default)]
    pub camera: CameraSpecifications,
    pub battery: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSpecifications {
    pub rear: Option<String>,
    pub front: Option<String>,
}

/// Wire shape accepted by create and update. The `id` is optional so the
/// boundary can decide what to do with a caller-supplied one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    #[serde(flatten)]
    pub attributes: ProductAttributes,
}

impl ProductPayload {
    /// Attributes for a new product. Identifiers are assigned by the store
    /// only, so a payload carrying one is refused.
    pub fn into_new_product(self) -> Result<ProductAttributes, DomainError> {
        if let Some(id) = self.id {
            return Err(DomainError::CallerSuppliedIdentifier(id));
        }
        self.attributes.normalized()
    }

    /// Attributes for replacing an existing product. Any `id` in the body is
    /// dropped; the target record keeps its own.
    pub fn into_replacement(self) -> Result<ProductAttributes, DomainError> {
        self.attributes.normalized()
    }
}

impl ProductAttributes {
    pub fn normalized(mut self) -> Result<Self, DomainError> {
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        require_text("brand", &self.brand)?;

        if self.price.is_sign_negative() {
            return Err(invalid("price", "must not be negative"));
        }
        for option in &self.storage_options {
            require_text("storage_options.capacity", &option.capacity)?;
            if option.price.is_sign_negative() {
                return Err(invalid("storage_options.price", "must not be negative"));
            }
        }

        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(invalid("currency", "must be a three-letter code"));
        }
        self.currency = currency.to_ascii_uppercase();

        let mut colors: Vec<String> = Vec::with_capacity(self.colors.len());
        for color in self.colors.drain(..) {
            let color = color.trim().to_string();
            if !color.is_empty() && !colors.contains(&color) {
                colors.push(color);
            }
        }
        self.colors = colors;

        Ok(self)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be blank"));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> DomainError {
    DomainError::InvalidField { field: field.to_string(), reason: reason.to_string() }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_in_stock() -> bool {
    true
}
