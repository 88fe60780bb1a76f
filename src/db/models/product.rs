//! Product Model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::serde_helpers;

/// Product ID type
pub type ProductId = RecordId;

/// Product category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Ro,
    Uv,
    Uf,
    Gravity,
    Commercial,
    Accessories,
}

/// Catalog product. `rating` and `review_count` are derived from approved
/// reviews and must only be written through the review repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<ProductId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub category: ProductCategory,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Product slug is required"))]
    pub slug: String,
    #[validate(length(min = 1, message = "Product description is required"))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[validate(range(min = 0.0, message = "Original price cannot be negative"))]
    pub original_price: Option<f64>,
    pub category: ProductCategory,
    pub images: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub specifications: Option<BTreeMap<String, String>>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
}

/// Update product payload (partial)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Original price cannot be negative"))]
    pub original_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Catalog listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort: Option<String>,
}
