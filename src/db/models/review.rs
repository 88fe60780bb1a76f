//! Review Model
//!
//! One review per (product, user) pair, enforced by a unique index.
//! Reviews enter moderation as `pending`; only `approved` reviews are
//! public and feed the product rating aggregate.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::serde_helpers;

/// Review ID type
pub type ReviewId = RecordId;

/// Moderation status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// Product review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<ReviewId>,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// True iff an order by this user containing this product reached
    /// confirmed/delivered status at review time
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub helpful: i32,
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Create review payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewCreate {
    pub product: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 1000, message = "Comment must be 1-1000 characters"))]
    pub comment: String,
    pub images: Option<Vec<String>>,
}

/// Update review payload (owner edit; resets moderation to pending)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewUpdate {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "Comment must be 1-1000 characters"))]
    pub comment: Option<String>,
    pub images: Option<Vec<String>>,
}
