//! Order Model
//!
//! Orders embed their line-item snapshots and shipping address, copied at
//! creation time so later product or account edits do not rewrite history.
//! Orders are never deleted; cancellation is a status value.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::serde_helpers;

/// Order ID type
pub type OrderId = RecordId;

// =============================================================================
// Enums
// =============================================================================

/// Order lifecycle status
///
/// Legal transitions are enforced by [`OrderStatus::can_transition_to`]:
/// pending → confirmed → processing → shipped → delivered, with
/// cancellation possible from pending/confirmed only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Transition table for the order lifecycle
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Processing)
                | (Confirmed, Cancelled)
                | (Processing, Shipped)
                | (Shipped, Delivered)
        )
    }

    /// Whether an order in this status may still be cancelled
    pub fn is_cancellable(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Accepted payment methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Razorpay,
    Cod,
    Upi,
}

// =============================================================================
// Embedded documents
// =============================================================================

/// Line item snapshot (name/price/image captured from the catalog at
/// creation time)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub image: String,
}

/// Shipping address embedded in the order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1, message = "Recipient name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Street is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Pincode is required"))]
    pub pincode: String,
}

// =============================================================================
// Order (主表)
// =============================================================================

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<OrderId>,
    pub order_number: String,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Gateway correlation fields, set only after successful verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_signature: Option<String>,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping: f64,
    pub discount: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

// =============================================================================
// API Request Types
// =============================================================================

/// Line item as submitted at checkout. Only product id and quantity are
/// trusted; the snapshot fields are re-read from the catalog.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderItemInput {
    pub product: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Create order payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderCreate {
    #[validate(length(min = 1, message = "Order must contain at least one item"), nested)]
    pub items: Vec<OrderItemInput>,
    #[validate(nested)]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[validate(range(min = 0.0, message = "Subtotal cannot be negative"))]
    pub subtotal: f64,
    #[validate(range(min = 0.0, message = "Tax cannot be negative"))]
    #[serde(default)]
    pub tax: f64,
    #[validate(range(min = 0.0, message = "Shipping cannot be negative"))]
    #[serde(default)]
    pub shipping: f64,
    #[validate(range(min = 0.0, message = "Discount cannot be negative"))]
    #[serde(default)]
    pub discount: f64,
    #[validate(range(min = 0.0, message = "Total cannot be negative"))]
    pub total: f64,
}

/// Create payment intent payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: f64,
    pub order_number: String,
}

/// Verify payment payload
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_number: String,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Admin status update payload
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));

        // Illegal edges
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Delivered.can_transition_to(Pending));
        // No self-loops
        assert!(!Confirmed.can_transition_to(Confirmed));
    }

    #[test]
    fn test_cancellable_statuses() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Shipped).unwrap(),
            "\"shipped\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cod).unwrap(),
            "\"cod\""
        );
    }
}
