//! Order Workflow
//!
//! Orchestrates the four order-affecting operations as single-request
//! transactions: create (totals check, stock reservation, notification
//! dispatch), payment intent creation, payment verification, status
//! update and cancellation. There is no cross-request saga; what a request
//! has applied before failing stays applied, except stock reservations,
//! which are compensated within the same request.

use std::sync::Arc;

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::db::models::{
    CreatePaymentRequest, Order, OrderCreate, OrderItem, OrderStatus, OrderStatusUpdate,
    PaymentStatus, Product, VerifyPaymentRequest,
};
use crate::db::repository::{OrderRepository, ProductRepository};
use crate::services::{EmailService, GatewayOrder, PaymentGateway, SmsService};
use crate::utils::{AppError, AppResult};

/// Divergence allowed between client-computed and catalog-computed amounts
const AMOUNT_TOLERANCE: f64 = 0.01;

/// Generate an order number: "ORD" + epoch millis + 5 random alphanumeric
/// characters, uppercased. Uniqueness is backstopped by the index on
/// `order_number`.
pub fn generate_order_number() -> String {
    use rand::{Rng, distributions::Alphanumeric};

    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(char::from)
        .collect();
    format!("ORD{}{}", millis, suffix.to_uppercase())
}

/// Check the client's arithmetic against the catalog: the subtotal must
/// match the authoritative prices, and the total must equal
/// subtotal + tax + shipping - discount, both within [`AMOUNT_TOLERANCE`].
fn verify_totals(lines: &[(Product, i32)], input: &OrderCreate) -> AppResult<()> {
    let subtotal: f64 = lines
        .iter()
        .map(|(product, quantity)| product.price * f64::from(*quantity))
        .sum();
    if (subtotal - input.subtotal).abs() > AMOUNT_TOLERANCE {
        return Err(AppError::validation(format!(
            "Order subtotal does not match catalog prices (expected {:.2})",
            subtotal
        )));
    }

    let expected_total = input.subtotal + input.tax + input.shipping - input.discount;
    if (expected_total - input.total).abs() > AMOUNT_TOLERANCE {
        return Err(AppError::validation(format!(
            "Order total does not add up (expected {:.2})",
            expected_total
        )));
    }

    Ok(())
}

/// Order workflow controller.
///
/// Service clients are injected at construction so tests can substitute
/// unconfigured instances.
#[derive(Clone)]
pub struct OrderWorkflow {
    orders: OrderRepository,
    products: ProductRepository,
    payment: Arc<PaymentGateway>,
    email: Arc<EmailService>,
    sms: Arc<SmsService>,
}

impl OrderWorkflow {
    pub fn new(
        db: Surreal<Db>,
        payment: Arc<PaymentGateway>,
        email: Arc<EmailService>,
        sms: Arc<SmsService>,
    ) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            products: ProductRepository::new(db),
            payment,
            email,
            sms,
        }
    }

    /// Create an order: resolve and snapshot the line items from the
    /// catalog, check the client's totals, reserve stock atomically per
    /// product, persist the order as pending/pending, then dispatch
    /// notifications without waiting for them.
    pub async fn create_order(&self, user: &CurrentUser, input: OrderCreate) -> AppResult<Order> {
        input.validate()?;

        // Resolve every product first, failing fast on the first problem
        // before any stock is touched
        let mut lines: Vec<(Product, i32)> = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let product = self
                .products
                .find_by_id(&item.product)
                .await
                .map_err(AppError::from)?
                .filter(|p| p.is_active)
                .ok_or_else(|| {
                    AppError::not_found(format!("Product {} not found", item.product))
                })?;

            if product.stock < item.quantity {
                return Err(AppError::validation(format!(
                    "Insufficient stock for {}. Available: {}",
                    product.name, product.stock
                )));
            }

            lines.push((product, item.quantity));
        }

        verify_totals(&lines, &input)?;

        // Reserve stock with a conditional decrement per product. The
        // pre-check above gives the friendly error message; this guard is
        // what actually prevents concurrent overdraw. A mid-order failure
        // releases whatever was already reserved.
        let mut reserved: Vec<(RecordId, i32)> = Vec::with_capacity(lines.len());
        for (product, quantity) in &lines {
            let product_id = product
                .id
                .clone()
                .ok_or_else(|| AppError::internal("Product record has no id"))?;

            match self.products.reserve_stock(&product_id, *quantity).await {
                Ok(true) => reserved.push((product_id, *quantity)),
                Ok(false) => {
                    self.release_reserved(&reserved).await;
                    return Err(AppError::validation(format!(
                        "Insufficient stock for {}",
                        product.name
                    )));
                }
                Err(e) => {
                    self.release_reserved(&reserved).await;
                    return Err(e.into());
                }
            }
        }

        // reserved runs parallel to lines, so the ids are already resolved
        let items: Vec<OrderItem> = reserved
            .iter()
            .zip(lines.iter())
            .map(|((product_id, quantity), (product, _))| OrderItem {
                product: product_id.clone(),
                name: product.name.clone(),
                price: product.price,
                quantity: *quantity,
                image: product.images.first().cloned().unwrap_or_default(),
            })
            .collect();

        let order_number = generate_order_number();
        let order = Order {
            id: None,
            order_number: order_number.clone(),
            user: user
                .id
                .parse()
                .map_err(|_| AppError::internal("Invalid user id in token"))?,
            items,
            shipping_address: input.shipping_address,
            payment_method: input.payment_method,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            razorpay_order_id: None,
            razorpay_signature: None,
            subtotal: input.subtotal,
            tax: input.tax,
            shipping: input.shipping,
            discount: input.discount,
            total: input.total,
            status: OrderStatus::Pending,
            tracking_number: None,
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            updated_at: None,
        };

        let order = match self.orders.create(order).await {
            Ok(order) => order,
            Err(e) => {
                self.release_reserved(&reserved).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            order_number = %order.order_number,
            user_id = %user.id,
            total = order.total,
            "Order created"
        );

        // Fire-and-forget notifications: failures are logged, never surfaced
        let email = self.email.clone();
        let email_order = order.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_order_confirmation(&email_order).await {
                tracing::error!(
                    order_number = %email_order.order_number,
                    error = %e,
                    "Order confirmation email failed"
                );
            }
        });
        let sms = self.sms.clone();
        let sms_order = order.clone();
        tokio::spawn(async move {
            if let Err(e) = sms.send_order_confirmation(&sms_order).await {
                tracing::error!(
                    order_number = %sms_order.order_number,
                    error = %e,
                    "Order confirmation SMS failed"
                );
            }
        });

        Ok(order)
    }

    /// Create a hosted gateway order for an existing local order. Pure
    /// pass-through; no local state changes.
    pub async fn create_payment(&self, req: CreatePaymentRequest) -> AppResult<GatewayOrder> {
        if req.amount <= 0.0 || req.order_number.is_empty() {
            return Err(AppError::validation(
                "Amount and order number are required",
            ));
        }

        let gateway_order = self
            .payment
            .create_order(req.amount, &req.order_number)
            .await?;
        Ok(gateway_order)
    }

    /// Verify a gateway payment signature and, on success, mark the order
    /// paid and confirmed. A bad signature leaves the order untouched.
    pub async fn verify_payment(&self, req: VerifyPaymentRequest) -> AppResult<Order> {
        let valid = self.payment.verify_signature(
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.razorpay_signature,
        );
        if !valid {
            tracing::warn!(
                order_number = %req.order_number,
                "Payment signature verification failed"
            );
            return Err(AppError::validation("Invalid payment signature"));
        }

        let order = self
            .orders
            .mark_paid(
                &req.order_number,
                &req.razorpay_payment_id,
                &req.razorpay_order_id,
                &req.razorpay_signature,
            )
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found("Order not found"))?;

        tracing::info!(
            order_number = %order.order_number,
            payment_id = %req.razorpay_payment_id,
            "Payment verified"
        );

        Ok(order)
    }

    /// Admin status update, guarded by the lifecycle transition table.
    /// A `cancelled` target goes through the cancellation path so stock
    /// restoration cannot be bypassed.
    pub async fn update_status(&self, id: &str, update: OrderStatusUpdate) -> AppResult<Order> {
        let order = self
            .orders
            .find_by_id(id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found("Order not found"))?;

        if update.status == OrderStatus::Cancelled {
            return self.cancel_order(order).await;
        }

        if !order.status.can_transition_to(update.status) {
            return Err(AppError::business_rule(format!(
                "Cannot move order from {} to {}",
                order.status.as_str(),
                update.status.as_str()
            )));
        }

        let updated = self
            .orders
            .update_status(id, update.status, update.tracking_number, update.notes)
            .await
            .map_err(AppError::from)?;

        tracing::info!(
            order_number = %updated.order_number,
            status = updated.status.as_str(),
            "Order status updated"
        );

        self.spawn_status_notifications(&updated, update.status);
        Ok(updated)
    }

    /// Cancel an order on behalf of its owner or an admin
    pub async fn cancel(&self, id: &str, actor: &CurrentUser) -> AppResult<Order> {
        let order = self
            .orders
            .find_by_id(id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found("Order not found"))?;

        if order.user.to_string() != actor.id && !actor.is_admin() {
            return Err(AppError::forbidden("Access denied"));
        }

        self.cancel_order(order).await
    }

    /// Shared cancellation path: guard the transition, flip the status,
    /// restore every reserved line quantity.
    async fn cancel_order(&self, order: Order) -> AppResult<Order> {
        if !order.status.is_cancellable() {
            return Err(AppError::business_rule(
                "Order cannot be cancelled at this stage",
            ));
        }

        let id = order
            .id
            .as_ref()
            .map(|id| id.to_string())
            .ok_or_else(|| AppError::internal("Order record has no id"))?;

        let updated = self
            .orders
            .update_status(&id, OrderStatus::Cancelled, None, None)
            .await
            .map_err(AppError::from)?;

        for item in &updated.items {
            self.products
                .release_stock(&item.product, item.quantity)
                .await
                .map_err(AppError::from)?;
        }

        tracing::info!(order_number = %updated.order_number, "Order cancelled");

        self.spawn_status_notifications(&updated, OrderStatus::Cancelled);
        Ok(updated)
    }

    fn spawn_status_notifications(&self, order: &Order, status: OrderStatus) {
        let email = self.email.clone();
        let email_order = order.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_order_status(&email_order, status).await {
                tracing::error!(
                    order_number = %email_order.order_number,
                    error = %e,
                    "Order status email failed"
                );
            }
        });
        let sms = self.sms.clone();
        let sms_order = order.clone();
        tokio::spawn(async move {
            if let Err(e) = sms.send_order_status(&sms_order, status).await {
                tracing::error!(
                    order_number = %sms_order.order_number,
                    error = %e,
                    "Order status SMS failed"
                );
            }
        });
    }

    async fn release_reserved(&self, reserved: &[(RecordId, i32)]) {
        for (product, quantity) in reserved {
            if let Err(e) = self.products.release_stock(product, *quantity).await {
                tracing::error!(
                    product = %product,
                    quantity = *quantity,
                    error = %e,
                    "Failed to release reserved stock"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{OrderItemInput, PaymentMethod, ProductCategory, ShippingAddress};

    fn product(name: &str, price: f64) -> Product {
        Product {
            id: Some(surrealdb::RecordId::from_table_key("product", "p1")),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: "test".to_string(),
            price,
            original_price: None,
            category: ProductCategory::Ro,
            images: vec![],
            features: vec![],
            specifications: Default::default(),
            stock: 10,
            rating: 0.0,
            review_count: 0,
            is_active: true,
            created_at: None,
        }
    }

    fn order_input(subtotal: f64, tax: f64, shipping: f64, discount: f64, total: f64) -> OrderCreate {
        OrderCreate {
            items: vec![OrderItemInput {
                product: "product:p1".to_string(),
                quantity: 2,
            }],
            shipping_address: ShippingAddress {
                name: "Asha".to_string(),
                phone: "9876543210".to_string(),
                email: "asha@example.com".to_string(),
                street: "12 Lake Rd".to_string(),
                city: "Pune".to_string(),
                state: "MH".to_string(),
                pincode: "411001".to_string(),
            },
            payment_method: PaymentMethod::Razorpay,
            subtotal,
            tax,
            shipping,
            discount,
            total,
        }
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        assert!(number.starts_with("ORD"));
        assert_eq!(number, number.to_uppercase());
        // "ORD" + 13-digit millis + 5-char suffix
        assert_eq!(number.len(), 21);
    }

    #[test]
    fn test_verify_totals_accepts_matching_amounts() {
        let lines = vec![(product("RO Classic", 4999.0), 2)];
        let input = order_input(9998.0, 500.0, 49.0, 100.0, 10447.0);
        assert!(verify_totals(&lines, &input).is_ok());
    }

    #[test]
    fn test_verify_totals_rejects_wrong_subtotal() {
        let lines = vec![(product("RO Classic", 4999.0), 2)];
        // Client claims a cheaper subtotal than the catalog allows
        let input = order_input(5000.0, 0.0, 0.0, 0.0, 5000.0);
        assert!(verify_totals(&lines, &input).is_err());
    }

    #[test]
    fn test_verify_totals_rejects_bad_arithmetic() {
        let lines = vec![(product("RO Classic", 4999.0), 2)];
        // Subtotal is right but the grand total ignores the tax
        let input = order_input(9998.0, 500.0, 0.0, 0.0, 9998.0);
        assert!(verify_totals(&lines, &input).is_err());
    }

    #[test]
    fn test_verify_totals_tolerates_rounding() {
        let lines = vec![(product("Sediment Filter", 333.33), 3)];
        let input = order_input(999.99, 0.0, 0.0, 0.0, 999.99);
        assert!(verify_totals(&lines, &input).is_ok());
    }
}
