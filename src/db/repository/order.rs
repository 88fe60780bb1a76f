//! Order Repository
//!
//! The table is named "orders"; the bare word "order" collides with
//! SurrealQL's ORDER keyword.

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, CountRow, RepoError, RepoResult, now_rfc3339, parse_record_id};
use crate::db::models::{Order, OrderStatus};
use crate::utils::PageQuery;

const ORDER_TABLE: &str = "orders";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a fully-built order
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let record = parse_record_id(ORDER_TABLE, id);
        let order: Option<Order> = self.base.db().select(record).await?;
        Ok(order)
    }

    /// Find order by its order number
    pub async fn find_by_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE order_number = $order_number LIMIT 1")
            .bind(("order_number", order_number.to_string()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// All orders of one user, newest first
    ///
    /// Record references are stored in their "table:id" string form, so
    /// filters bind strings as well.
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user.to_string()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders)
    }

    /// Admin listing with optional status filter, newest first
    pub async fn find_all(
        &self,
        status: Option<OrderStatus>,
        page: &PageQuery,
    ) -> RepoResult<(Vec<Order>, i64)> {
        let (list_sql, count_sql) = if status.is_some() {
            (
                "SELECT * FROM orders WHERE status = $status ORDER BY created_at DESC LIMIT $limit START $offset",
                "SELECT count() FROM orders WHERE status = $status GROUP ALL",
            )
        } else {
            (
                "SELECT * FROM orders ORDER BY created_at DESC LIMIT $limit START $offset",
                "SELECT count() FROM orders GROUP ALL",
            )
        };

        let mut query = self
            .base
            .db()
            .query(list_sql)
            .query(count_sql)
            .bind(("limit", page.limit))
            .bind(("offset", page.offset()));
        if let Some(status) = status {
            query = query.bind(("status", status));
        }

        let mut result = query.await?;
        let orders: Vec<Order> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);

        Ok((orders, total))
    }

    /// Record a verified payment: correlation ids, payment completed,
    /// order confirmed. Keyed by order number.
    pub async fn mark_paid(
        &self,
        order_number: &str,
        payment_id: &str,
        razorpay_order_id: &str,
        razorpay_signature: &str,
    ) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE orders SET \
                    payment_status = 'completed', \
                    status = 'confirmed', \
                    payment_id = $payment_id, \
                    razorpay_order_id = $razorpay_order_id, \
                    razorpay_signature = $razorpay_signature, \
                    updated_at = $updated_at \
                 WHERE order_number = $order_number RETURN AFTER",
            )
            .bind(("order_number", order_number.to_string()))
            .bind(("payment_id", payment_id.to_string()))
            .bind(("razorpay_order_id", razorpay_order_id.to_string()))
            .bind(("razorpay_signature", razorpay_signature.to_string()))
            .bind(("updated_at", now_rfc3339()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Write a new status, with optional tracking number and notes.
    /// Transition legality is the workflow's concern, not this layer's.
    pub async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
        tracking_number: Option<String>,
        notes: Option<String>,
    ) -> RepoResult<Order> {
        let record = parse_record_id(ORDER_TABLE, id);

        let mut set_parts = vec!["status = $status", "updated_at = $updated_at"];
        if tracking_number.is_some() {
            set_parts.push("tracking_number = $tracking_number");
        }
        if notes.is_some() {
            set_parts.push("notes = $notes");
        }

        let sql = format!("UPDATE $record SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self
            .base
            .db()
            .query(sql)
            .bind(("record", record))
            .bind(("status", status))
            .bind(("updated_at", now_rfc3339()));
        if let Some(v) = tracking_number {
            query = query.bind(("tracking_number", v));
        }
        if let Some(v) = notes {
            query = query.bind(("notes", v));
        }

        let mut result = query.await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Whether the user has an order containing the product that reached
    /// confirmed or delivered status (verified-purchase check)
    pub async fn user_has_purchased(
        &self,
        user: &RecordId,
        product: &RecordId,
    ) -> RepoResult<bool> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() FROM orders \
                 WHERE user = $user \
                   AND status IN ['confirmed', 'delivered'] \
                   AND items.product CONTAINS $product \
                 GROUP ALL",
            )
            .bind(("user", user.to_string()))
            .bind(("product", product.to_string()))
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.count > 0).unwrap_or(false))
    }
}
