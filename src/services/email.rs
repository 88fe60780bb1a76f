//! Transactional Email (SendGrid)
//!
//! Best-effort notification channel: missing credentials make every send a
//! silent no-op, and send failures are logged by the caller and forgotten.
//! The system must function without a configured provider.

use serde_json::json;

use crate::db::models::{Order, OrderStatus};

/// Email provider configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub from_email: String,
    pub frontend_url: String,
    pub api_base: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("SENDGRID_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            from_email: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@purestore.in".to_string()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_base: std::env::var("SENDGRID_API_BASE")
                .unwrap_or_else(|_| "https://api.sendgrid.com".to_string()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            api_key: None,
            from_email: "noreply@purestore.in".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            api_base: "https://api.sendgrid.com".to_string(),
        }
    }
}

/// Transactional email sender
#[derive(Clone)]
pub struct EmailService {
    client: reqwest::Client,
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Order confirmation mail, sent right after checkout
    pub async fn send_order_confirmation(&self, order: &Order) -> anyhow::Result<()> {
        let to = &order.shipping_address.email;

        let items_rows: String = order
            .items
            .iter()
            .map(|item| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>₹{:.2}</td></tr>",
                    item.name, item.quantity, item.price
                )
            })
            .collect();

        let html = format!(
            "<h1>Thank you for your order!</h1>\
             <p>Dear {name},</p>\
             <p>Your order <strong>{number}</strong> has been placed and is being processed.</p>\
             <table><tr><th>Product</th><th>Qty</th><th>Price</th></tr>{items}</table>\
             <p>Subtotal: ₹{subtotal:.2}<br>Tax: ₹{tax:.2}<br>Shipping: ₹{shipping:.2}<br>\
             Discount: -₹{discount:.2}<br><strong>Total: ₹{total:.2}</strong></p>\
             <p>Track your order: <a href=\"{url}/track-order?order={number}\">click here</a></p>",
            name = order.shipping_address.name,
            number = order.order_number,
            items = items_rows,
            subtotal = order.subtotal,
            tax = order.tax,
            shipping = order.shipping,
            discount = order.discount,
            total = order.total,
            url = self.config.frontend_url,
        );

        self.send(
            to,
            &format!("Order Confirmation - {}", order.order_number),
            &html,
        )
        .await
    }

    /// Status-change mail (confirmed/processing/shipped/delivered/cancelled)
    pub async fn send_order_status(&self, order: &Order, status: OrderStatus) -> anyhow::Result<()> {
        let message = match status {
            OrderStatus::Confirmed => {
                "Your order has been confirmed and is being prepared.".to_string()
            }
            OrderStatus::Processing => "Your order is being processed.".to_string(),
            OrderStatus::Shipped => format!(
                "Your order has been shipped! Tracking number: {}",
                order.tracking_number.as_deref().unwrap_or("N/A")
            ),
            OrderStatus::Delivered => {
                "Your order has been delivered. Thank you for shopping with us!".to_string()
            }
            OrderStatus::Cancelled => "Your order has been cancelled.".to_string(),
            OrderStatus::Pending => "Your order status has been updated.".to_string(),
        };

        let html = format!(
            "<h1>Order Status Update</h1>\
             <p>Order Number: <strong>{number}</strong></p>\
             <p>Status: <strong>{status}</strong></p>\
             <p>{message}</p>\
             <p>Track your order: <a href=\"{url}/track-order?order={number}\">click here</a></p>",
            number = order.order_number,
            status = status.as_str().to_uppercase(),
            message = message,
            url = self.config.frontend_url,
        );

        self.send(
            &order.shipping_address.email,
            &format!("Order Update - {}", order.order_number),
            &html,
        )
        .await
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            tracing::debug!(to = %to, subject = %subject, "Email skipped: provider not configured");
            return Ok(());
        };

        let body = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.config.from_email },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }],
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.config.api_base))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("email provider returned {}", response.status());
        }

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}
