//! Transactional SMS (Twilio)
//!
//! Same best-effort contract as email: missing credentials mean a silent
//! no-op, failures are logged by the caller and never retried.

use crate::db::models::{Order, OrderStatus};

/// SMS provider configuration
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub frontend_url: String,
    pub api_base: String,
}

impl SmsConfig {
    pub fn from_env() -> Self {
        Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID")
                .ok()
                .filter(|v| !v.is_empty()),
            auth_token: std::env::var("TWILIO_AUTH_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            from_number: std::env::var("TWILIO_PHONE_NUMBER")
                .ok()
                .filter(|v| !v.is_empty()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_base: std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            frontend_url: "http://localhost:5173".to_string(),
            api_base: "https://api.twilio.com".to_string(),
        }
    }
}

/// Transactional SMS sender
#[derive(Clone)]
pub struct SmsService {
    client: reqwest::Client,
    config: SmsConfig,
}

/// Default to an Indian country code when the number carries none
fn normalize_phone(phone: &str) -> String {
    if phone.starts_with('+') {
        phone.to_string()
    } else {
        format!("+91{}", phone)
    }
}

impl SmsService {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Order confirmation text, sent right after checkout
    pub async fn send_order_confirmation(&self, order: &Order) -> anyhow::Result<()> {
        let body = format!(
            "PureStore: Your order {} has been placed. Total: ₹{:.2}. Track: {}/track-order?order={}",
            order.order_number, order.total, self.config.frontend_url, order.order_number
        );
        self.send(&order.shipping_address.phone, &body).await
    }

    /// Status-change text
    pub async fn send_order_status(&self, order: &Order, status: OrderStatus) -> anyhow::Result<()> {
        let message = match status {
            OrderStatus::Confirmed => {
                "Your order has been confirmed and is being prepared.".to_string()
            }
            OrderStatus::Processing => "Your order is being processed.".to_string(),
            OrderStatus::Shipped => match order.tracking_number.as_deref() {
                Some(tracking) => format!("Your order has been shipped! Tracking: {}", tracking),
                None => "Your order has been shipped!".to_string(),
            },
            OrderStatus::Delivered => "Your order has been delivered. Thank you!".to_string(),
            OrderStatus::Cancelled => "Your order has been cancelled.".to_string(),
            OrderStatus::Pending => format!("Status updated to {}", status.as_str()),
        };

        let body = format!("PureStore Order {}: {}", order.order_number, message);
        self.send(&order.shipping_address.phone, &body).await
    }

    async fn send(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let (Some(sid), Some(token), Some(from)) = (
            self.config.account_sid.as_deref(),
            self.config.auth_token.as_deref(),
            self.config.from_number.as_deref(),
        ) else {
            tracing::debug!(to = %to, "SMS skipped: provider not configured");
            return Ok(());
        };

        let to = normalize_phone(to);
        let params = [("To", to.as_str()), ("From", from), ("Body", body)];

        let response = self
            .client
            .post(format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                self.config.api_base, sid
            ))
            .basic_auth(sid, Some(token))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("sms provider returned {}", response.status());
        }

        tracing::info!(to = %to, "SMS sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("9876543210"), "+919876543210");
        assert_eq!(normalize_phone("+14155552671"), "+14155552671");
    }
}
