//! Payment Gateway Adapter (Razorpay)
//!
//! Wraps the three gateway operations the order workflow needs: hosted
//! order creation, payment-signature verification (pure, no network), and
//! refunds. Missing credentials are a terminal configuration error for
//! create/refund; signature verification instead fails closed and reports
//! "not verified".

use ring::hmac;
use serde::Deserialize;
use thiserror::Error;

/// Gateway credentials and endpoint
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub api_base: String,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        Self {
            key_id: std::env::var("RAZORPAY_KEY_ID").ok().filter(|v| !v.is_empty()),
            key_secret: std::env::var("RAZORPAY_KEY_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),
            api_base: std::env::var("RAZORPAY_API_BASE")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
        }
    }

    /// Config with no credentials: create/refund fail, verification always
    /// reports "not verified"
    pub fn unconfigured() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            api_base: "https://api.razorpay.com".to_string(),
        }
    }
}

/// Payment gateway errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment gateway not configured")]
    NotConfigured,

    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gateway rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Hosted gateway order, as returned by order creation
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Minor currency units (paise)
    pub amount: i64,
    pub currency: String,
}

/// Refund record returned by the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayRefund {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body shape of the gateway API
#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: Option<GatewayErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
    description: Option<String>,
}

/// Payment gateway client, constructed once and injected into the order
/// workflow
#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

/// Convert a major-unit amount to paise
fn to_paise(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

impl PaymentGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), PaymentError> {
        match (self.config.key_id.as_deref(), self.config.key_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(PaymentError::NotConfigured),
        }
    }

    /// Create a hosted gateway order for `amount` (major units), carrying
    /// the local order number as the receipt reference
    pub async fn create_order(
        &self,
        amount: f64,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        let (key_id, key_secret) = self.credentials()?;

        let body = serde_json::json!({
            "amount": to_paise(amount),
            "currency": "INR",
            "receipt": receipt,
            "notes": { "order_number": receipt },
        });

        let response = self
            .client
            .post(format!("{}/v1/orders", self.config.api_base))
            .basic_auth(key_id, Some(key_secret))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = parse_gateway_error(response).await;
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let order: GatewayOrder = response.json().await?;
        tracing::info!(gateway_order_id = %order.id, receipt = %receipt, "Gateway order created");
        Ok(order)
    }

    /// Verify a payment signature: HMAC-SHA256 of
    /// `"{gateway_order_id}|{payment_id}"` under the key secret, hex
    /// encoded, compared in constant time. A missing secret means the
    /// signature cannot be checked, so the answer is "not verified".
    pub fn verify_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        let Some(secret) = self.config.key_secret.as_deref() else {
            tracing::error!("Signature verification skipped: gateway key secret not configured");
            return false;
        };

        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let payload = format!("{}|{}", gateway_order_id, payment_id);
        let expected = hex::encode(hmac::sign(&key, payload.as_bytes()).as_ref());

        ring::constant_time::verify_slices_are_equal(expected.as_bytes(), signature.as_bytes())
            .is_ok()
    }

    /// Initiate a refund, full when `amount` is None
    pub async fn refund(
        &self,
        payment_id: &str,
        amount: Option<f64>,
    ) -> Result<GatewayRefund, PaymentError> {
        let (key_id, key_secret) = self.credentials()?;

        let body = match amount {
            Some(amount) => serde_json::json!({ "amount": to_paise(amount) }),
            None => serde_json::json!({}),
        };

        let response = self
            .client
            .post(format!(
                "{}/v1/payments/{}/refund",
                self.config.api_base, payment_id
            ))
            .basic_auth(key_id, Some(key_secret))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = parse_gateway_error(response).await;
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let refund: GatewayRefund = response.json().await?;
        tracing::info!(refund_id = %refund.id, payment_id = %payment_id, "Refund initiated");
        Ok(refund)
    }
}

async fn parse_gateway_error(response: reqwest::Response) -> String {
    match response.json::<GatewayErrorBody>().await {
        Ok(body) => body
            .error
            .and_then(|e| e.description)
            .unwrap_or_else(|| "unknown gateway error".to_string()),
        Err(_) => "unknown gateway error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_with_secret(secret: &str) -> PaymentGateway {
        PaymentGateway::new(PaymentConfig {
            key_id: Some("rzp_test_key".to_string()),
            key_secret: Some(secret.to_string()),
            api_base: "https://api.razorpay.com".to_string(),
        })
    }

    fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let payload = format!("{}|{}", order_id, payment_id);
        hex::encode(hmac::sign(&key, payload.as_bytes()).as_ref())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let gateway = gateway_with_secret("test_secret");
        let signature = sign("test_secret", "order_123", "pay_456");
        assert!(gateway.verify_signature("order_123", "pay_456", &signature));
    }

    #[test]
    fn test_wrong_signature_rejected() {
        let gateway = gateway_with_secret("test_secret");
        let signature = sign("other_secret", "order_123", "pay_456");
        assert!(!gateway.verify_signature("order_123", "pay_456", &signature));
        assert!(!gateway.verify_signature("order_123", "pay_456", "deadbeef"));
        assert!(!gateway.verify_signature("order_123", "pay_456", ""));
    }

    #[test]
    fn test_swapped_ids_rejected() {
        let gateway = gateway_with_secret("test_secret");
        let signature = sign("test_secret", "order_123", "pay_456");
        assert!(!gateway.verify_signature("pay_456", "order_123", &signature));
    }

    #[test]
    fn test_missing_secret_fails_closed() {
        let gateway = PaymentGateway::new(PaymentConfig::unconfigured());
        let signature = sign("test_secret", "order_123", "pay_456");
        assert!(!gateway.verify_signature("order_123", "pay_456", &signature));
    }

    #[test]
    fn test_to_paise_rounds() {
        assert_eq!(to_paise(499.0), 49900);
        assert_eq!(to_paise(499.99), 49999);
        assert_eq!(to_paise(0.005), 1);
    }
}
