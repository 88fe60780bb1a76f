//! Integration services
//!
//! Clients for the external collaborators: payment gateway, transactional
//! email, SMS. All are constructed once from [`crate::core::Config`] and
//! injected where needed, so tests can substitute unconfigured instances.

pub mod email;
pub mod payment;
pub mod sms;

pub use email::{EmailConfig, EmailService};
pub use payment::{GatewayOrder, GatewayRefund, PaymentConfig, PaymentError, PaymentGateway};
pub use sms::{SmsConfig, SmsService};
