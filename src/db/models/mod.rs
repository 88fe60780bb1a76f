//! Database Models
//!
//! Serde structs matching the SurrealDB tables, plus the Create/Update
//! payloads accepted by the API.

pub mod serde_helpers;

pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use order::{
    CreatePaymentRequest, Order, OrderCreate, OrderId, OrderItem, OrderItemInput, OrderStatus,
    OrderStatusUpdate, PaymentMethod, PaymentStatus, ShippingAddress, VerifyPaymentRequest,
};
pub use product::{Product, ProductCategory, ProductCreate, ProductId, ProductQuery, ProductUpdate};
pub use review::{Review, ReviewCreate, ReviewId, ReviewStatus, ReviewUpdate};
pub use user::{
    ChangePasswordRequest, LoginRequest, ProfileUpdate, RegisterRequest, SavedAddress, User,
    UserId, UserRole,
};
