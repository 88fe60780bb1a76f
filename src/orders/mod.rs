//! 订单工作流模块
//!
//! 把客户端、支付网关、库存和通知渠道协调成单请求事务。
//! 状态机定义见 [`crate::db::models::OrderStatus`]。

pub mod workflow;

pub use workflow::{OrderWorkflow, generate_order_number};
