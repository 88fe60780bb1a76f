//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册 / 登录 / 账户管理接口
//! - [`products`] - 商品目录接口
//! - [`orders`] - 订单与支付接口
//! - [`reviews`] - 评论与审核接口

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

/// Assemble the application router: resource routers behind the bearer-auth
/// middleware (which lets the public allowlist through), wrapped in request
/// tracing and permissive CORS.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(reviews::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
