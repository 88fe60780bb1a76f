//! Order API 模块
//!
//! 所有写操作都经过 [`crate::orders::OrderWorkflow`]。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 用户路由 (下单、支付、查询自己的订单、取消)
    // The first-position param must carry one name across the merged
    // routers (matchit constraint); the GET segment is an order number
    let user_routes = Router::new()
        .route("/", post(handler::create))
        .route("/create-payment", post(handler::create_payment))
        .route("/verify-payment", post(handler::verify_payment))
        .route("/my-orders", get(handler::my_orders))
        .route("/{id}", get(handler::get_by_number))
        .route("/{id}/cancel", post(handler::cancel));

    // 管理路由：全量列表与状态推进
    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/status", patch(handler::update_status))
        .layer(middleware::from_fn(require_admin));

    user_routes.merge(admin_routes)
}
