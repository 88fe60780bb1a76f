//! Review API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<ServerState> {
    // 公开 + 用户路由
    let user_routes = Router::new()
        .route("/product/{product_id}", get(handler::list_for_product))
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/helpful", post(handler::mark_helpful));

    // 审核路由：仅管理员可用
    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/approve", patch(handler::approve))
        .route("/{id}/reject", patch(handler::reject))
        .layer(middleware::from_fn(require_admin));

    user_routes.merge(admin_routes)
}
