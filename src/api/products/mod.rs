//! Product API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    // 公开目录路由
    // The first-position param must carry one name across the merged
    // routers (matchit constraint); the GET segment is a slug
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_slug));

    // 管理路由：仅管理员可用
    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/stock", patch(handler::update_stock))
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(manage_routes)
}
