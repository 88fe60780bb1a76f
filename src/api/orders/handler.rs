//! Order API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    CreatePaymentRequest, Order, OrderCreate, OrderStatus, OrderStatusUpdate,
    VerifyPaymentRequest,
};
use crate::db::repository::OrderRepository;
use crate::services::GatewayOrder;
use crate::utils::{AppError, AppResult, PageInfo, PageQuery};

/// POST /api/orders - 创建订单
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    let order = state.orders.create_order(&user, payload).await?;
    Ok(Json(order))
}

/// POST /api/orders/create-payment - 创建网关支付单
pub async fn create_payment(
    State(state): State<ServerState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<GatewayOrder>> {
    let gateway_order = state.orders.create_payment(payload).await?;
    Ok(Json(gateway_order))
}

/// POST /api/orders/verify-payment - 校验支付签名并确认订单
pub async fn verify_payment(
    State(state): State<ServerState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.verify_payment(payload).await?;
    Ok(Json(order))
}

/// GET /api/orders/my-orders - 当前用户的订单，新的在前
pub async fn my_orders(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Order>>> {
    let user_id = user
        .id
        .parse()
        .map_err(|_| AppError::internal("Invalid user id in token"))?;

    let repo = OrderRepository::new(state.db.clone());
    let orders = repo.find_by_user(&user_id).await?;
    Ok(Json(orders))
}

/// GET /api/orders/:order_number - 订单详情 (本人或管理员)
pub async fn get_by_number(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_number): Path<String>,
) -> AppResult<Json<Order>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_number(&order_number)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if order.user.to_string() != user.id && !user.is_admin() {
        return Err(AppError::forbidden("Access denied"));
    }

    Ok(Json(order))
}

/// Admin listing query params
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Paginated order listing
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub pagination: PageInfo,
}

fn parse_status_filter(status: Option<&str>) -> AppResult<Option<OrderStatus>> {
    match status {
        None | Some("all") | Some("") => Ok(None),
        Some("pending") => Ok(Some(OrderStatus::Pending)),
        Some("confirmed") => Ok(Some(OrderStatus::Confirmed)),
        Some("processing") => Ok(Some(OrderStatus::Processing)),
        Some("shipped") => Ok(Some(OrderStatus::Shipped)),
        Some("delivered") => Ok(Some(OrderStatus::Delivered)),
        Some("cancelled") => Ok(Some(OrderStatus::Cancelled)),
        Some(other) => Err(AppError::validation(format!(
            "Unknown status filter: {}",
            other
        ))),
    }
}

/// GET /api/orders - 全部订单 (管理员，可按状态过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let status = parse_status_filter(query.status.as_deref())?;
    let page = PageQuery {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    }
    .clamped();

    let repo = OrderRepository::new(state.db.clone());
    let (orders, total) = repo.find_all(status, &page).await?;

    Ok(Json(OrderListResponse {
        orders,
        pagination: PageInfo::new(&page, total),
    }))
}

/// PATCH /api/orders/:id/status - 推进订单状态 (管理员)
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let order = state.orders.update_status(&id, payload).await?;
    Ok(Json(order))
}

/// POST /api/orders/:id/cancel - 取消订单 (本人或管理员)
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.cancel(&id, &user).await?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_filter() {
        assert!(parse_status_filter(None).unwrap().is_none());
        assert!(parse_status_filter(Some("all")).unwrap().is_none());
        assert_eq!(
            parse_status_filter(Some("shipped")).unwrap(),
            Some(OrderStatus::Shipped)
        );
        assert!(parse_status_filter(Some("bogus")).is_err());
    }
}
