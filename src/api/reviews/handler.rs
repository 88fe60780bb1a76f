//! Review API Handlers
//!
//! Reviews enter moderation as pending; only approved reviews are public.
//! Every mutation that can change the approved set recomputes the product
//! rating aggregate.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Review, ReviewCreate, ReviewStatus, ReviewUpdate};
use crate::db::repository::{
    OrderRepository, ProductRepository, ReviewRepository, parse_record_id,
};
use crate::utils::{AppError, AppResult, PageInfo, PageQuery};

/// Public listing query params
#[derive(Debug, Deserialize)]
pub struct ProductReviewsQuery {
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Paginated review listing
#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<Review>,
    pub pagination: PageInfo,
}

/// GET /api/reviews/product/:product_id - 商品的已批准评论 (公开)
pub async fn list_for_product(
    State(state): State<ServerState>,
    Path(product_id): Path<String>,
    Query(query): Query<ProductReviewsQuery>,
) -> AppResult<Json<ReviewListResponse>> {
    let page = PageQuery {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(10),
    }
    .clamped();
    let product = parse_record_id("product", &product_id);

    let repo = ReviewRepository::new(state.db.clone());
    let (reviews, total) = repo
        .find_approved_for_product(&product, query.sort.as_deref(), &page)
        .await?;

    Ok(Json(ReviewListResponse {
        reviews,
        pagination: PageInfo::new(&page, total),
    }))
}

/// POST /api/reviews - 提交评论 (待审核)
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ReviewCreate>,
) -> AppResult<Json<Review>> {
    payload.validate()?;

    let product_repo = ProductRepository::new(state.db.clone());
    let product = product_repo
        .find_by_id(&payload.product)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    let product_id = product
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Product record has no id"))?;

    let user_id = user
        .id
        .parse()
        .map_err(|_| AppError::internal("Invalid user id in token"))?;

    let repo = ReviewRepository::new(state.db.clone());
    if repo
        .find_by_product_and_user(&product_id, &user_id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(
            "You have already reviewed this product",
        ));
    }

    // Verified purchase: an order by this user containing this product
    // that reached confirmed or delivered status
    let verified = OrderRepository::new(state.db.clone())
        .user_has_purchased(&user_id, &product_id)
        .await?;

    let review = repo
        .create(Review {
            id: None,
            product: product_id.clone(),
            user: user_id,
            rating: payload.rating,
            title: payload.title,
            comment: payload.comment,
            images: payload.images.unwrap_or_default(),
            verified,
            helpful: 0,
            status: ReviewStatus::Pending,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        })
        .await?;

    repo.recompute_product_rating(&product_id).await?;

    tracing::info!(product = %product_id, verified, "Review submitted for moderation");
    Ok(Json(review))
}

/// PUT /api/reviews/:id - 编辑自己的评论 (重新进入审核)
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewUpdate>,
) -> AppResult<Json<Review>> {
    payload.validate()?;

    let repo = ReviewRepository::new(state.db.clone());
    let review = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Review not found"))?;

    if review.user.to_string() != user.id {
        return Err(AppError::forbidden("Access denied"));
    }

    let updated = repo.update(&id, payload).await?;
    repo.recompute_product_rating(&updated.product).await?;

    Ok(Json(updated))
}

/// DELETE /api/reviews/:id - 删除评论 (本人或管理员)
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let repo = ReviewRepository::new(state.db.clone());
    let review = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Review not found"))?;

    if review.user.to_string() != user.id && !user.is_admin() {
        return Err(AppError::forbidden("Access denied"));
    }

    repo.delete(&id).await?;
    repo.recompute_product_rating(&review.product).await?;

    Ok(Json(json!({ "message": "Review deleted successfully" })))
}

/// POST /api/reviews/:id/helpful - 点赞
pub async fn mark_helpful(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Review>> {
    let repo = ReviewRepository::new(state.db.clone());
    let review = repo.increment_helpful(&id).await?;
    Ok(Json(review))
}

/// Admin listing query params
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn parse_status_filter(status: Option<&str>) -> AppResult<Option<ReviewStatus>> {
    match status {
        None | Some("all") | Some("") => Ok(None),
        Some("pending") => Ok(Some(ReviewStatus::Pending)),
        Some("approved") => Ok(Some(ReviewStatus::Approved)),
        Some("rejected") => Ok(Some(ReviewStatus::Rejected)),
        Some(other) => Err(AppError::validation(format!(
            "Unknown status filter: {}",
            other
        ))),
    }
}

/// GET /api/reviews - 全部评论 (管理员，可按审核状态过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ReviewListResponse>> {
    let status = parse_status_filter(query.status.as_deref())?;
    let page = PageQuery {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    }
    .clamped();

    let repo = ReviewRepository::new(state.db.clone());
    let (reviews, total) = repo.find_all(status, &page).await?;

    Ok(Json(ReviewListResponse {
        reviews,
        pagination: PageInfo::new(&page, total),
    }))
}

/// PATCH /api/reviews/:id/approve - 批准评论 (管理员)
pub async fn approve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Review>> {
    let repo = ReviewRepository::new(state.db.clone());
    let review = repo.set_status(&id, ReviewStatus::Approved).await?;
    repo.recompute_product_rating(&review.product).await?;

    tracing::info!(review_id = %id, "Review approved");
    Ok(Json(review))
}

/// PATCH /api/reviews/:id/reject - 拒绝评论 (管理员)
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Review>> {
    let repo = ReviewRepository::new(state.db.clone());
    let review = repo.set_status(&id, ReviewStatus::Rejected).await?;
    // Rejecting a previously approved review shrinks the approved set,
    // so the aggregate has to be recomputed here as well
    repo.recompute_product_rating(&review.product).await?;

    tracing::info!(review_id = %id, "Review rejected");
    Ok(Json(review))
}
