//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductQuery, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResult, PageInfo, PageQuery};

/// Catalog listing query params (filters + pagination in one flat struct;
/// `Query` cannot be extracted twice)
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Paginated catalog response
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub pagination: PageInfo,
}

/// GET /api/products - 商品目录 (公开)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ProductListResponse>> {
    let page = PageQuery {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(12),
    }
    .clamped();
    let filter = ProductQuery {
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
        search: query.search,
        sort: query.sort,
    };

    let repo = ProductRepository::new(state.db.clone());
    let (products, total) = repo.find_all(&filter, &page).await?;

    Ok(Json(ProductListResponse {
        products,
        pagination: PageInfo::new(&page, total),
    }))
}

/// GET /api/products/:slug - 单个商品 (公开)
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(Json(product))
}

/// POST /api/products - 创建商品 (管理员)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    payload.validate()?;

    let repo = ProductRepository::new(state.db.clone());
    let product = repo.create(payload).await?;

    tracing::info!(slug = %product.slug, "Product created");
    Ok(Json(product))
}

/// PUT /api/products/:id - 更新商品 (管理员)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    payload.validate()?;

    let repo = ProductRepository::new(state.db.clone());
    let product = repo.update(&id, payload).await?;
    Ok(Json(product))
}

/// DELETE /api/products/:id - 下架商品 (管理员，软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let repo = ProductRepository::new(state.db.clone());
    repo.soft_delete(&id).await?;

    tracing::info!(product_id = %id, "Product deactivated");
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

/// Stock update payload
#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub stock: i32,
}

/// PATCH /api/products/:id/stock - 更新库存 (管理员)
pub async fn update_stock(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StockUpdate>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.set_stock(&id, payload.stock).await?;
    Ok(Json(product))
}
