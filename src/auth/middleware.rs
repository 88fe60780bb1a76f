//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (健康检查等)
/// - 注册 / 登录接口
/// - 商品目录 GET、商品公开评论列表 GET
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();
    let method = req.method();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if method == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if is_public_route(method, path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => {
            JwtService::extract_from_header(header).ok_or(AppError::InvalidToken)?
        }
        None => {
            tracing::warn!(target: "security", uri = %req.uri(), "Missing authorization header");
            return Err(AppError::Unauthorized);
        }
    };

    // 验证令牌
    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(target: "security", error = %e, uri = %req.uri(), "Token rejected");
            match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::TokenExpired),
                _ => Err(AppError::InvalidToken),
            }
        }
    }
}

/// 公共 API 路由 (无需令牌)
fn is_public_route(method: &http::Method, path: &str) -> bool {
    if path == "/api/auth/register" || path == "/api/auth/login" {
        return true;
    }
    if method == http::Method::GET {
        // Product catalog and approved review listings are public
        return path == "/api/products"
            || path.starts_with("/api/products/")
            || path.starts_with("/api/reviews/product/");
    }
    false
}

/// 管理员中间件 - 要求 admin 角色
///
/// 检查 `CurrentUser.role == Admin`，非管理员返回 403
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthorized)?;

    if !user.is_admin() {
        tracing::warn!(
            target: "security",
            user_id = %user.id,
            email = %user.email,
            "Admin privileges required"
        );
        return Err(AppError::forbidden(
            "Access denied. Admin privileges required.",
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_route_matrix() {
        let get = http::Method::GET;
        let post = http::Method::POST;

        assert!(is_public_route(&post, "/api/auth/login"));
        assert!(is_public_route(&post, "/api/auth/register"));
        assert!(is_public_route(&get, "/api/products"));
        assert!(is_public_route(&get, "/api/products/aqua-ro-classic"));
        assert!(is_public_route(&get, "/api/reviews/product/product:abc"));

        // Mutations and private reads require a token
        assert!(!is_public_route(&post, "/api/products"));
        assert!(!is_public_route(&post, "/api/orders"));
        assert!(!is_public_route(&get, "/api/orders/my-orders"));
        assert!(!is_public_route(&post, "/api/reviews"));
        assert!(!is_public_route(&get, "/api/reviews"));
    }
}
