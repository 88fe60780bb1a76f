//! 认证模块 - JWT 认证与授权
//!
//! # 组件
//!
//! - [`JwtService`] - 令牌生成与验证
//! - [`CurrentUser`] - 请求上下文中的当前用户
//! - [`middleware`] - Axum 认证/管理员中间件

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
