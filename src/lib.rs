//! PureStore Server - 净水器电商后端
//!
//! # 架构概述
//!
//! 本模块是存储前端的主入口，提供以下核心功能：
//!
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储 (商品/订单/评论/用户)
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **订单工作流** (`orders`): 下单、库存预留、支付确认、状态机
//! - **集成服务** (`services`): 支付网关、邮件、短信
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (models + repositories)
//! ├── orders/        # 订单工作流
//! ├── services/      # 支付网关、邮件、短信
//! └── utils/         # 错误、日志、分页
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::OrderWorkflow;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
