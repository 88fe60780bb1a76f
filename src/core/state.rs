use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::orders::OrderWorkflow;
use crate::services::{EmailService, PaymentGateway, SmsService};
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | orders | OrderWorkflow | 订单工作流 (持有注入的网关/邮件/短信客户端) |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 订单工作流
    pub orders: OrderWorkflow,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 数据目录
    /// 2. 数据库 (data_dir/storefront.db)
    /// 3. 集成服务 (JWT, 支付网关, 邮件, 短信)
    /// 4. 订单工作流 (注入集成服务)
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| AppError::internal(format!("Failed to create data directory: {e}")))?;

        let db_service = DbService::new(&config.database_path()).await?;
        let db = db_service.db;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let payment = Arc::new(PaymentGateway::new(config.payment.clone()));
        let email = Arc::new(EmailService::new(config.email.clone()));
        let sms = Arc::new(SmsService::new(config.sms.clone()));
        let orders = OrderWorkflow::new(db.clone(), payment, email, sms);

        Ok(Self {
            config: config.clone(),
            db,
            jwt_service,
            orders,
        })
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
