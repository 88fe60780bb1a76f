use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::services::{EmailConfig, PaymentConfig, SmsConfig};

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATA_DIR | ./data | 数据目录 (嵌入式数据库) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_DIR | - | 日志目录 (未设置时仅输出到终端) |
/// | JWT_SECRET | - | JWT 密钥 (生产环境必填) |
/// | RAZORPAY_KEY_ID / RAZORPAY_KEY_SECRET | - | 支付网关凭证 |
/// | SENDGRID_API_KEY / FROM_EMAIL | - | 邮件服务 |
/// | TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN / TWILIO_PHONE_NUMBER | - | 短信服务 |
/// | FRONTEND_URL | http://localhost:5173 | 前端地址 (通知中的链接) |
#[derive(Debug, Clone)]
pub struct Config {
    /// 数据目录，存储嵌入式数据库
    pub data_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志目录 (可选)
    pub log_dir: Option<String>,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 支付网关配置
    pub payment: PaymentConfig,
    /// 邮件服务配置
    pub email: EmailConfig,
    /// 短信服务配置
    pub sms: SmsConfig,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
            jwt: JwtConfig::default(),
            payment: PaymentConfig::from_env(),
            email: EmailConfig::from_env(),
            sms: SmsConfig::from_env(),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(data_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.http_port = http_port;
        config
    }

    /// 嵌入式数据库路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("storefront.db")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
