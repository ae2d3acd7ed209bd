//! # 血库管理模块
//!
//! 提供配置加载、校验、保存以及日志初始化等运维功能

pub mod config;
pub mod logging;

pub use config::{BloodBankConfig, ConfigManager, ConfigValidator, LoggingConfig, SessionConfig};
pub use logging::init_logging;
