//! 配置管理
//!
//! 内置默认值、可选的 TOML 文件与 `BLOODBANK__*` 环境变量分层合并

use anyhow::{Context, Result};
use bloodbank_core::{Role, SessionContext};
use bloodbank_integration::StoreConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// 环境变量前缀，层级分隔符为 `__`，如 `BLOODBANK__STORE__ENDPOINT`
pub const ENV_PREFIX: &str = "BLOODBANK";

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: Arc<RwLock<BloodBankConfig>>,
    /// 配置文件路径
    config_path: String,
    /// 配置验证器
    validator: ConfigValidator,
}

/// 血库看板完整配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BloodBankConfig {
    /// 远程存储
    pub store: StoreConfig,
    /// 日志
    pub logging: LoggingConfig,
    /// 会话
    pub session: SessionConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` 指令，如 `info` 或 `bloodbank_workflow=debug`
    pub level: String,
    /// `full` 或 `compact`
    pub format: String,
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    pub role: Role,
    pub email: Option<String>,
    /// 当前献血者是否已完成注册
    pub donor_registered: bool,
}

impl SessionConfig {
    pub fn to_context(&self) -> SessionContext {
        SessionContext {
            role: self.role,
            email: self.email.clone(),
            donor_registered: self.donor_registered,
        }
    }
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数
    validator: fn(&BloodBankConfig) -> Result<()>,
    /// 错误消息
    error_message: &'static str,
}

impl ConfigManager {
    /// 加载配置，文件不存在时只使用默认值与环境变量
    pub fn load(config_path: &str) -> Result<Self> {
        let config = Self::load_config(config_path, ENV_PREFIX)?;
        Ok(Self::with_config(config_path, config))
    }

    /// 直接使用给定配置
    pub fn with_config(config_path: &str, config: BloodBankConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.to_string(),
            validator: ConfigValidator::new(),
        }
    }

    fn load_config(config_path: &str, env_prefix: &str) -> Result<BloodBankConfig> {
        let settings = Config::builder()
            .add_source(
                Config::try_from(&BloodBankConfig::default())
                    .context("Failed to build default configuration")?,
            )
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to assemble configuration sources")?;

        let config: BloodBankConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        info!("Configuration loaded from: {}", config_path);
        Ok(config)
    }

    /// 获取配置
    pub async fn get_config(&self) -> BloodBankConfig {
        let config = self.config.read().await;
        config.clone()
    }

    /// 更新配置
    pub async fn update_config(&self, new_config: BloodBankConfig) -> Result<()> {
        self.validator.validate(&new_config)?;

        {
            let mut config = self.config.write().await;
            *config = new_config;
        }

        info!("Configuration updated");
        Ok(())
    }

    /// 保存配置到文件，`path` 为空时写回加载路径
    pub async fn save(&self, path: Option<&str>) -> Result<()> {
        let target = path.unwrap_or(self.config_path.as_str());
        let config = self.config.read().await;
        let config_str = toml::to_string_pretty(&*config)
            .context("Failed to serialize configuration")?;

        tokio::fs::write(target, config_str)
            .await
            .with_context(|| format!("Failed to write configuration file {}", target))?;

        info!("Configuration saved to: {}", target);
        Ok(())
    }

    /// 验证配置
    pub async fn validate_config(&self) -> Result<()> {
        let config = self.config.read().await;
        self.validator.validate(&config)
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "store.endpoint",
                validator: |config| {
                    let endpoint = config.store.endpoint.trim();
                    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("Endpoint must be an http(s) URL: {:?}", endpoint))
                    }
                },
                error_message: "Invalid store endpoint",
            },
            ValidationRule {
                field_path: "logging.level",
                validator: |config| {
                    if config.logging.level.trim().is_empty() {
                        Err(anyhow::anyhow!("Log level cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid log level",
            },
            ValidationRule {
                field_path: "logging.format",
                validator: |config| match config.logging.format.as_str() {
                    "full" | "compact" => Ok(()),
                    other => Err(anyhow::anyhow!("Unknown log format: {}", other)),
                },
                error_message: "Invalid log format",
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &BloodBankConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(anyhow::anyhow!("{}: {}", rule.error_message, e));
            }
        }

        info!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}
