//! 日志初始化

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// 按配置初始化全局日志订阅器
///
/// 设置了 `RUST_LOG` 时以其为准，否则使用配置中的级别指令。
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.format.as_str() {
        "compact" => builder.compact().try_init(),
        _ => builder.try_init(),
    };
    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!("Logging initialised with level {:?}", config.level);
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level directive {:?}", config.level)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_level_is_parsed() {
        let config = LoggingConfig {
            level: "info,bloodbank_workflow=debug".to_string(),
            format: "compact".to_string(),
        };
        assert!(EnvFilter::try_new(&config.level).is_ok());
    }
}
