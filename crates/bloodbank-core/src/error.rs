//! 错误定义模块

use thiserror::Error;

/// 血库系统统一错误类型
#[derive(Error, Debug)]
pub enum BloodBankError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("无效状态转换: 从 {from} 执行 {event}")]
    InvalidStateTransition { from: String, event: String },

    #[error("远程存储错误: {0}")]
    RemoteFailure(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BloodBankError {
    /// 是否为本地规则拒绝（未触达远程存储）
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            BloodBankError::Validation(_) | BloodBankError::InvalidStateTransition { .. }
        )
    }
}

/// 血库系统统一结果类型
pub type Result<T> = std::result::Result<T, BloodBankError>;
