//! 领域模型错误定义

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 输入校验失败，携带全部违反的规则
    #[error("验证失败: {}", details.join("; "))]
    ValidationFailed { details: Vec<String> },
}

impl DomainError {
    /// 创建校验错误
    pub fn validation_failed(details: Vec<String>) -> Self {
        Self::ValidationFailed { details }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
