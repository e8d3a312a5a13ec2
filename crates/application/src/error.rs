use domain::DomainError;
use thiserror::Error;

use crate::broadcaster::BroadcastError;
use crate::connection::DeliveryError;
use crate::repository::StorageError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 请求体无法解析成预期结构
    #[error("malformed request: {}", details.join("; "))]
    Malformed { details: Vec<String> },
    /// 字段规则校验失败，携带全部原因
    #[error("validation failed: {}", details.join("; "))]
    Validation { details: Vec<String> },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl ApplicationError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        ApplicationError::Malformed {
            details: vec![detail.into()],
        }
    }

    /// 创建基础设施错误
    pub fn infrastructure(message: impl Into<String>) -> Self {
        ApplicationError::Infrastructure(message.into())
    }
}

impl From<DomainError> for ApplicationError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::ValidationFailed { details } => ApplicationError::Validation { details },
        }
    }
}
