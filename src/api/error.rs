// ==========================================
// 广告排播订单管理系统 - API层错误类型
// ==========================================
// 职责: 汇聚导入/引擎/仓储错误，给调用方单一错误面
// 红线: 错误信息必须带显式原因，不得吞错
// ==========================================

use crate::engine::EngineError;
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 尚未载入任何订单，编辑/入账类操作不可用
    #[error("尚未载入订单")]
    NoActiveOrder,

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("校验失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::Validation(msg),
            EngineError::Repository(e) => ApiError::Repository(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
