// ==========================================
// 广告排播订单管理系统 - 引擎层
// ==========================================
// 职责: 日历表操作、计价、联想回填、交易入账的业务规则
// 红线: Engine 不拼 SQL, 数据访问一律经仓储接口
// ==========================================

pub mod autofill;
pub mod calendar;
pub mod deal;
pub mod pricing;

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("校验失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

// 重导出引擎
pub use autofill::AutoFillEngine;
pub use calendar::CalendarEngine;
pub use deal::{DealCommitOutcome, DealEngine};
pub use pricing::PricingEngine;
