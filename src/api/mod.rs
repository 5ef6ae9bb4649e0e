// ==========================================
// 广告排播订单管理系统 - API 层
// ==========================================
// 职责: 面向调用方的编辑会话门面与统一错误面
// ==========================================

pub mod error;
pub mod session;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use session::{BookingSession, DealProposal};
