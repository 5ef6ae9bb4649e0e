// ==========================================
// 广告排播订单管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod deal_repo;
pub mod document_store;
pub mod error;
pub mod grid_repo;
pub mod rate_repo;

// 重导出常用类型
pub use deal_repo::{DealRepository, NewBookingLine, NewSpotRow, SqliteDealRepository};
pub use document_store::DocumentStore;
pub use error::{RepositoryError, RepositoryResult};
pub use grid_repo::{GridLookup, SqliteGridRepository};
pub use rate_repo::{RateCardLookup, SqliteRateRepository};
