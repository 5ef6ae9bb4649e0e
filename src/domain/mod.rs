// ==========================================
// 广告排播订单管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod booking;
pub mod calendar;
pub mod cell;
pub mod pricing;
pub mod types;

// 重导出核心类型
pub use booking::{BookingOrder, CampaignPeriod, Spot};
pub use calendar::{CalendarRow, CalendarTable, Column, META_COLUMN_COUNT};
pub use cell::CellValue;
pub use pricing::{BookingGroup, BookingLine, DealInfo, OidDetails, PeriodInfo, RatePeriod};
pub use types::{DealResolution, GridMode, SortDirection};
