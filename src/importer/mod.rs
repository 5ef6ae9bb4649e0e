// ==========================================
// 广告排播订单管理系统 - 导入模块
// ==========================================
// 职责: Excel 排播单读取、版式识别、结构化订单产出
// 红线: 不触达数据库,不做计价
// ==========================================

pub mod dates;
pub mod error;
pub mod layout;
pub mod reader;
pub mod sheet;

// 重导出常用类型
pub use error::{ImportError, ImportResult};
pub use reader::{BookingOrderReader, OrderLayout};
pub use sheet::SheetGrid;
