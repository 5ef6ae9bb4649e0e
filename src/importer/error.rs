// ==========================================
// 广告排播订单管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 解析失败返回单一错误载荷，绝不外泄半成品订单
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    // ===== 版面识别错误 =====
    #[error("未找到排播工作表（要求至少 10 行 × 10 列）")]
    NoBookingSheet,

    #[error("{format}: 缺少必需表头 {header}")]
    MissingHeader { format: String, header: String },

    #[error("{format}: 未找到首个日列")]
    FirstDayColumnNotFound { format: String },

    #[error("{format}: 日历行缺失（应位于表头行上方）")]
    CalendarRowNotFound { format: String },

    // ===== 数据错误 =====
    #[error("订单中没有任何有效播出记录")]
    NoSpots,

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
