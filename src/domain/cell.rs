// ==========================================
// 广告排播订单管理系统 - 表格单元值
// ==========================================
// 电子表格单元的显式类型表示，取代“字符串/数字/日期随缘”的动态单元
// 宽松转换规则集中在这里，解析器只依赖这些方法
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};

/// 表格单元值
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// 空单元
    #[default]
    Blank,
    /// 文本
    Text(String),
    /// 数值（Excel 中整数也按浮点存储）
    Number(f64),
    /// 日期时间（Excel 的时间单元是 1899 纪元上的日期时间）
    Date(NaiveDateTime),
}

impl CellValue {
    /// 是否为空（空单元或纯空白文本）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 展示字符串（去除首尾空白；整数值不带小数点）
    pub fn display(&self) -> String {
        match self {
            CellValue::Blank => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Date(d) => d.date().format("%Y-%m-%d").to_string(),
        }
    }

    /// 宽松整数解析（数值要求无小数部分；文本 trim 后解析）
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            CellValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// 宽松浮点解析
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// 日期值（只认真正的日期单元）
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(d.date()),
            _ => None,
        }
    }

    /// 时间值，格式化为 HH:mm（排播单的时段列常以时间单元出现）
    pub fn as_time_hhmm(&self) -> Option<String> {
        match self {
            CellValue::Date(d) => Some(d.time().format("%H:%M").to_string()),
            _ => None,
        }
    }

    /// 大小写不敏感的子串匹配（空单元恒为 false）
    pub fn contains_ci(&self, needle: &str) -> bool {
        let text = self.display();
        if text.is_empty() {
            return false;
        }
        text.to_uppercase().contains(&needle.to_uppercase())
    }

    /// 压缩空白后的大小写不敏感匹配（列头中常见换行/多空格）
    pub fn contains_ci_normalized(&self, needle: &str) -> bool {
        let text = self.display();
        if text.is_empty() {
            return false;
        }
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        normalized.to_uppercase().contains(&needle.to_uppercase())
    }
}
