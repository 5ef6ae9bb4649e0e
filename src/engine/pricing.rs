// ==========================================
// 广告排播订单管理系统 - 计价引擎
// ==========================================
// 套餐价按加权播出空间摊到每行:
//   行空间   = F/P × Ratio × Dur × 行条数
//   空间均价 = 套餐价 / Σ 行空间
//   行单价   = F/P × Ratio × Dur × 空间均价
// 红线: 全部输入宽松解析，解析失败按 0 参与，不中断计价
// ==========================================

use crate::domain::{CalendarRow, CalendarTable};

/// 计价引擎
pub struct PricingEngine;

impl PricingEngine {
    /// 宽松数值解析：允许千分位逗号，失败返回 0
    pub fn lenient_f64(text: &str) -> f64 {
        text.replace(',', "").trim().parse::<f64>().unwrap_or(0.0)
    }

    /// 单行付费空间 = F/P × Ratio × Dur × 行条数
    pub fn paid_space(row: &CalendarRow) -> f64 {
        Self::lenient_f64(&row.fp)
            * Self::lenient_f64(&row.ratio)
            * Self::lenient_f64(&row.dur)
            * row.total_spots as f64
    }

    /// 按套餐价重算全表单价
    ///
    /// 写入每行的 Unit Price (KWD) 与 Price in US $（行单价 × 行条数）。
    /// 总付费空间为 0 时全表单价清空。
    pub fn reprice(table: &mut CalendarTable, package_cost: &str) {
        let cost = Self::lenient_f64(package_cost);
        let total_space: f64 = table.rows.iter().map(Self::paid_space).sum();
        let avg = if total_space > 0.0 {
            cost / total_space
        } else {
            0.0
        };

        for row in &mut table.rows {
            let unit = Self::lenient_f64(&row.fp)
                * Self::lenient_f64(&row.ratio)
                * Self::lenient_f64(&row.dur)
                * avg;
            row.unit_price = Self::format_n3(unit);
            row.price_usd = Self::format_n3(unit * row.total_spots as f64);
        }
    }

    /// 千分位 + 3 位小数；非正值渲染为空串
    pub fn format_n3(value: f64) -> String {
        if value <= 0.0 {
            return String::new();
        }
        let text = format!("{value:.3}");
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text.as_str(), "000"),
        };

        let mut grouped = String::new();
        let digits: Vec<char> = int_part.chars().collect();
        for (i, c) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(*c);
        }
        format!("{grouped}.{frac_part}")
    }

    /// 套餐价输入清洗：仅保留数字与首个小数点，按 0.000 重排
    ///
    /// 清洗后无法解析的输入返回空串
    pub fn normalize_package_cost(input: &str) -> String {
        let mut cleaned = String::new();
        let mut seen_dot = false;
        for c in input.chars() {
            if c.is_ascii_digit() {
                cleaned.push(c);
            } else if c == '.' && !seen_dot {
                cleaned.push(c);
                seen_dot = true;
            }
        }
        match cleaned.parse::<f64>() {
            Ok(v) => format!("{v:.3}"),
            Err(_) => String::new(),
        }
    }
}
