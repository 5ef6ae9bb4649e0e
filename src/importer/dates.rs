// ==========================================
// 广告排播订单管理系统 - 日列日期解析
// ==========================================
// 职责:
// - 在表中任意位置扫出年份（20xx）与英文月份作为种子
// - 把日历行的日列逐一解析为具体日期，处理跨月（日号回落）与跨年（12→1）
// ==========================================

use crate::importer::sheet::SheetGrid;
use chrono::{Datelike, NaiveDate};

/// 月份名称与缩写（缩写即全名前三位，JUNE/JUN 等同月）
const MONTH_NAMES: [&str; 12] = [
    "JANUARY", "FEBRUARY", "MARCH", "APRIL", "MAY", "JUNE", "JULY", "AUGUST", "SEPTEMBER",
    "OCTOBER", "NOVEMBER", "DECEMBER",
];

/// 年月种子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSeed {
    pub year: i32,
    pub month: u32,
}

/// 扫描全表找年份与月份，找不到的用 today 补
///
/// 年份: 首个形如 20xx 的四位数字串
/// 月份: 首个包含英文月份名（或三字母缩写）的单元
pub fn find_year_and_month(grid: &SheetGrid, today: NaiveDate) -> DateSeed {
    let mut year: Option<i32> = None;
    let mut month: Option<u32> = None;

    'scan: for r in 0..grid.rows() {
        for c in 0..grid.cols() {
            let text = grid.cell(r, c).display();
            if text.is_empty() {
                continue;
            }

            if year.is_none() {
                year = extract_year(&text);
            }

            if month.is_none() {
                let upper = text.to_uppercase();
                for (idx, name) in MONTH_NAMES.iter().enumerate() {
                    if upper.contains(name) || upper.contains(&name[..3]) {
                        month = Some(idx as u32 + 1);
                        break;
                    }
                }
            }

            if year.is_some() && month.is_some() {
                break 'scan;
            }
        }
    }

    DateSeed {
        year: year.unwrap_or_else(|| today.year()),
        month: month.unwrap_or_else(|| today.month()),
    }
}

/// 在文本中找首个 20xx 形式的年份（前后不能紧邻其他数字）
fn extract_year(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    for i in 0..bytes.len().saturating_sub(3) {
        let window = &bytes[i..i + 4];
        if window[0] == b'2'
            && window[1] == b'0'
            && window[2].is_ascii_digit()
            && window[3].is_ascii_digit()
        {
            let before_digit = i > 0 && bytes[i - 1].is_ascii_digit();
            let after_digit = i + 4 < bytes.len() && bytes[i + 4].is_ascii_digit();
            if !before_digit && !after_digit {
                let year: i32 = std::str::from_utf8(window).ok()?.parse().ok()?;
                return Some(year);
            }
        }
    }
    None
}

/// 解析日历行 [first_day_col, end_col) 内每个日列的日期
///
/// 返回 (列号, 日期) 对；无法解析的列被跳过。
/// 规则：
/// - 真日期单元（年份 > 1900）按原值采用
/// - 整数日号按运行中的年月拼装；当日号相对上一列回落且上一列日号 > 15
///   视为跨月（12 月翻转到次年 1 月）
/// - 组不出合法日期的（如 2 月 30 日）直接跳过
pub fn resolve_day_columns(
    grid: &SheetGrid,
    calendar_row: usize,
    first_day_col: usize,
    end_col: usize,
    seed: DateSeed,
) -> Vec<(usize, NaiveDate)> {
    let mut resolved = Vec::new();
    let mut year = seed.year;
    let mut month = seed.month;
    let mut prev_day: u32 = 0;

    for c in first_day_col..end_col {
        let cell = grid.cell(calendar_row, c);
        if cell.is_blank() {
            continue;
        }

        if let Some(date) = cell.as_date() {
            if date.year() > 1900 {
                prev_day = date.day();
                resolved.push((c, date));
                continue;
            }
            // 1899/1900 纪元的假日期只保留日号，走日号路径
            if try_push_day(date.day(), &mut year, &mut month, &mut prev_day, c, &mut resolved) {
                continue;
            }
        }

        if let Some(day) = cell.as_int() {
            if day > 0 && day <= 31 {
                try_push_day(day as u32, &mut year, &mut month, &mut prev_day, c, &mut resolved);
            }
        }
    }

    resolved
}

/// 按运行年月推进一个日号，处理跨月/跨年；组不出日期时只推进 prev_day
fn try_push_day(
    day: u32,
    year: &mut i32,
    month: &mut u32,
    prev_day: &mut u32,
    col: usize,
    resolved: &mut Vec<(usize, NaiveDate)>,
) -> bool {
    if *prev_day > 0 && day < *prev_day && *prev_day > 15 {
        *month += 1;
        if *month > 12 {
            *month = 1;
            *year += 1;
        }
    }
    *prev_day = day;

    if let Some(date) = NaiveDate::from_ymd_opt(*year, *month, day) {
        resolved.push((col, date));
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::CellValue;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day_row(days: &[i64]) -> SheetGrid {
        let cells = vec![days
            .iter()
            .map(|d| CellValue::Number(*d as f64))
            .collect::<Vec<_>>()];
        SheetGrid::new("t", cells)
    }

    #[test]
    fn test_month_rollover_on_day_decrease() {
        // [28, 29, 30, 1, 2] 从 6 月起 → 前三列 6 月，后两列 7 月
        let grid = day_row(&[28, 29, 30, 1, 2]);
        let seed = DateSeed { year: 2025, month: 6 };
        let resolved = resolve_day_columns(&grid, 0, 0, 5, seed);
        let dates: Vec<NaiveDate> = resolved.iter().map(|(_, d)| *d).collect();
        assert_eq!(
            dates,
            vec![
                date(2025, 6, 28),
                date(2025, 6, 29),
                date(2025, 6, 30),
                date(2025, 7, 1),
                date(2025, 7, 2),
            ]
        );
    }

    #[test]
    fn test_year_rollover_in_december() {
        let grid = day_row(&[30, 31, 1]);
        let seed = DateSeed { year: 2025, month: 12 };
        let resolved = resolve_day_columns(&grid, 0, 0, 3, seed);
        let dates: Vec<NaiveDate> = resolved.iter().map(|(_, d)| *d).collect();
        assert_eq!(
            dates,
            vec![date(2025, 12, 30), date(2025, 12, 31), date(2026, 1, 1)]
        );
    }

    #[test]
    fn test_small_decrease_is_not_rollover() {
        // 上一列日号 <= 15 时，回落不视为跨月（如 12 → 10 是乱序而非翻月）
        let grid = day_row(&[12, 10]);
        let seed = DateSeed { year: 2025, month: 6 };
        let resolved = resolve_day_columns(&grid, 0, 0, 2, seed);
        let dates: Vec<NaiveDate> = resolved.iter().map(|(_, d)| *d).collect();
        assert_eq!(dates, vec![date(2025, 6, 12), date(2025, 6, 10)]);
    }

    #[test]
    fn test_genuine_date_cell_used_verbatim() {
        let cells = vec![vec![
            CellValue::Date(date(2025, 3, 5).and_hms_opt(0, 0, 0).unwrap()),
            CellValue::Number(6.0),
        ]];
        let grid = SheetGrid::new("t", cells);
        let seed = DateSeed { year: 2024, month: 1 };
        let resolved = resolve_day_columns(&grid, 0, 0, 2, seed);
        // 日期单元按原值，后续日号仍按种子年月
        assert_eq!(resolved[0].1, date(2025, 3, 5));
        assert_eq!(resolved[1].1, date(2024, 1, 6));
    }

    #[test]
    fn test_invalid_date_skipped() {
        // 2 月没有 30 日，该列被跳过
        let grid = day_row(&[28, 30]);
        let seed = DateSeed { year: 2025, month: 2 };
        let resolved = resolve_day_columns(&grid, 0, 0, 2, seed);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].1, date(2025, 2, 28));
    }

    #[test]
    fn test_find_year_and_month_from_text() {
        let cells = vec![
            vec![CellValue::Text("Booking Order".to_string())],
            vec![CellValue::Text("Schedule for JUNE 2025".to_string())],
        ];
        let grid = SheetGrid::new("t", cells);
        let seed = find_year_and_month(&grid, date(2020, 1, 1));
        assert_eq!(seed, DateSeed { year: 2025, month: 6 });
    }

    #[test]
    fn test_find_year_and_month_defaults_to_today() {
        let grid = SheetGrid::new("t", vec![vec![CellValue::Text("no hints".to_string())]]);
        let seed = find_year_and_month(&grid, date(2024, 9, 15));
        assert_eq!(seed, DateSeed { year: 2024, month: 9 });
    }

    #[test]
    fn test_month_abbreviation_detected() {
        let grid = SheetGrid::new(
            "t",
            vec![vec![CellValue::Text("AUG-2025 flight".to_string())]],
        );
        let seed = find_year_and_month(&grid, date(2020, 1, 1));
        assert_eq!(seed, DateSeed { year: 2025, month: 8 });
    }
}
