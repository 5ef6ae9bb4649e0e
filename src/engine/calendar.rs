// ==========================================
// 广告排播订单管理系统 - 日历表引擎
// ==========================================
// 职责: 订单→日历表投影、行级编辑、块操作、排序、投放期调整
// 红线: 合计行只读，所有操作仅作用于数据行
// ==========================================

use crate::domain::types::SortDirection;
use crate::domain::{BookingOrder, CalendarRow, CalendarTable, Column, Spot};
use crate::engine::{EngineError, EngineResult};
use std::cmp::Ordering;
use std::ops::{Deref, DerefMut};

/// 日历表引擎
pub struct CalendarEngine;

/// 批量编辑作用域
///
/// 持有期间的行/列重算请求被抑制，离开作用域时统一重算一次
pub struct BatchScope<'a> {
    table: &'a mut CalendarTable,
}

impl Deref for BatchScope<'_> {
    type Target = CalendarTable;

    fn deref(&self) -> &CalendarTable {
        self.table
    }
}

impl DerefMut for BatchScope<'_> {
    fn deref_mut(&mut self) -> &mut CalendarTable {
        self.table
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        self.table.batch_depth -= 1;
        if self.table.batch_depth == 0 {
            CalendarEngine::recompute(self.table);
        }
    }
}

impl CalendarEngine {
    /// 进入批量编辑作用域（可嵌套）
    pub fn begin_batch(table: &mut CalendarTable) -> BatchScope<'_> {
        table.batch_depth += 1;
        BatchScope { table }
    }

    /// 由结构化订单构建日历表
    ///
    /// 同一 (节目, 时段) 的播出记录合并为一行，行序按首次出现的顺序
    pub fn build_from_order(order: &BookingOrder) -> CalendarTable {
        let mut table = CalendarTable::new(
            order.campaign_period.start_date,
            order.campaign_period.end_date,
        );
        let day_count = table.day_count();

        for spot in &order.spots {
            let key_programme = spot.programme_name.clone();
            let key_time = spot.programme_start_time.clone();

            let row_idx = table
                .rows
                .iter()
                .position(|r| r.programme == key_programme && r.time == key_time)
                .unwrap_or_else(|| {
                    let mut row = CalendarRow::blank(day_count);
                    row.programme = key_programme;
                    row.time = key_time;
                    row.dur = digits_of(&spot.duration);
                    table.rows.push(row);
                    table.rows.len() - 1
                });

            for date in &spot.dates {
                if let Some(day_idx) = table.day_index_of(*date) {
                    table.rows[row_idx].day_cells[day_idx] += 1;
                }
            }
        }

        Self::recompute(&mut table);
        table
    }

    /// 重算行合计与合计行（批量作用域内被抑制）
    pub fn recompute(table: &mut CalendarTable) {
        if table.batch_depth > 0 {
            return;
        }
        let day_count = table.day_count();

        for row in &mut table.rows {
            row.recompute_total();
        }

        let mut total = CalendarRow::empty(day_count);
        total.programme = "Total".to_string();
        for row in &table.rows {
            for (i, v) in row.day_cells.iter().enumerate() {
                total.day_cells[i] += v;
            }
        }
        total.recompute_total();
        table.total = total;
    }

    /// 写入单元值（日列写入后联动重算）
    pub fn set_cell(
        table: &mut CalendarTable,
        row: usize,
        col: Column,
        raw: &str,
    ) -> EngineResult<()> {
        let Some(target) = table.rows.get_mut(row) else {
            return Err(EngineError::Validation(format!("行号越界: {row}")));
        };
        target.set_value(col, raw);
        if matches!(col, Column::Day(_)) {
            Self::recompute(table);
        }
        Ok(())
    }

    /// 在指定位置插入新数据行（越界则追加到数据行末尾）
    pub fn insert_row(table: &mut CalendarTable, at: usize) {
        let day_count = table.day_count();
        let at = at.min(table.rows.len());
        table.rows.insert(at, CalendarRow::blank(day_count));
    }

    /// 复制选中数据行，按原顺序插到首个选中行上方
    pub fn duplicate_rows(table: &mut CalendarTable, indices: &[usize]) {
        let mut selected: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < table.rows.len())
            .collect();
        selected.sort_unstable();
        selected.dedup();

        let Some(&first) = selected.first() else {
            return;
        };
        let clones: Vec<CalendarRow> = selected.iter().map(|&i| table.rows[i].clone()).collect();
        for (offset, row) in clones.into_iter().enumerate() {
            table.rows.insert(first + offset, row);
        }
        Self::recompute(table);
    }

    /// 删除选中数据行
    pub fn delete_rows(table: &mut CalendarTable, indices: &[usize]) {
        let mut selected: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < table.rows.len())
            .collect();
        selected.sort_unstable();
        selected.dedup();

        for &i in selected.iter().rev() {
            table.rows.remove(i);
        }
        Self::recompute(table);
    }

    /// 从 (起始行, 起始列序号) 粘贴文本块
    ///
    /// 超出数据行/列范围的部分丢弃；日列按宽松整数解析，合计列拒收
    pub fn paste(
        table: &mut CalendarTable,
        start_row: usize,
        start_col: usize,
        block: &[Vec<String>],
    ) {
        let day_count = table.day_count();
        for (i, values) in block.iter().enumerate() {
            let r = start_row + i;
            if r >= table.rows.len() {
                break;
            }
            for (j, value) in values.iter().enumerate() {
                if let Some(col) = Column::from_index(start_col + j, day_count) {
                    table.rows[r].set_value(col, value);
                }
            }
        }
        Self::recompute(table);
    }

    /// 批量清空单元：日列落 0，文本列落空串
    pub fn clear_cells(table: &mut CalendarTable, cells: &[(usize, Column)]) {
        for &(row, col) in cells {
            if let Some(target) = table.rows.get_mut(row) {
                target.set_value(col, "");
            }
        }
        Self::recompute(table);
    }

    /// 清空全部 OID 单元（切出指定日模式时调用）
    pub fn clear_all_oids(table: &mut CalendarTable) {
        for row in &mut table.rows {
            row.oid.clear();
        }
    }

    /// 按列排序数据行；重复点击同列时翻转方向
    pub fn sort_by(table: &mut CalendarTable, col: Column) {
        let direction = match table.sort_state {
            Some((current, d)) if current == col => d.toggled(),
            _ => SortDirection::Ascending,
        };
        table.rows.sort_by(|a, b| {
            let ord = if col.is_numeric() {
                let av = a.value(col).trim().parse::<f64>().unwrap_or(0.0);
                let bv = b.value(col).trim().parse::<f64>().unwrap_or(0.0);
                av.partial_cmp(&bv).unwrap_or(Ordering::Equal)
            } else {
                a.value(col).cmp(&b.value(col))
            };
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        table.sort_state = Some((col, direction));
    }

    /// 调整投放起始日：结束日跟随平移，保持天数与各单元的相对位置不变
    pub fn set_campaign_start(table: &mut CalendarTable, new_start: chrono::NaiveDate) {
        let span = table.end_date - table.start_date;
        table.start_date = new_start;
        table.end_date = new_start + span;
    }

    /// 调整投放结束日：早于起始日时收敛为单日；缩短截断，延长补 0
    pub fn set_campaign_end(table: &mut CalendarTable, new_end: chrono::NaiveDate) {
        let new_end = new_end.max(table.start_date);
        table.end_date = new_end;
        let day_count = table.day_count();

        for row in &mut table.rows {
            row.day_cells.resize(day_count, 0);
        }
        table.total.day_cells.resize(day_count, 0);
        Self::recompute(table);
    }

    /// 把日历表回写为结构化订单的播出记录
    ///
    /// 无播出的行丢弃；单元值为 N 的日期重复记 N 次
    pub fn update_booking_order(table: &CalendarTable, order: &mut BookingOrder) {
        let mut spots = Vec::new();
        for row in &table.rows {
            let mut dates = Vec::new();
            for (i, &count) in row.day_cells.iter().enumerate() {
                for _ in 0..count.max(0) {
                    dates.push(table.date_at(i));
                }
            }
            if dates.is_empty() {
                continue;
            }
            spots.push(Spot {
                programme_name: row.programme.clone(),
                programme_start_time: row.time.clone(),
                duration: row.dur.clone(),
                total_spots: dates.len() as i64,
                dates,
            });
        }

        order.total_spots = spots.iter().map(|s| s.total_spots).sum();
        order.spots = spots;
        order.campaign_period.start_date = table.start_date;
        order.campaign_period.end_date = table.end_date;
    }
}

/// 提取字符串中的数字字符（"30 sec" → "30"）
fn digits_of(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CampaignPeriod;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_order() -> BookingOrder {
        BookingOrder {
            agency: "MediaHub".to_string(),
            advertiser: "Acme".to_string(),
            product: "Zoom".to_string(),
            company_name: "MediaHub".to_string(),
            campaign_period: CampaignPeriod::new(date(2025, 6, 1), date(2025, 6, 5)),
            gross_cost: 1000.0,
            total_spots: 5,
            spots: vec![
                Spot {
                    programme_name: "News Hour".to_string(),
                    programme_start_time: "20:00".to_string(),
                    duration: "30 sec".to_string(),
                    dates: vec![date(2025, 6, 1), date(2025, 6, 1), date(2025, 6, 3)],
                    total_spots: 3,
                },
                Spot {
                    programme_name: "Quiz Night".to_string(),
                    programme_start_time: "21:00".to_string(),
                    duration: "41".to_string(),
                    dates: vec![date(2025, 6, 2)],
                    total_spots: 1,
                },
                // 与首条同组，合入同一行
                Spot {
                    programme_name: "News Hour".to_string(),
                    programme_start_time: "20:00".to_string(),
                    duration: "30".to_string(),
                    dates: vec![date(2025, 6, 5)],
                    total_spots: 1,
                },
            ],
        }
    }

    #[test]
    fn test_build_groups_by_programme_and_time() {
        let table = CalendarEngine::build_from_order(&sample_order());
        assert_eq!(table.rows.len(), 2);

        let news = &table.rows[0];
        assert_eq!(news.programme, "News Hour");
        assert_eq!(news.dur, "30");
        assert_eq!(news.fp, "P");
        assert_eq!(news.sales_type, "WN");
        assert_eq!(news.day_cells, vec![2, 0, 1, 0, 1]);
        assert_eq!(news.total_spots, 4);

        assert_eq!(table.rows[1].day_cells, vec![0, 1, 0, 0, 0]);
        assert_eq!(table.total.day_cells, vec![2, 1, 1, 0, 1]);
        assert_eq!(table.total.total_spots, 5);
        assert_eq!(table.total.programme, "Total");
    }

    #[test]
    fn test_shift_start_preserves_relative_cells() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        let before: Vec<Vec<i32>> = table.rows.iter().map(|r| r.day_cells.clone()).collect();

        CalendarEngine::set_campaign_start(&mut table, date(2025, 6, 4));

        assert_eq!(table.start_date, date(2025, 6, 4));
        assert_eq!(table.end_date, date(2025, 6, 8));
        let after: Vec<Vec<i32>> = table.rows.iter().map(|r| r.day_cells.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_extend_end_zero_fills() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        CalendarEngine::set_campaign_end(&mut table, date(2025, 6, 7));

        assert_eq!(table.day_count(), 7);
        assert_eq!(table.rows[0].day_cells, vec![2, 0, 1, 0, 1, 0, 0]);
        assert_eq!(table.rows[0].total_spots, 4);
    }

    #[test]
    fn test_shrink_end_truncates_and_clamps() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        CalendarEngine::set_campaign_end(&mut table, date(2025, 6, 2));
        assert_eq!(table.rows[0].day_cells, vec![2, 0]);
        assert_eq!(table.rows[0].total_spots, 2);

        // 结束日早于起始日时收敛为单日
        CalendarEngine::set_campaign_end(&mut table, date(2025, 5, 1));
        assert_eq!(table.end_date, table.start_date);
        assert_eq!(table.day_count(), 1);
    }

    #[test]
    fn test_sort_toggles_direction() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        CalendarEngine::sort_by(&mut table, Column::TotalSpots);
        assert_eq!(table.rows[0].programme, "Quiz Night");

        CalendarEngine::sort_by(&mut table, Column::TotalSpots);
        assert_eq!(table.rows[0].programme, "News Hour");

        // 换列排序回到升序
        CalendarEngine::sort_by(&mut table, Column::Programme);
        assert_eq!(table.rows[0].programme, "News Hour");
        assert_eq!(
            table.sort_state,
            Some((Column::Programme, SortDirection::Ascending))
        );
    }

    #[test]
    fn test_paste_block_with_clipping() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        let day_count = table.day_count();
        let block = vec![
            vec!["60".to_string(), "1.5".to_string()],
            vec!["15".to_string(), "2".to_string()],
            // 超出数据行，丢弃
            vec!["99".to_string(), "9".to_string()],
        ];
        CalendarEngine::paste(&mut table, 0, Column::Dur.index(day_count), &block);

        assert_eq!(table.rows[0].dur, "60");
        assert_eq!(table.rows[0].ratio, "1.5");
        assert_eq!(table.rows[1].dur, "15");
    }

    #[test]
    fn test_paste_day_cells_lenient_and_total_protected() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        let day_count = table.day_count();
        let block = vec![vec![
            "7".to_string(),
            "abc".to_string(),
            "3".to_string(),
            "1".to_string(),
            "0".to_string(),
            "999".to_string(), // 合计列，拒收
        ]];
        CalendarEngine::paste(&mut table, 0, Column::Day(0).index(day_count), &block);

        assert_eq!(table.rows[0].day_cells, vec![7, 0, 3, 1, 0]);
        assert_eq!(table.rows[0].total_spots, 11);
        assert_eq!(table.total.total_spots, 12);
    }

    #[test]
    fn test_duplicate_and_delete_rows() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        CalendarEngine::duplicate_rows(&mut table, &[1, 0]);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0].programme, "News Hour");
        assert_eq!(table.rows[1].programme, "Quiz Night");
        assert_eq!(table.total.total_spots, 10);

        CalendarEngine::delete_rows(&mut table, &[0, 1]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.total.total_spots, 5);
    }

    #[test]
    fn test_batch_scope_defers_recompute() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        {
            let mut scope = CalendarEngine::begin_batch(&mut table);
            scope.rows[0].day_cells[1] = 9;
            CalendarEngine::recompute(&mut scope);
            // 作用域内重算被抑制
            assert_eq!(scope.total.day_cells[1], 1);
        }
        assert_eq!(table.total.day_cells[1], 10);
        assert_eq!(table.rows[0].total_spots, 13);
    }

    #[test]
    fn test_update_booking_order_from_table() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        // 清空第二行，应被回写丢弃
        let cells: Vec<(usize, Column)> = (0..table.day_count()).map(|i| (1, Column::Day(i))).collect();
        CalendarEngine::clear_cells(&mut table, &cells);

        let mut order = sample_order();
        CalendarEngine::update_booking_order(&table, &mut order);

        assert_eq!(order.spots.len(), 1);
        assert_eq!(order.spots[0].programme_name, "News Hour");
        assert_eq!(
            order.spots[0].dates,
            vec![date(2025, 6, 1), date(2025, 6, 1), date(2025, 6, 3), date(2025, 6, 5)]
        );
        assert_eq!(order.total_spots, 4);
    }

    #[test]
    fn test_insert_row_defaults() {
        let mut table = CalendarEngine::build_from_order(&sample_order());
        CalendarEngine::insert_row(&mut table, 1);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1].fp, "P");
        assert_eq!(table.rows[1].sales_type, "WN");

        // 越界位置退化为追加
        CalendarEngine::insert_row(&mut table, 99);
        assert_eq!(table.rows.len(), 4);
    }
}
