// ==========================================
// 广告排播订单管理系统 - 日历表投影
// ==========================================
// 由 BookingOrder 派生的可编辑网格：
// 每个 (节目, 时段) 一行，投放期内每天一个整数单元
// 红线: 合计行是独立字段，结构上保证“永远在最后、永不可编辑”
// ==========================================

use crate::domain::types::SortDirection;
use chrono::NaiveDate;

/// 元数据列数（OID..Price in US $）
pub const META_COLUMN_COUNT: usize = 11;

/// 日历表列标识
///
/// Day(i) 表示投放期第 i 天（0 基）；TotalSpots 为派生列，不接受编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Oid,
    Time,
    Programme,
    Fp,
    Dur,
    Ratio,
    SalesType,
    Ord,
    SponsorType,
    UnitPrice,
    PriceUsd,
    Day(usize),
    TotalSpots,
}

impl Column {
    /// 网格中的列序号（粘贴等块操作按此顺序横向推进）
    pub fn index(&self, day_count: usize) -> usize {
        match self {
            Column::Oid => 0,
            Column::Time => 1,
            Column::Programme => 2,
            Column::Fp => 3,
            Column::Dur => 4,
            Column::Ratio => 5,
            Column::SalesType => 6,
            Column::Ord => 7,
            Column::SponsorType => 8,
            Column::UnitPrice => 9,
            Column::PriceUsd => 10,
            Column::Day(i) => META_COLUMN_COUNT + i,
            Column::TotalSpots => META_COLUMN_COUNT + day_count,
        }
    }

    /// 由列序号还原列标识（越界返回 None）
    pub fn from_index(idx: usize, day_count: usize) -> Option<Column> {
        match idx {
            0 => Some(Column::Oid),
            1 => Some(Column::Time),
            2 => Some(Column::Programme),
            3 => Some(Column::Fp),
            4 => Some(Column::Dur),
            5 => Some(Column::Ratio),
            6 => Some(Column::SalesType),
            7 => Some(Column::Ord),
            8 => Some(Column::SponsorType),
            9 => Some(Column::UnitPrice),
            10 => Some(Column::PriceUsd),
            i if i < META_COLUMN_COUNT + day_count => Some(Column::Day(i - META_COLUMN_COUNT)),
            i if i == META_COLUMN_COUNT + day_count => Some(Column::TotalSpots),
            _ => None,
        }
    }

    /// 是否按数值比较（排序用）：日列与合计列
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Day(_) | Column::TotalSpots)
    }
}

/// 日历表数据行
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarRow {
    pub oid: String,
    pub time: String,
    pub programme: String,
    pub fp: String,
    pub dur: String,
    pub ratio: String,
    pub sales_type: String,
    pub ord: String,
    pub sponsor_type: String,
    pub unit_price: String,
    pub price_usd: String,
    /// 每个投放日的条数（0 也存储，展示层负责留白）
    pub day_cells: Vec<i32>,
    /// 行合计，恒等于 day_cells 之和
    pub total_spots: i32,
}

impl CalendarRow {
    /// 全空行（合计行模板）
    pub fn empty(day_count: usize) -> Self {
        Self {
            oid: String::new(),
            time: String::new(),
            programme: String::new(),
            fp: String::new(),
            dur: String::new(),
            ratio: String::new(),
            sales_type: String::new(),
            ord: String::new(),
            sponsor_type: String::new(),
            unit_price: String::new(),
            price_usd: String::new(),
            day_cells: vec![0; day_count],
            total_spots: 0,
        }
    }

    /// 新数据行（带默认 F/P 与 Sales Type）
    pub fn blank(day_count: usize) -> Self {
        let mut row = Self::empty(day_count);
        row.fp = "P".to_string();
        row.sales_type = "WN".to_string();
        row
    }

    /// 重算行合计
    pub fn recompute_total(&mut self) {
        self.total_spots = self.day_cells.iter().sum();
    }

    /// 按列读取展示值
    pub fn value(&self, col: Column) -> String {
        match col {
            Column::Oid => self.oid.clone(),
            Column::Time => self.time.clone(),
            Column::Programme => self.programme.clone(),
            Column::Fp => self.fp.clone(),
            Column::Dur => self.dur.clone(),
            Column::Ratio => self.ratio.clone(),
            Column::SalesType => self.sales_type.clone(),
            Column::Ord => self.ord.clone(),
            Column::SponsorType => self.sponsor_type.clone(),
            Column::UnitPrice => self.unit_price.clone(),
            Column::PriceUsd => self.price_usd.clone(),
            Column::Day(i) => self
                .day_cells
                .get(i)
                .map(|v| v.to_string())
                .unwrap_or_default(),
            Column::TotalSpots => self.total_spots.to_string(),
        }
    }

    /// 按列写入（日列宽松解析，非整数落 0；合计列拒绝写入）
    pub fn set_value(&mut self, col: Column, raw: &str) {
        match col {
            Column::Oid => self.oid = raw.to_string(),
            Column::Time => self.time = raw.to_string(),
            Column::Programme => self.programme = raw.to_string(),
            Column::Fp => self.fp = raw.to_string(),
            Column::Dur => self.dur = raw.to_string(),
            Column::Ratio => self.ratio = raw.to_string(),
            Column::SalesType => self.sales_type = raw.to_string(),
            Column::Ord => self.ord = raw.to_string(),
            Column::SponsorType => self.sponsor_type = raw.to_string(),
            Column::UnitPrice => self.unit_price = raw.to_string(),
            Column::PriceUsd => self.price_usd = raw.to_string(),
            Column::Day(i) => {
                if let Some(cell) = self.day_cells.get_mut(i) {
                    // 日列只接受非负条数，负数落 0
                    *cell = raw.trim().parse::<i32>().unwrap_or(0).max(0);
                }
            }
            Column::TotalSpots => {}
        }
    }
}

/// 日历表
///
/// total 为合计行：仅由 recompute 写入，排序/编辑/粘贴一律不触碰
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarTable {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rows: Vec<CalendarRow>,
    pub total: CalendarRow,
    /// 当前排序列与方向（至多一列处于排序态）
    pub sort_state: Option<(Column, SortDirection)>,
    /// 批量编辑深度：大于 0 时重算请求被抑制，由批量作用域结束时统一重算
    pub(crate) batch_depth: u32,
}

impl CalendarTable {
    /// 空表（无数据行，仅合计行）
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let day_count = ((end_date - start_date).num_days() + 1).max(0) as usize;
        Self {
            start_date,
            end_date,
            rows: Vec::new(),
            total: CalendarRow::empty(day_count),
            sort_state: None,
            batch_depth: 0,
        }
    }

    /// 投放天数
    pub fn day_count(&self) -> usize {
        ((self.end_date - self.start_date).num_days() + 1).max(0) as usize
    }

    /// 第 i 个投放日的日期
    pub fn date_at(&self, day_index: usize) -> NaiveDate {
        self.start_date + chrono::Duration::days(day_index as i64)
    }

    /// 日期对应的日列序号（不在投放期内返回 None）
    pub fn day_index_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start_date || date > self.end_date {
            return None;
        }
        Some((date - self.start_date).num_days() as usize)
    }

    /// 投放期内全部日期
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.day_count()).map(|i| self.date_at(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_column_index_round_trip() {
        let day_count = 5;
        for idx in 0..(META_COLUMN_COUNT + day_count + 1) {
            let col = Column::from_index(idx, day_count).unwrap();
            assert_eq!(col.index(day_count), idx);
        }
        assert!(Column::from_index(META_COLUMN_COUNT + day_count + 1, day_count).is_none());
    }

    #[test]
    fn test_day_index_of_bounds() {
        let table = CalendarTable::new(date(2025, 6, 1), date(2025, 6, 5));
        assert_eq!(table.day_count(), 5);
        assert_eq!(table.day_index_of(date(2025, 6, 1)), Some(0));
        assert_eq!(table.day_index_of(date(2025, 6, 5)), Some(4));
        assert_eq!(table.day_index_of(date(2025, 5, 31)), None);
        assert_eq!(table.day_index_of(date(2025, 6, 6)), None);
    }

    #[test]
    fn test_row_set_value_day_cell_lenient() {
        let mut row = CalendarRow::blank(3);
        row.set_value(Column::Day(1), "4");
        assert_eq!(row.day_cells, vec![0, 4, 0]);
        row.set_value(Column::Day(1), "abc");
        assert_eq!(row.day_cells, vec![0, 0, 0]);
        row.set_value(Column::Day(1), "-3");
        assert_eq!(row.day_cells, vec![0, 0, 0]);
        // 合计列拒绝写入
        row.total_spots = 7;
        row.set_value(Column::TotalSpots, "99");
        assert_eq!(row.total_spots, 7);
    }

    #[test]
    fn test_blank_row_defaults() {
        let row = CalendarRow::blank(2);
        assert_eq!(row.fp, "P");
        assert_eq!(row.sales_type, "WN");
        assert_eq!(row.day_cells, vec![0, 0]);
    }
}
