// ==========================================
// 广告排播订单管理系统 - 编辑联动引擎
// ==========================================
// 职责: 单元编辑后的归一化、校验与历史数据回填
// 红线: 查询失败只降级为不回填并记录告警，编辑本身不报数据库错误
// ==========================================

use crate::config::AppConfig;
use crate::domain::types::GridMode;
use crate::domain::{CalendarTable, Column};
use crate::engine::calendar::CalendarEngine;
use crate::engine::{EngineError, EngineResult};
use crate::repository::{GridLookup, RateCardLookup};
use chrono::NaiveDate;
use std::sync::Arc;

/// 编辑联动引擎
pub struct AutoFillEngine {
    grid: Arc<dyn GridLookup>,
    rates: Arc<dyn RateCardLookup>,
    max_duration_secs: i64,
    max_broadcast_hour: u32,
}

impl AutoFillEngine {
    pub fn new(grid: Arc<dyn GridLookup>, rates: Arc<dyn RateCardLookup>, config: &AppConfig) -> Self {
        Self {
            grid,
            rates,
            max_duration_secs: config.max_duration_secs,
            max_broadcast_hour: config.max_broadcast_hour,
        }
    }

    /// 时段输入归一化为 HH:mm
    ///
    /// 只看数字字符：1 位补为整点，2 位视为小时，3 位首位补 0，
    /// 超过 4 位截断。小时超上限（跨午夜可到 29）或分钟超 59 时拒绝。
    pub fn normalize_time(&self, input: &str) -> Option<String> {
        let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
        let padded = match digits.len() {
            0 => return None,
            1 => format!("0{digits}00"),
            2 => format!("{digits}00"),
            3 => format!("0{digits}"),
            _ => digits[..4].to_string(),
        };

        let hours: u32 = padded[..2].parse().ok()?;
        let minutes: u32 = padded[2..4].parse().ok()?;
        if hours > self.max_broadcast_hour || minutes > 59 {
            return None;
        }
        Some(format!("{hours:02}:{minutes:02}"))
    }

    /// Time 列编辑完成
    ///
    /// 归一化失败时清空单元并报校验错误；该时段在投放期内
    /// 恰有一个历史节目时自动补节目名与 F/P
    pub fn on_time_edited(
        &self,
        table: &mut CalendarTable,
        row: usize,
        raw: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<()> {
        let Some(time) = self.normalize_time(raw) else {
            CalendarEngine::set_cell(table, row, Column::Time, "")?;
            return Err(EngineError::Validation(format!("时段格式无效: {raw}")));
        };
        CalendarEngine::set_cell(table, row, Column::Time, &time)?;

        let programmes = self
            .grid
            .programme_suggestions(&time, "", from, to)
            .unwrap_or_else(|e| {
                tracing::warn!("节目联想查询失败: {}", e);
                Vec::new()
            });
        if let [only] = programmes.as_slice() {
            let programme = only.clone();
            CalendarEngine::set_cell(table, row, Column::Programme, &programme)?;
            self.fill_fp(table, row, from, to)?;
        }
        Ok(())
    }

    /// Programme 列编辑完成：时段已填时回填 F/P
    pub fn on_programme_edited(
        &self,
        table: &mut CalendarTable,
        row: usize,
        raw: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<()> {
        CalendarEngine::set_cell(table, row, Column::Programme, raw)?;
        self.fill_fp(table, row, from, to)
    }

    /// OID 列编辑完成（仅指定日模式可编辑）
    ///
    /// 非整数输入清空单元并报校验错误；合法 OID 反查并回填
    /// 时段（截为 HH:mm）、节目与 F/P
    pub fn on_oid_edited(
        &self,
        table: &mut CalendarTable,
        row: usize,
        raw: &str,
        mode: GridMode,
        specific_date: NaiveDate,
    ) -> EngineResult<()> {
        if mode != GridMode::SpecificDate {
            return Err(EngineError::Validation(
                "OID 列仅在指定日模式下可编辑".to_string(),
            ));
        }
        let Ok(oid) = raw.trim().parse::<i64>() else {
            CalendarEngine::set_cell(table, row, Column::Oid, "")?;
            return Err(EngineError::Validation(format!("OID 必须为整数: {raw}")));
        };
        CalendarEngine::set_cell(table, row, Column::Oid, raw.trim())?;

        let details = self.grid.oid_details(oid, specific_date).unwrap_or_else(|e| {
            tracing::warn!(oid, "OID 反查失败: {}", e);
            None
        });
        if let Some(details) = details {
            let time = if details.time.len() > 5 {
                details.time[..5].to_string()
            } else {
                details.time.clone()
            };
            CalendarEngine::set_cell(table, row, Column::Time, &time)?;
            CalendarEngine::set_cell(table, row, Column::Programme, &details.programme)?;
            CalendarEngine::set_cell(table, row, Column::Fp, &details.fp)?;
        }
        Ok(())
    }

    /// Dur 列编辑完成
    ///
    /// 超出 [0, 上限] 或非整数时清空单元并报校验错误；合法时回填 Ratio
    pub fn on_dur_edited(&self, table: &mut CalendarTable, row: usize, raw: &str) -> EngineResult<()> {
        let dur = raw.trim().parse::<i64>().ok().filter(|d| (0..=self.max_duration_secs).contains(d));
        let Some(dur) = dur else {
            CalendarEngine::set_cell(table, row, Column::Dur, "")?;
            return Err(EngineError::Validation(format!(
                "时长必须是 0~{} 的整数: {raw}",
                self.max_duration_secs
            )));
        };
        CalendarEngine::set_cell(table, row, Column::Dur, raw.trim())?;

        let ratio = self.rates.ratio_by_duration(dur).unwrap_or_else(|e| {
            tracing::warn!(dur, "费率查询失败: {}", e);
            None
        });
        if let Some(ratio) = ratio {
            CalendarEngine::set_cell(table, row, Column::Ratio, &ratio)?;
        }
        Ok(())
    }

    /// 导入完成后的整表回填：逐行补 Ratio 与 F/P
    ///
    /// 批量作用域内执行，结束时统一重算一次
    pub fn auto_fill_after_load(
        &self,
        table: &mut CalendarTable,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<()> {
        let mut scope = CalendarEngine::begin_batch(table);
        for row in 0..scope.rows.len() {
            let dur = scope.rows[row].dur.trim().parse::<i64>().ok();
            if let Some(dur) = dur {
                let ratio = self.rates.ratio_by_duration(dur).unwrap_or_else(|e| {
                    tracing::warn!(dur, "费率查询失败: {}", e);
                    None
                });
                if let Some(ratio) = ratio {
                    scope.rows[row].ratio = ratio;
                }
            }
            self.fill_fp(&mut scope, row, from, to)?;
        }
        Ok(())
    }

    /// 按当前行的 (节目, 时段) 查历史付费比率并回填 F/P
    fn fill_fp(
        &self,
        table: &mut CalendarTable,
        row: usize,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<()> {
        let Some(target) = table.rows.get(row) else {
            return Err(EngineError::Validation(format!("行号越界: {row}")));
        };
        let (programme, time) = (target.programme.clone(), target.time.clone());
        if programme.trim().is_empty() || time.trim().is_empty() {
            return Ok(());
        }

        let ratio = self
            .grid
            .payment_ratio(&programme, &time, from, to)
            .unwrap_or_else(|e| {
                tracing::warn!(%programme, %time, "付费比率查询失败: {}", e);
                None
            });
        if let Some(ratio) = ratio {
            CalendarEngine::set_cell(table, row, Column::Fp, &ratio)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OidDetails;
    use crate::repository::error::RepositoryResult;

    struct FakeGrid;

    impl GridLookup for FakeGrid {
        fn payment_ratio(
            &self,
            programme: &str,
            _start_time: &str,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> RepositoryResult<Option<String>> {
            Ok((programme == "News Hour").then(|| "F".to_string()))
        }

        fn oid_details(&self, oid: i64, _date: NaiveDate) -> RepositoryResult<Option<OidDetails>> {
            Ok((oid == 42).then(|| OidDetails {
                time: "18:30:00".to_string(),
                programme: "Quiz Night".to_string(),
                fp: "P".to_string(),
            }))
        }

        fn time_suggestions(
            &self,
            _prefix: &str,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> RepositoryResult<Vec<String>> {
            Ok(vec![])
        }

        fn programme_suggestions(
            &self,
            start_time: &str,
            _search: &str,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> RepositoryResult<Vec<String>> {
            Ok(match start_time {
                "20:00" => vec!["News Hour".to_string()],
                "21:00" => vec!["A".to_string(), "B".to_string()],
                _ => vec![],
            })
        }
    }

    struct FakeRates;

    impl RateCardLookup for FakeRates {
        fn ratio_by_duration(&self, duration_secs: i64) -> RepositoryResult<Option<String>> {
            Ok((duration_secs == 30).then(|| "1.5".to_string()))
        }

        fn rate_periods(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> RepositoryResult<Vec<crate::domain::RatePeriod>> {
            Ok(vec![])
        }
    }

    fn engine() -> AutoFillEngine {
        AutoFillEngine::new(Arc::new(FakeGrid), Arc::new(FakeRates), &AppConfig::default())
    }

    fn table() -> CalendarTable {
        let mut t = CalendarTable::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
        );
        t.rows.push(crate::domain::CalendarRow::blank(5));
        t
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
        )
    }

    #[test]
    fn test_normalize_time_padding() {
        let e = engine();
        assert_eq!(e.normalize_time("9"), Some("09:00".to_string()));
        assert_eq!(e.normalize_time("21"), Some("21:00".to_string()));
        assert_eq!(e.normalize_time("930"), Some("09:30".to_string()));
        assert_eq!(e.normalize_time("2130"), Some("21:30".to_string()));
        assert_eq!(e.normalize_time("21:304"), Some("21:30".to_string()));
        // 跨午夜时段放行到 29 点
        assert_eq!(e.normalize_time("2930"), Some("29:30".to_string()));
        assert_eq!(e.normalize_time("3000"), None);
        assert_eq!(e.normalize_time("2160"), None);
        assert_eq!(e.normalize_time("abc"), None);
    }

    #[test]
    fn test_time_edit_fills_unique_programme_and_fp() {
        let e = engine();
        let mut t = table();
        let (from, to) = range();
        e.on_time_edited(&mut t, 0, "2000", from, to).unwrap();

        assert_eq!(t.rows[0].time, "20:00");
        assert_eq!(t.rows[0].programme, "News Hour");
        assert_eq!(t.rows[0].fp, "F");
    }

    #[test]
    fn test_time_edit_ambiguous_programme_not_filled() {
        let e = engine();
        let mut t = table();
        let (from, to) = range();
        e.on_time_edited(&mut t, 0, "2100", from, to).unwrap();

        assert_eq!(t.rows[0].time, "21:00");
        assert_eq!(t.rows[0].programme, "");
    }

    #[test]
    fn test_invalid_time_clears_cell() {
        let e = engine();
        let mut t = table();
        t.rows[0].time = "20:00".to_string();
        let (from, to) = range();

        let err = e.on_time_edited(&mut t, 0, "9999", from, to).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(t.rows[0].time, "");
    }

    #[test]
    fn test_oid_edit_fills_details() {
        let e = engine();
        let mut t = table();
        let date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();

        e.on_oid_edited(&mut t, 0, "42", GridMode::SpecificDate, date)
            .unwrap();
        assert_eq!(t.rows[0].oid, "42");
        assert_eq!(t.rows[0].time, "18:30");
        assert_eq!(t.rows[0].programme, "Quiz Night");
        assert_eq!(t.rows[0].fp, "P");
    }

    #[test]
    fn test_oid_edit_rejected_outside_specific_date_mode() {
        let e = engine();
        let mut t = table();
        let date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();

        let err = e
            .on_oid_edited(&mut t, 0, "42", GridMode::CampaignDates, date)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_non_integer_oid_clears_cell() {
        let e = engine();
        let mut t = table();
        t.rows[0].oid = "7".to_string();
        let date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();

        let err = e
            .on_oid_edited(&mut t, 0, "x9", GridMode::SpecificDate, date)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(t.rows[0].oid, "");
    }

    #[test]
    fn test_dur_edit_validates_and_fills_ratio() {
        let e = engine();
        let mut t = table();

        e.on_dur_edited(&mut t, 0, "30").unwrap();
        assert_eq!(t.rows[0].dur, "30");
        assert_eq!(t.rows[0].ratio, "1.5");

        let err = e.on_dur_edited(&mut t, 0, "216").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(t.rows[0].dur, "");
    }

    #[test]
    fn test_auto_fill_after_load() {
        let e = engine();
        let mut t = table();
        t.rows[0].programme = "News Hour".to_string();
        t.rows[0].time = "20:00".to_string();
        t.rows[0].dur = "30".to_string();
        let (from, to) = range();

        e.auto_fill_after_load(&mut t, from, to).unwrap();
        assert_eq!(t.rows[0].ratio, "1.5");
        assert_eq!(t.rows[0].fp, "F");
    }
}
