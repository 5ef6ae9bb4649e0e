// ==========================================
// 广告排播订单管理系统 - 费率卡仓储
// ==========================================
// 职责: 管理rate_card/rate_period表的查询
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::RatePeriod;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// RateCardLookup - 费率查询接口
// ==========================================

/// 费率卡查询接口
pub trait RateCardLookup: Send + Sync {
    /// 按时长（秒）查比率
    fn ratio_by_duration(&self, duration_secs: i64) -> RepositoryResult<Option<String>>;

    /// 与给定日期范围有交集的费率期，按起始日期排序
    fn rate_periods(&self, from: NaiveDate, to: NaiveDate) -> RepositoryResult<Vec<RatePeriod>>;
}

// ==========================================
// SqliteRateRepository - SQLite 实现
// ==========================================

/// 费率卡仓储
pub struct SqliteRateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRateRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl RateCardLookup for SqliteRateRepository {
    fn ratio_by_duration(&self, duration_secs: i64) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT ratio FROM rate_card WHERE duration_secs = ?1")?;
        let ratio = stmt
            .query_row(params![duration_secs], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(ratio)
    }

    fn rate_periods(&self, from: NaiveDate, to: NaiveDate) -> RepositoryResult<Vec<RatePeriod>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, period, start_date, end_date
            FROM rate_period
            WHERE start_date <= ?1 AND end_date >= ?2
            ORDER BY start_date
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                to.format("%Y-%m-%d").to_string(),
                from.format("%Y-%m-%d").to_string()
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )?;

        let mut periods = Vec::new();
        for row in rows {
            let (id, name, start, end) = row?;
            periods.push(RatePeriod {
                id,
                name,
                start_date: parse_date(&start)?,
                end_date: parse_date(&end)?,
            });
        }
        Ok(periods)
    }
}

/// 解析库中的 yyyy-MM-dd 日期
fn parse_date(text: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| RepositoryError::DatabaseQueryError(format!("日期格式错误 '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, open_in_memory_connection};

    fn repo() -> SqliteRateRepository {
        let conn = open_in_memory_connection().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO rate_card (duration_secs, ratio) VALUES (30, '1'), (41, '1.5');
            INSERT INTO rate_period (period, start_date, end_date) VALUES
                ('Spring', '2025-03-01', '2025-05-31'),
                ('Summer', '2025-06-01', '2025-08-31'),
                ('Autumn', '2025-09-01', '2025-11-30');
            "#,
        )
        .unwrap();
        SqliteRateRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ratio_by_duration() {
        let repo = repo();
        assert_eq!(repo.ratio_by_duration(41).unwrap(), Some("1.5".to_string()));
        assert_eq!(repo.ratio_by_duration(60).unwrap(), None);
    }

    #[test]
    fn test_rate_periods_overlapping_range() {
        let repo = repo();
        let periods = repo
            .rate_periods(date(2025, 5, 15), date(2025, 6, 15))
            .unwrap();
        let names: Vec<&str> = periods.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Spring", "Summer"]);
        assert_eq!(periods[1].start_date, date(2025, 6, 1));
    }
}
