// ==========================================
// 广告排播订单管理系统 - 历史播出记录仓储
// ==========================================
// 职责: 管理spot_history表的联想与反查
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::OidDetails;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 时段联想返回条数上限
const TIME_SUGGESTION_LIMIT: usize = 20;

// ==========================================
// GridLookup - 历史记录查询接口
// ==========================================

/// 历史播出记录查询接口
/// 表格编辑时的 F/P 回填、OID 反查与联想输入都走这里
pub trait GridLookup: Send + Sync {
    /// 按节目+时段在日期范围内查付费比率（取最大值）
    fn payment_ratio(
        &self,
        programme: &str,
        start_time: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Option<String>>;

    /// 按 OID + 播出日反查时段/节目/付费比率
    fn oid_details(&self, oid: i64, date: NaiveDate) -> RepositoryResult<Option<OidDetails>>;

    /// 时段联想（前缀匹配，HH:mm 去重，最多 20 条）
    fn time_suggestions(
        &self,
        prefix: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<String>>;

    /// 按时段列出节目（可叠加名称子串过滤）
    fn programme_suggestions(
        &self,
        start_time: &str,
        search: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<String>>;
}

// ==========================================
// SqliteGridRepository - SQLite 实现
// ==========================================

/// 历史播出记录仓储
pub struct SqliteGridRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGridRepository {
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

/// 时段统一到 HH:mm:ss（表中按秒存储，表格按 HH:mm 展示）
fn to_db_time(time: &str) -> String {
    if time.len() == 5 {
        format!("{time}:00")
    } else {
        time.to_string()
    }
}

impl GridLookup for SqliteGridRepository {
    fn payment_ratio(
        &self,
        programme: &str,
        start_time: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT payment_ratio
            FROM spot_history
            WHERE programme = ?1 AND start_time = ?2
              AND air_date >= ?3 AND air_date <= ?4
            ORDER BY payment_ratio DESC
            LIMIT 1
            "#,
        )?;

        let ratio = stmt
            .query_row(
                params![
                    programme,
                    to_db_time(start_time),
                    from.format("%Y-%m-%d").to_string(),
                    to.format("%Y-%m-%d").to_string()
                ],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(ratio)
    }

    fn oid_details(&self, oid: i64, date: NaiveDate) -> RepositoryResult<Option<OidDetails>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT start_time, programme, payment_ratio
            FROM spot_history
            WHERE oid = ?1 AND air_date = ?2
            LIMIT 1
            "#,
        )?;

        let details = stmt
            .query_row(
                params![oid, date.format("%Y-%m-%d").to_string()],
                |row| {
                    Ok(OidDetails {
                        time: row.get(0)?,
                        programme: row.get(1)?,
                        fp: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(details)
    }

    fn time_suggestions(
        &self,
        prefix: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT start_time
            FROM spot_history
            WHERE air_date >= ?1 AND air_date <= ?2
              AND start_time LIKE ?3
            ORDER BY start_time
            LIMIT ?4
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string(),
                format!("{prefix}%"),
                TIME_SUGGESTION_LIMIT as i64
            ],
            |row| row.get::<_, String>(0),
        )?;

        // HH:mm:ss 截断为 HH:mm 后再去重
        let mut times = Vec::new();
        for row in rows {
            let t = row?;
            let short = if t.len() >= 5 { t[..5].to_string() } else { t };
            if !times.contains(&short) {
                times.push(short);
            }
        }
        Ok(times)
    }

    fn programme_suggestions(
        &self,
        start_time: &str,
        search: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT programme
            FROM spot_history
            WHERE start_time = ?1
              AND air_date >= ?2 AND air_date <= ?3
              AND programme LIKE ?4
            ORDER BY programme
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                to_db_time(start_time),
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string(),
                format!("%{search}%")
            ],
            |row| row.get::<_, String>(0),
        )?;

        let mut programmes = Vec::new();
        for row in rows {
            programmes.push(row?);
        }
        Ok(programmes)
    }
}
