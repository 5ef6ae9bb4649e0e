// ==========================================
// 广告排播订单管理系统 - 交易仓储
// ==========================================
// 职责: 管理deal/booking/booking_spot表的读写
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::{BookingLine, DealInfo};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 待写入的排播行（时长×费率期 分组的入账记录）
#[derive(Debug, Clone)]
pub struct NewBookingLine {
    pub ord: i64,
    pub schedule: i64,
    pub duration_secs: i64,
    pub period_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub product: String,
    pub spots: i64,
    pub space: i64,
    pub net_amount: f64,
}

/// 待写入的单条播出记录
#[derive(Debug, Clone)]
pub struct NewSpotRow {
    pub ord: i64,
    pub schedule: i64,
    pub programme: String,
    pub start_time: String,
    pub sales_type: String,
    pub unit_price: String,
    pub air_date: NaiveDate,
    pub duration_secs: i64,
    pub agency: String,
    pub advertiser: String,
    pub product: String,
}

// ==========================================
// DealRepository - 交易读写接口
// ==========================================

/// 交易读写接口
pub trait DealRepository: Send + Sync {
    /// 同广告主、投放期与给定范围有交集的既有交易
    fn find_overlapping_deals(
        &self,
        advertiser: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<DealInfo>>;

    /// 新建交易，返回交易号
    fn create_deal(
        &self,
        agency: &str,
        advertiser: &str,
        campaign_start: NaiveDate,
        campaign_end: NaiveDate,
    ) -> RepositoryResult<i64>;

    /// 交易下的既有排播行
    fn booking_lines(&self, deal_id: i64) -> RepositoryResult<Vec<BookingLine>>;

    /// 删除交易下的全部排播行及其播出记录（替换确认后调用）
    fn delete_deal_bookings(&self, deal_id: i64, lines: &[BookingLine]) -> RepositoryResult<()>;

    /// 下一组 (ord, schedule)，各自取全表最大值 + 1
    fn next_ord_and_schedule(&self) -> RepositoryResult<(i64, i64)>;

    /// 写入一条排播行
    fn insert_booking_line(&self, deal_id: i64, line: &NewBookingLine) -> RepositoryResult<i64>;

    /// 写入一条播出记录
    fn insert_spot(&self, spot: &NewSpotRow) -> RepositoryResult<()>;
}

// ==========================================
// SqliteDealRepository - SQLite 实现
// ==========================================

/// 交易仓储
pub struct SqliteDealRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDealRepository {
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

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(text: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| RepositoryError::DatabaseQueryError(format!("日期格式错误 '{text}': {e}")))
}

impl DealRepository for SqliteDealRepository {
    fn find_overlapping_deals(
        &self,
        advertiser: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<DealInfo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, agency, advertiser, c_start, c_end
            FROM deal
            WHERE advertiser = ?1 AND c_start <= ?2 AND c_end >= ?3
            ORDER BY c_start
            "#,
        )?;

        let rows = stmt.query_map(
            params![advertiser, fmt_date(to), fmt_date(from)],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )?;

        let mut deals = Vec::new();
        for row in rows {
            let (id, agency, advertiser, c_start, c_end) = row?;
            deals.push(DealInfo {
                id,
                agency,
                advertiser,
                campaign_start: parse_date(&c_start)?,
                campaign_end: parse_date(&c_end)?,
            });
        }
        Ok(deals)
    }

    fn create_deal(
        &self,
        agency: &str,
        advertiser: &str,
        campaign_start: NaiveDate,
        campaign_end: NaiveDate,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO deal (agency, advertiser, c_start, c_end, created)
            VALUES (?1, ?2, ?3, ?4, datetime('now'))
            "#,
            params![
                agency,
                advertiser,
                fmt_date(campaign_start),
                fmt_date(campaign_end)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn booking_lines(&self, deal_id: i64) -> RepositoryResult<Vec<BookingLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, ord, schedule, duration_secs, period, d_start, d_end,
                   spots, space, net_amount
            FROM booking
            WHERE deal_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![deal_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, f64>(9)?,
            ))
        })?;

        let mut lines = Vec::new();
        for row in rows {
            let (id, ord, schedule, duration, period_name, d_start, d_end, spots, space, net) =
                row?;
            lines.push(BookingLine {
                id,
                ord,
                schedule,
                duration,
                period_name,
                start_date: parse_date(&d_start)?,
                end_date: parse_date(&d_end)?,
                spots,
                space,
                net_amount: net,
            });
        }
        Ok(lines)
    }

    fn delete_deal_bookings(&self, deal_id: i64, lines: &[BookingLine]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for line in lines {
            tx.execute(
                "DELETE FROM booking_spot WHERE ord = ?1 AND schedule = ?2",
                params![line.ord, line.schedule],
            )?;
        }
        tx.execute("DELETE FROM booking WHERE deal_id = ?1", params![deal_id])?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    fn next_ord_and_schedule(&self) -> RepositoryResult<(i64, i64)> {
        let conn = self.get_conn()?;
        let ord: i64 = conn.query_row(
            "SELECT IFNULL(MAX(ord), 0) + 1 FROM booking",
            [],
            |row| row.get(0),
        )?;
        let schedule: i64 = conn.query_row(
            "SELECT IFNULL(MAX(schedule), 0) + 1 FROM booking",
            [],
            |row| row.get(0),
        )?;
        Ok((ord, schedule))
    }

    fn insert_booking_line(&self, deal_id: i64, line: &NewBookingLine) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO booking
                (deal_id, ord, schedule, duration_secs, period, d_start, d_end,
                 product, spots, space, net_amount)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                deal_id,
                line.ord,
                line.schedule,
                line.duration_secs,
                line.period_name,
                fmt_date(line.start_date),
                fmt_date(line.end_date),
                line.product,
                line.spots,
                line.space,
                line.net_amount
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_spot(&self, spot: &NewSpotRow) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO booking_spot
                (ord, schedule, programme, start_time, sales_type, unit_price,
                 air_date, dur, agency, advertiser, product)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                spot.ord,
                spot.schedule,
                spot.programme,
                spot.start_time,
                spot.sales_type,
                spot.unit_price,
                fmt_date(spot.air_date),
                spot.duration_secs,
                spot.agency,
                spot.advertiser,
                spot.product
            ],
        )?;
        Ok(())
    }
}
