// ==========================================
// 广告排播订单管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存数据库（测试用）
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化业务表结构（幂等）
///
/// 表说明：
/// - spot_history: 历史播出记录，支撑 F/P、OID、节目/时段联想查询
/// - rate_card:    时长→比率 对照表
/// - rate_period:  费率期（含名称与日期范围）
/// - deal:         交易主表
/// - booking:      交易下的排播行（按 时长×费率期 分组）
/// - booking_spot: 排播行下的单条播出记录
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS spot_history (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            oid           INTEGER NOT NULL,
            air_date      TEXT NOT NULL,
            start_time    TEXT NOT NULL,
            programme     TEXT NOT NULL,
            payment_ratio TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_spot_history_date ON spot_history(air_date);
        CREATE INDEX IF NOT EXISTS idx_spot_history_oid ON spot_history(oid, air_date);

        CREATE TABLE IF NOT EXISTS rate_card (
            duration_secs INTEGER PRIMARY KEY,
            ratio         TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rate_period (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            period     TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS deal (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            agency     TEXT NOT NULL DEFAULT '',
            advertiser TEXT NOT NULL,
            c_start    TEXT NOT NULL,
            c_end      TEXT NOT NULL,
            created    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS booking (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            deal_id       INTEGER NOT NULL REFERENCES deal(id),
            ord           INTEGER NOT NULL,
            schedule      INTEGER NOT NULL,
            duration_secs INTEGER NOT NULL,
            period        TEXT NOT NULL,
            d_start       TEXT NOT NULL,
            d_end         TEXT NOT NULL,
            product       TEXT NOT NULL DEFAULT '',
            spots         INTEGER NOT NULL,
            space         INTEGER NOT NULL,
            net_amount    REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_booking_deal ON booking(deal_id);

        CREATE TABLE IF NOT EXISTS booking_spot (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            ord        INTEGER NOT NULL,
            schedule   INTEGER NOT NULL,
            programme  TEXT NOT NULL,
            start_time TEXT NOT NULL,
            sales_type TEXT NOT NULL DEFAULT '',
            unit_price TEXT NOT NULL,
            air_date   TEXT NOT NULL,
            dur        INTEGER NOT NULL,
            agency     TEXT NOT NULL DEFAULT '',
            advertiser TEXT NOT NULL DEFAULT '',
            product    TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_booking_spot_ord ON booking_spot(ord, schedule);
        "#,
    )?;
    Ok(())
}
