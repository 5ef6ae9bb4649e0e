// ==========================================
// 广告排播订单管理系统 - 命令行入口
// ==========================================
// 用法: traffic-booking <订单工作簿.xlsx|订单文档.json>
// 读取订单、按历史联想回填并计价，打印日历表摘要后
// 落盘为 JSON 文档
// ==========================================

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use traffic_booking::config::AppConfig;
use traffic_booking::db::{init_schema, open_sqlite_connection};
use traffic_booking::{BookingSession, APP_NAME, VERSION};

/// 进程目录下的数据库文件
const DB_FILE: &str = "traffic_booking.db";

fn main() -> anyhow::Result<()> {
    traffic_booking::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("==================================================");

    let Some(input) = std::env::args().nth(1).map(PathBuf::from) else {
        bail!("用法: traffic-booking <订单工作簿.xlsx|订单文档.json>");
    };

    let config = AppConfig::load(Path::new("settings.json"));
    let conn = open_sqlite_connection(DB_FILE)
        .with_context(|| format!("打开数据库失败: {DB_FILE}"))?;
    init_schema(&conn).context("初始化数据库表结构失败")?;

    let mut session = BookingSession::from_connection(config, Arc::new(Mutex::new(conn)));

    let is_document = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_document {
        session.import_document(&input)?;
    } else {
        session.import_workbook(&input)?;
    }

    let order = session.order()?;
    println!("代理公司: {}", order.agency);
    println!("广告主:   {}", order.advertiser);
    println!("产品:     {}", order.product);
    println!(
        "投放期:   {} ~ {}（{} 天）",
        order.campaign_period.start_date,
        order.campaign_period.end_date,
        order.campaign_period.day_count()
    );
    println!("总条数:   {}", order.total_spots);
    println!("套餐价:   {}", session.package_cost());
    println!();

    let table = session.table()?;
    println!("{:<20} {:<8} {:<6} {:>8}", "节目", "时段", "时长", "条数");
    for row in &table.rows {
        println!(
            "{:<20} {:<8} {:<6} {:>8}",
            row.programme, row.time, row.dur, row.total_spots
        );
    }
    println!("{:<20} {:<8} {:<6} {:>8}", "合计", "", "", table.total.total_spots);

    let saved = session.save_document()?;
    tracing::info!(path = %saved.display(), "订单文档已保存");
    println!();
    println!("订单文档: {}", saved.display());
    Ok(())
}
