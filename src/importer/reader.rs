// ==========================================
// 广告排播订单管理系统 - 排播订单读取器
// ==========================================
// 职责: 工作簿 → 选表 → 版式识别 → 解析 → 订单收尾
// 红线: 任一环节失败整单报错，不产出半成品订单
// ==========================================

use crate::domain::{BookingOrder, CampaignPeriod, Spot};
use crate::importer::dates::{find_year_and_month, resolve_day_columns};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::layout::{
    find_column_in_row, find_row_containing, find_value_below, find_value_right_of,
};
use crate::importer::sheet::{load_workbook, select_booking_sheet, SheetGrid};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// 内嵌日历版式的识别标记（日历数字与列头同行）
const INLINE_MARKER: &str = "Programs Name";

/// 排播单版式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLayout {
    /// 日历数字嵌在列头行内
    InlineCalendar,
    /// 日历数字独占一行，位于列头行上方
    BannerCalendar,
}

impl OrderLayout {
    pub fn name(&self) -> &'static str {
        match self {
            OrderLayout::InlineCalendar => "内嵌日历版式",
            OrderLayout::BannerCalendar => "独立日历版式",
        }
    }
}

/// 版式识别：有内嵌标记走内嵌版式，否则按独立日历版式解析
pub fn detect_layout(grid: &SheetGrid) -> OrderLayout {
    if find_row_containing(grid, &[INLINE_MARKER]).is_some() {
        OrderLayout::InlineCalendar
    } else {
        OrderLayout::BannerCalendar
    }
}

/// 排播订单读取器
#[derive(Debug, Default)]
pub struct BookingOrderReader;

impl BookingOrderReader {
    pub fn new() -> Self {
        Self
    }

    /// 读取 Excel 排播单并产出结构化订单
    pub fn read(&self, path: &Path) -> ImportResult<BookingOrder> {
        let batch_id = Uuid::new_v4();
        tracing::info!(batch_id = %batch_id, path = %path.display(), "开始导入排播订单");

        let sheets = load_workbook(path)?;
        let grid = select_booking_sheet(&sheets)?;
        let layout = detect_layout(grid);
        tracing::debug!(sheet = %grid.name, layout = layout.name(), "选定工作表与版式");

        let today = chrono::Local::now().date_naive();
        let order = parse_grid(grid, layout, today)?;

        tracing::info!(
            batch_id = %batch_id,
            advertiser = %order.advertiser,
            rows = order.spots.len(),
            total_spots = order.total_spots,
            "排播订单导入完成"
        );
        Ok(order)
    }
}

/// 按版式解析单张工作表（today 用于年月种子兜底）
pub fn parse_grid(
    grid: &SheetGrid,
    layout: OrderLayout,
    today: NaiveDate,
) -> ImportResult<BookingOrder> {
    let parsed = match layout {
        OrderLayout::InlineCalendar => parse_inline_calendar(grid, today),
        OrderLayout::BannerCalendar => parse_banner_calendar(grid, today),
    }?;
    finalize(parsed)
}

/// 解析中间态：投放期要等全部日期收齐后才能定
struct ParsedOrder {
    agency: String,
    advertiser: String,
    product: String,
    company_name: String,
    gross_cost: f64,
    header_total_spots: i64,
    spots: Vec<Spot>,
}

/// 内嵌日历版式：列头行即日历行，日列从单价列右侧开始
fn parse_inline_calendar(grid: &SheetGrid, today: NaiveDate) -> ImportResult<ParsedOrder> {
    let format = OrderLayout::InlineCalendar.name();
    let missing = |header: &str| ImportError::MissingHeader {
        format: format.to_string(),
        header: header.to_string(),
    };

    let agency = find_value_right_of(grid, &["Agency :"]).unwrap_or_default();
    let advertiser = find_value_right_of(grid, &["Advertiser :"]).unwrap_or_default();
    let product = find_value_right_of(grid, &["Product :"]).unwrap_or_default();
    let gross_cost = find_value_right_of(grid, &["Package Cost:"])
        .and_then(|s| parse_money(&s))
        .unwrap_or(0.0);
    let header_total_spots = find_value_right_of(grid, &["Total Spots"])
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0);

    let header_row =
        find_row_containing(grid, &[INLINE_MARKER]).ok_or_else(|| missing(INLINE_MARKER))?;
    let program_col = find_column_in_row(grid, header_row, &[INLINE_MARKER])
        .ok_or_else(|| missing(INLINE_MARKER))?;
    let time_col = find_column_in_row(grid, header_row, &["Time (KWT)"])
        .ok_or_else(|| missing("Time (KWT)"))?;
    let price_col = find_column_in_row(grid, header_row, &["Price in US $"])
        .ok_or_else(|| missing("Price in US $"))?;
    let total_col = find_column_in_row(grid, header_row, &["Total Spots"])
        .ok_or_else(|| missing("Total Spots"))?;

    let first_day_col = price_col + 1;
    let seed = find_year_and_month(grid, today);
    let column_dates = resolve_day_columns(grid, header_row, first_day_col, total_col, seed);

    let spots = collect_spots(
        grid,
        header_row,
        program_col,
        time_col,
        None,
        first_day_col,
        total_col,
        &column_dates,
    );

    Ok(ParsedOrder {
        company_name: agency.clone(),
        agency,
        advertiser,
        product,
        gross_cost,
        header_total_spots,
        spots,
    })
}

/// 独立日历版式：日历行位于列头行上一行，首个日列靠内容探测
fn parse_banner_calendar(grid: &SheetGrid, today: NaiveDate) -> ImportResult<ParsedOrder> {
    let format = OrderLayout::BannerCalendar.name();
    let missing = |header: &str| ImportError::MissingHeader {
        format: format.to_string(),
        header: header.to_string(),
    };

    let company_name =
        find_value_right_of(grid, &["Company Name:", "Agency:", "Client:", "Client Name"])
            .unwrap_or_default();
    let advertiser = find_value_right_of(grid, &["ADVERTISER:", "Client"]).unwrap_or_default();
    let product = find_value_right_of(grid, &["PRODUCT:", "Campaign"]).unwrap_or_default();
    let gross_cost =
        find_value_below(grid, &["Package Cost", "Total Cost", "Net Cost", "Gross Cost"])
            .and_then(|s| parse_money(&s))
            .unwrap_or(0.0);
    let header_total_spots = find_value_below(grid, &["Number of Spots:", "Total Spots"])
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0);

    let header_row = find_row_containing(
        grid,
        &["PROGRAMS", "PROGRAMMES", "PROGRAMME", "Schedule", "Program Name"],
    )
    .ok_or_else(|| missing("PROGRAMS"))?;

    if header_row == 0 {
        return Err(ImportError::CalendarRowNotFound {
            format: format.to_string(),
        });
    }
    let calendar_row = header_row - 1;

    let program_col = find_column_in_row(
        grid,
        header_row,
        &["PROGRAMS", "PROGRAMMES", "PROGRAMME", "Program Name", "Show"],
    )
    .ok_or_else(|| missing("PROGRAMS"))?;
    let time_col = find_column_in_row(grid, header_row, &["TIME", "START TIME", "Start", "Slot"])
        .ok_or_else(|| missing("TIME"))?;
    let dur_col = find_column_in_row(grid, header_row, &["DUR", "DURATION", "Length", "Secs"])
        .ok_or_else(|| missing("DUR"))?;

    // 首个日列：日历行内首个整数或日期值单元
    let first_day_col = (0..grid.cols())
        .find(|&c| {
            let cell = grid.cell(calendar_row, c);
            !cell.is_blank() && (cell.as_int().is_some() || cell.as_date().is_some())
        })
        .ok_or_else(|| ImportError::FirstDayColumnNotFound {
            format: format.to_string(),
        })?;

    let total_col = find_column_in_row(grid, calendar_row, &["Total", "TOTAL SPOTS"])
        .unwrap_or_else(|| grid.cols());

    let seed = find_year_and_month(grid, today);
    let column_dates = resolve_day_columns(grid, calendar_row, first_day_col, total_col, seed);

    let spots = collect_spots(
        grid,
        header_row,
        program_col,
        time_col,
        Some(dur_col),
        first_day_col,
        total_col,
        &column_dates,
    );

    Ok(ParsedOrder {
        agency: company_name.clone(),
        company_name,
        advertiser,
        product,
        gross_cost,
        header_total_spots,
        spots,
    })
}

/// 从列头行下方逐行收集播出记录
///
/// 节目名为空的行跳过；含 TOTAL 的行视为表尾，停止扫描。
/// 日列标记为正整数 N 时该日期重复记 N 次；没有任何日期的行整行丢弃。
#[allow(clippy::too_many_arguments)]
fn collect_spots(
    grid: &SheetGrid,
    header_row: usize,
    program_col: usize,
    time_col: usize,
    dur_col: Option<usize>,
    first_day_col: usize,
    total_col: usize,
    column_dates: &[(usize, NaiveDate)],
) -> Vec<Spot> {
    let dates_by_col: HashMap<usize, NaiveDate> = column_dates.iter().copied().collect();
    let mut spots = Vec::new();

    for r in (header_row + 1)..grid.rows() {
        let programme = grid.cell(r, program_col).display();
        if programme.is_empty() {
            continue;
        }
        if programme.to_uppercase().contains("TOTAL") {
            break;
        }

        let time = normalize_time_cell(grid.cell(r, time_col));
        let duration = match dur_col {
            Some(c) => grid.cell(r, c).display(),
            // 内嵌日历版式不带时长列，默认 41 秒
            None => "41".to_string(),
        };

        let mut dates = Vec::new();
        for c in first_day_col..total_col {
            let marker = grid.cell(r, c);
            if marker.is_blank() {
                continue;
            }
            let Some(date) = dates_by_col.get(&c) else {
                continue;
            };
            if let Some(count) = marker.as_int() {
                for _ in 0..count.max(0) {
                    dates.push(*date);
                }
            }
        }

        let total_spots = if total_col < grid.cols() {
            grid.cell(r, total_col).as_int()
        } else {
            None
        }
        .unwrap_or(dates.len() as i64);

        if !dates.is_empty() {
            spots.push(Spot {
                programme_name: programme,
                programme_start_time: time,
                duration,
                dates,
                total_spots,
            });
        }
    }

    spots
}

/// 时段单元归一为 HH:mm（时间单元、"HH:mm:ss" 文本都收敛到同一格式）
fn normalize_time_cell(cell: &crate::domain::CellValue) -> String {
    if let Some(t) = cell.as_time_hhmm() {
        return t;
    }
    let text = cell.display();
    for pattern in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(&text, pattern) {
            return t.format("%H:%M").to_string();
        }
    }
    text
}

/// 宽松金额解析（允许千分位逗号）
fn parse_money(text: &str) -> Option<f64> {
    text.replace(',', "").trim().parse::<f64>().ok()
}

/// 收尾：投放期取全部播出日期的首末；表头总条数为 0 时回退为各行求和
fn finalize(parsed: ParsedOrder) -> ImportResult<BookingOrder> {
    let mut all_dates: Vec<NaiveDate> = parsed
        .spots
        .iter()
        .flat_map(|s| s.dates.iter().copied())
        .collect();
    all_dates.sort();

    let (Some(first), Some(last)) = (all_dates.first(), all_dates.last()) else {
        return Err(ImportError::NoSpots);
    };

    let total_spots = if parsed.header_total_spots != 0 {
        parsed.header_total_spots
    } else {
        parsed.spots.iter().map(|s| s.total_spots).sum()
    };

    Ok(BookingOrder {
        agency: parsed.agency,
        advertiser: parsed.advertiser,
        product: parsed.product,
        company_name: parsed.company_name,
        campaign_period: CampaignPeriod::new(*first, *last),
        gross_cost: parsed.gross_cost,
        total_spots,
        spots: parsed.spots,
    })
}
