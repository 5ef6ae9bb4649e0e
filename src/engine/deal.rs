// ==========================================
// 广告排播订单管理系统 - 交易入账引擎
// ==========================================
// 职责: 入账前校验、费率期切分、(时长×费率期) 分组、
//       既有交易处理与排播行/播出记录写入、文本报告
// 红线: 已有排播行未经替换确认不得覆盖
// ==========================================

use crate::domain::types::DealResolution;
use crate::domain::{BookingGroup, BookingLine, BookingOrder, CalendarTable, DealInfo, PeriodInfo};
use crate::engine::pricing::PricingEngine;
use crate::engine::{EngineError, EngineResult};
use crate::repository::{DealRepository, NewBookingLine, NewSpotRow, RateCardLookup};
use chrono::{Duration, NaiveDate};
use std::fmt::Write as _;
use std::sync::Arc;

/// 交易入账引擎
pub struct DealEngine {
    rates: Arc<dyn RateCardLookup>,
    deals: Arc<dyn DealRepository>,
}

/// 入账结果
#[derive(Debug)]
pub enum DealCommitOutcome {
    /// 用户放弃入账
    Cancelled,
    /// 交易下已有排播行，需要先确认替换
    NeedsReplaceConfirm {
        deal_id: i64,
        existing: Vec<BookingLine>,
    },
    /// 入账完成
    Committed {
        deal_id: i64,
        lines: usize,
        report: String,
    },
}

impl DealEngine {
    pub fn new(rates: Arc<dyn RateCardLookup>, deals: Arc<dyn DealRepository>) -> Self {
        Self { rates, deals }
    }

    /// 入账前校验：每行时长必须是整数，广告主必填
    pub fn validate_table(table: &CalendarTable, advertiser: &str) -> EngineResult<()> {
        let bad_rows: Vec<String> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.dur.trim().parse::<i64>().is_err())
            .map(|(i, _)| (i + 1).to_string())
            .collect();
        if !bad_rows.is_empty() {
            return Err(EngineError::Validation(format!(
                "以下行的时长不是有效整数: {}",
                bad_rows.join(", ")
            )));
        }
        if advertiser.trim().is_empty() {
            return Err(EngineError::Validation("广告主不能为空".to_string()));
        }
        Ok(())
    }

    /// 投放期覆盖的费率期（已与投放期求交）
    pub fn campaign_periods(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<PeriodInfo>> {
        let periods: Vec<PeriodInfo> = self
            .rates
            .rate_periods(from, to)?
            .iter()
            .map(|p| p.intersect(from, to))
            .collect();
        if periods.is_empty() {
            return Err(EngineError::Validation(
                "投放期内没有可用的费率期".to_string(),
            ));
        }
        Ok(periods)
    }

    /// 把日历表按 (时长, 费率期) 聚合为入账分组
    ///
    /// 每个播出日期归属首个包含它的费率期；分组按时长、再按实际起播日排序
    pub fn group_bookings(table: &CalendarTable, periods: &[PeriodInfo]) -> Vec<BookingGroup> {
        let mut groups: Vec<BookingGroup> = Vec::new();

        for row in &table.rows {
            let duration = row.dur.trim().parse::<i64>().unwrap_or(0);
            let unit_price = PricingEngine::lenient_f64(&row.unit_price);

            for (i, &count) in row.day_cells.iter().enumerate() {
                if count <= 0 {
                    continue;
                }
                let date = table.date_at(i);
                let Some(period) = periods
                    .iter()
                    .find(|p| date >= p.effective_start && date <= p.effective_end)
                else {
                    continue;
                };

                let idx = match groups
                    .iter()
                    .position(|g| g.duration == duration && g.period_name == period.name)
                {
                    Some(i) => i,
                    None => {
                        groups.push(BookingGroup {
                            duration,
                            period_name: period.name.clone(),
                            effective_start: period.effective_start,
                            effective_end: period.effective_end,
                            actual_start: date,
                            actual_end: date,
                            total_spots: 0,
                            total_amount: 0.0,
                            total_space: 0,
                        });
                        groups.len() - 1
                    }
                };
                let group = &mut groups[idx];

                group.actual_start = group.actual_start.min(date);
                group.actual_end = group.actual_end.max(date);
                group.total_spots += count as i64;
                group.total_amount += unit_price * count as f64;
                group.total_space += duration * count as i64;
            }
        }

        groups.sort_by_key(|g| (g.duration, g.actual_start));
        groups
    }

    /// 查同广告主、投放期前后各扩 window_days 天内有交集的既有交易
    pub fn find_existing_deals(
        &self,
        advertiser: &str,
        from: NaiveDate,
        to: NaiveDate,
        window_days: i64,
    ) -> EngineResult<Vec<DealInfo>> {
        let deals = self.deals.find_overlapping_deals(
            advertiser,
            from - Duration::days(window_days),
            to + Duration::days(window_days),
        )?;
        Ok(deals)
    }

    /// 按用户决定入账
    ///
    /// 选定交易下已有排播行且未确认替换时返回 NeedsReplaceConfirm，
    /// 确认替换后先删旧行再写入；每个分组占用一组递增的 (ord, schedule)
    pub fn commit(
        &self,
        table: &CalendarTable,
        order: &BookingOrder,
        periods: &[PeriodInfo],
        groups: &[BookingGroup],
        resolution: DealResolution,
        replace_confirmed: bool,
    ) -> EngineResult<DealCommitOutcome> {
        let deal_id = match resolution {
            DealResolution::Decline => return Ok(DealCommitOutcome::Cancelled),
            DealResolution::AddToExisting(id) => id,
            DealResolution::CreateNew => self.deals.create_deal(
                &order.agency,
                &order.advertiser,
                order.campaign_period.start_date,
                order.campaign_period.end_date,
            )?,
        };

        let existing = self.deals.booking_lines(deal_id)?;
        if !existing.is_empty() {
            if !replace_confirmed {
                return Ok(DealCommitOutcome::NeedsReplaceConfirm { deal_id, existing });
            }
            tracing::info!(deal_id, lines = existing.len(), "替换既有排播行");
            self.deals.delete_deal_bookings(deal_id, &existing)?;
        }

        let (mut ord, mut schedule) = self.deals.next_ord_and_schedule()?;
        for group in groups {
            self.deals.insert_booking_line(
                deal_id,
                &NewBookingLine {
                    ord,
                    schedule,
                    duration_secs: group.duration,
                    period_name: group.period_name.clone(),
                    start_date: group.actual_start,
                    end_date: group.actual_end,
                    product: order.product.clone(),
                    spots: group.total_spots,
                    space: group.total_space,
                    net_amount: group.total_amount,
                },
            )?;
            self.insert_spots_for_group(table, order, periods, group, ord, schedule)?;
            ord += 1;
            schedule += 1;
        }

        let report = Self::build_report(deal_id, order, periods, groups);
        tracing::info!(deal_id, lines = groups.len(), "交易入账完成");
        Ok(DealCommitOutcome::Committed {
            deal_id,
            lines: groups.len(),
            report,
        })
    }

    /// 把分组展开为单条播出记录写入
    ///
    /// 只取时长匹配的行，日期限定在分组实际范围与费率期有效范围的交集内，
    /// 单元值为 N 时写 N 条
    fn insert_spots_for_group(
        &self,
        table: &CalendarTable,
        order: &BookingOrder,
        periods: &[PeriodInfo],
        group: &BookingGroup,
        ord: i64,
        schedule: i64,
    ) -> EngineResult<()> {
        let Some(period) = periods.iter().find(|p| p.name == group.period_name) else {
            return Ok(());
        };

        for row in &table.rows {
            let row_duration = row.dur.trim().parse::<i64>().unwrap_or(0);
            if row_duration != group.duration {
                continue;
            }
            let unit_price = PricingEngine::lenient_f64(&row.unit_price);

            for (i, &count) in row.day_cells.iter().enumerate() {
                if count <= 0 {
                    continue;
                }
                let date = table.date_at(i);
                if date < group.actual_start || date > group.actual_end {
                    continue;
                }
                if date < period.effective_start || date > period.effective_end {
                    continue;
                }

                for _ in 0..count {
                    self.deals.insert_spot(&NewSpotRow {
                        ord,
                        schedule,
                        programme: row.programme.clone(),
                        start_time: row.time.clone(),
                        sales_type: row.sales_type.clone(),
                        unit_price: format!("{unit_price:.3}"),
                        air_date: date,
                        duration_secs: row_duration,
                        agency: order.agency.clone(),
                        advertiser: order.advertiser.clone(),
                        product: order.product.clone(),
                    })?;
                }
            }
        }
        Ok(())
    }

    /// 入账文本报告
    pub fn build_report(
        deal_id: i64,
        order: &BookingOrder,
        periods: &[PeriodInfo],
        groups: &[BookingGroup],
    ) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "BOOKING REPORT");
        let _ = writeln!(report, "==============");
        let _ = writeln!(report, "Deal Number: {deal_id}");
        let _ = writeln!(report, "Agency: {}", order.agency);
        let _ = writeln!(report, "Advertiser: {}", order.advertiser);
        let _ = writeln!(report, "Product: {}", order.product);
        let _ = writeln!(
            report,
            "Campaign: {} to {}",
            order.campaign_period.start_date, order.campaign_period.end_date
        );
        report.push('\n');

        let _ = writeln!(report, "PERIODS COVERED:");
        let _ = writeln!(report, "----------------");
        for period in periods {
            let _ = writeln!(
                report,
                "  {}: {} to {}",
                period.name, period.effective_start, period.effective_end
            );
        }
        report.push('\n');

        let _ = writeln!(report, "BOOKINGS GROUPED BY DURATION AND PERIOD:");
        let _ = writeln!(report, "-----------------------------------------");
        report.push('\n');
        let _ = writeln!(
            report,
            "{:<12} {:<20} {:<25} {:<10} {:<15}",
            "Duration", "Period", "Date Range", "Spots", "Amount"
        );
        let _ = writeln!(report, "{}", "-".repeat(85));
        for group in groups {
            let range = format!("{} to {}", group.actual_start, group.actual_end);
            let _ = writeln!(
                report,
                "{:<12} {:<20} {:<25} {:<10} {:<15}",
                format!("{} sec", group.duration),
                group.period_name,
                range,
                group.total_spots,
                n3(group.total_amount)
            );
        }
        report.push('\n');

        let _ = writeln!(report, "SUMMARY BY DURATION:");
        let _ = writeln!(report, "--------------------");
        for (duration, spots, amount) in summarize(groups, |g| g.duration.to_string()) {
            let _ = writeln!(
                report,
                "  Duration {duration} sec: {spots} spots, Amount: {}",
                n3(amount)
            );
        }
        report.push('\n');

        let _ = writeln!(report, "SUMMARY BY PERIOD:");
        let _ = writeln!(report, "------------------");
        for (period, spots, amount) in summarize(groups, |g| g.period_name.clone()) {
            let _ = writeln!(report, "  {period}: {spots} spots, Amount: {}", n3(amount));
        }
        report.push('\n');

        let total_spots: i64 = groups.iter().map(|g| g.total_spots).sum();
        let total_amount: f64 = groups.iter().map(|g| g.total_amount).sum();
        let _ = writeln!(
            report,
            "  GRAND TOTAL: {total_spots} spots, Amount: {}",
            n3(total_amount)
        );
        report
    }
}

/// 按键聚合 (条数, 金额)，保持首次出现的顺序
fn summarize<F>(groups: &[BookingGroup], key: F) -> Vec<(String, i64, f64)>
where
    F: Fn(&BookingGroup) -> String,
{
    let mut out: Vec<(String, i64, f64)> = Vec::new();
    for group in groups {
        let k = key(group);
        match out.iter_mut().find(|(existing, _, _)| *existing == k) {
            Some((_, spots, amount)) => {
                *spots += group.total_spots;
                *amount += group.total_amount;
            }
            None => out.push((k, group.total_spots, group.total_amount)),
        }
    }
    out
}

/// 报告金额：千分位 + 3 位小数，零值也要渲染
fn n3(value: f64) -> String {
    if value <= 0.0 {
        format!("{value:.3}")
    } else {
        PricingEngine::format_n3(value)
    }
}
