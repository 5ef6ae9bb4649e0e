// ==========================================
// 广告排播订单管理系统 - 计价与交易领域对象
// ==========================================
// 这些对象只在计价/入账步骤中短暂存在，不做持久化映射
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 费率期（原始范围 + 与投放期的交集）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodInfo {
    pub id: i64,
    pub name: String,
    /// 费率期自身范围
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// 与投放期的交集（入账只看这段）
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
}

/// 费率期原始记录（仓储返回，未与投放期求交）
#[derive(Debug, Clone, PartialEq)]
pub struct RatePeriod {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// 排播分组：同一 (时长, 费率期) 的全部播出聚合为一行入账
#[derive(Debug, Clone, PartialEq)]
pub struct BookingGroup {
    pub duration: i64,
    pub period_name: String,
    /// 费率期交集范围
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
    /// 组内实际出现播出的首末日期
    pub actual_start: NaiveDate,
    pub actual_end: NaiveDate,
    pub total_spots: i64,
    /// 金额 = Σ 单价 × 条数
    pub total_amount: f64,
    /// 空间 = 时长 × 条数
    pub total_space: i64,
}

/// 既有交易摘要
#[derive(Debug, Clone, PartialEq)]
pub struct DealInfo {
    pub id: i64,
    pub agency: String,
    pub advertiser: String,
    pub campaign_start: NaiveDate,
    pub campaign_end: NaiveDate,
}

/// 既有排播行（替换确认与删除时使用）
#[derive(Debug, Clone, PartialEq)]
pub struct BookingLine {
    pub id: i64,
    pub ord: i64,
    pub schedule: i64,
    pub duration: i64,
    pub period_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub spots: i64,
    pub space: i64,
    pub net_amount: f64,
}

/// OID 反向联想结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OidDetails {
    pub time: String,
    pub programme: String,
    pub fp: String,
}

impl RatePeriod {
    /// 与投放期求交，生成入账用的 PeriodInfo
    pub fn intersect(&self, campaign_start: NaiveDate, campaign_end: NaiveDate) -> PeriodInfo {
        PeriodInfo {
            id: self.id,
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            effective_start: self.start_date.max(campaign_start),
            effective_end: self.end_date.min(campaign_end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_intersection_clamps_to_campaign() {
        let period = RatePeriod {
            id: 1,
            name: "Ramadan".to_string(),
            start_date: date(2025, 3, 1),
            end_date: date(2025, 3, 30),
        };
        let info = period.intersect(date(2025, 3, 15), date(2025, 4, 10));
        assert_eq!(info.effective_start, date(2025, 3, 15));
        assert_eq!(info.effective_end, date(2025, 3, 30));
        // 原始范围保持不变
        assert_eq!(info.start_date, date(2025, 3, 1));
    }
}
