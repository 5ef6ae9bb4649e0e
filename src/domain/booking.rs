// ==========================================
// 广告排播订单管理系统 - 订单实体
// ==========================================
// BookingOrder 是唯一事实来源；日历表只是派生投影
// JSON 字段名是对外文档格式，禁止随重构改名
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 投放期（起止均含当日，start <= end）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CampaignPeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self { start_date, end_date }
    }

    /// 投放天数（含首尾）
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// 单条排播记录
///
/// dates 中的日期按出现次数重复（一天播三次就出现三次），
/// 不用计数字段表示——这是文档格式的约定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    /// 节目名
    pub programme_name: String,
    /// 开播时段 HH:mm（跨午夜用 24-29 小时表示）
    pub programme_start_time: String,
    /// 时长（秒），字符串编码，可能带单位尾巴（"30 sec"）
    pub duration: String,
    /// 播出日期列表，按次数重复
    pub dates: Vec<NaiveDate>,
    /// 条数，恒等于 dates.len()
    pub total_spots: i64,
}

/// 排播订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingOrder {
    /// 代理公司
    pub agency: String,
    /// 广告主
    pub advertiser: String,
    /// 产品
    pub product: String,
    /// 公司名（与 agency 同源，不同格式来源互为别名）
    pub company_name: String,
    /// 投放期（由所有播出日期的最小/最大值推导）
    pub campaign_period: CampaignPeriod,
    /// 总包价
    pub gross_cost: f64,
    /// 总条数
    pub total_spots: i64,
    /// 排播明细
    pub spots: Vec<Spot>,
}
