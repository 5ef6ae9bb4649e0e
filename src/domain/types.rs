// ==========================================
// 广告排播订单管理系统 - 领域类型定义
// ==========================================
// 红线: 模式切换是显式状态机，不在事件处理里散落布尔量
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 网格模式 (Grid Mode)
// ==========================================
// 两种互斥模式，决定 OID 列是否可编辑以及哪条联想规则生效：
// - CampaignDates: 按投放期编辑，Time 列触发正向联想
// - SpecificDate:  按指定日期编辑，OID 列触发反向联想
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GridMode {
    #[default]
    CampaignDates,
    SpecificDate,
}

impl GridMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridMode::CampaignDates => "CampaignDates",
            GridMode::SpecificDate => "SpecificDate",
        }
    }
}

impl fmt::Display for GridMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 排序方向 (Sort Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// 同列重复点击时翻转方向
    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

// ==========================================
// 交易归属决策 (Deal Resolution)
// ==========================================
// 发现同广告主既有交易时，由调用方决定如何归属本次排播
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealResolution {
    /// 放弃本次入账
    Decline,
    /// 并入指定的既有交易
    AddToExisting(i64),
    /// 新建交易
    CreateNew,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_mode_default_and_serde() {
        assert_eq!(GridMode::default(), GridMode::CampaignDates);

        let json = serde_json::to_string(&GridMode::SpecificDate).unwrap();
        assert_eq!(json, "\"SpecificDate\"");
        let back: GridMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GridMode::SpecificDate);
    }

    #[test]
    fn test_sort_direction_toggle() {
        assert_eq!(SortDirection::Ascending.toggled(), SortDirection::Descending);
        assert_eq!(SortDirection::Descending.toggled(), SortDirection::Ascending);
    }
}
