// ==========================================
// 广告排播订单管理系统 - 运行时配置
// ==========================================
// 来源: 进程目录下的 settings.json
// 红线: 配置读取失败只记录告警并使用默认值，绝不让启动失败
// ==========================================

use crate::domain::types::GridMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 默认的交易检索窗口（天）
pub const DEFAULT_DEAL_SEARCH_DAYS: i64 = 15;

/// 默认的时长上限（秒）
pub const DEFAULT_MAX_DURATION_SECS: i64 = 215;

/// 默认的播出小时上限（跨午夜排播，时段可到 29:59）
pub const DEFAULT_MAX_BROADCAST_HOUR: u32 = 29;

/// 运行时配置
///
/// 字段名与历史配置文件保持一致（DefaultGridMode / DealSearchDays / JsonSavePath），
/// 新增的领域边界项使用 serde 默认值，旧配置文件无需迁移。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 默认网格模式
    #[serde(rename = "DefaultGridMode", default)]
    pub default_grid_mode: GridMode,

    /// 查找既有交易时，在投放期两侧扩展的天数
    #[serde(rename = "DealSearchDays", default = "default_deal_search_days")]
    pub deal_search_window_days: i64,

    /// 订单 JSON 文档输出目录
    #[serde(rename = "JsonSavePath", default = "default_json_output_dir")]
    pub json_output_dir: String,

    /// Dur 列允许的最大时长（秒）
    #[serde(rename = "MaxDurationSecs", default = "default_max_duration_secs")]
    pub max_duration_secs: i64,

    /// Time 列允许的最大小时数
    #[serde(rename = "MaxBroadcastHour", default = "default_max_broadcast_hour")]
    pub max_broadcast_hour: u32,
}

fn default_deal_search_days() -> i64 {
    DEFAULT_DEAL_SEARCH_DAYS
}

fn default_json_output_dir() -> String {
    "ProcessedOrders".to_string()
}

fn default_max_duration_secs() -> i64 {
    DEFAULT_MAX_DURATION_SECS
}

fn default_max_broadcast_hour() -> u32 {
    DEFAULT_MAX_BROADCAST_HOUR
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_grid_mode: GridMode::CampaignDates,
            deal_search_window_days: DEFAULT_DEAL_SEARCH_DAYS,
            json_output_dir: default_json_output_dir(),
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            max_broadcast_hour: DEFAULT_MAX_BROADCAST_HOUR,
        }
    }
}

impl AppConfig {
    /// 从 settings.json 加载配置
    ///
    /// 文件不存在、不可读或格式错误时回退为默认配置
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("配置文件格式错误，使用默认配置: {}", e);
                    AppConfig::default()
                }
            },
            Err(e) => {
                tracing::debug!("配置文件不可读（{}），使用默认配置", e);
                AppConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_grid_mode, GridMode::CampaignDates);
        assert_eq!(config.deal_search_window_days, 15);
        assert_eq!(config.max_duration_secs, 215);
        assert_eq!(config.max_broadcast_hour, 29);
        assert_eq!(config.json_output_dir, "ProcessedOrders");
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let config = AppConfig::load(Path::new("/nonexistent/settings.json"));
        assert_eq!(config.deal_search_window_days, 15);
    }

    #[test]
    fn test_load_legacy_settings_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"DefaultGridMode":"SpecificDate","DealSearchDays":30,"JsonSavePath":"Orders"}}"#
        )
        .unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.default_grid_mode, GridMode::SpecificDate);
        assert_eq!(config.deal_search_window_days, 30);
        assert_eq!(config.json_output_dir, "Orders");
        // 未出现的新增字段取默认值
        assert_eq!(config.max_duration_secs, 215);
    }

    #[test]
    fn test_load_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.default_grid_mode, GridMode::CampaignDates);
    }
}
