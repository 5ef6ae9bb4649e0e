// ==========================================
// 广告排播订单管理系统 - 订单文档存储
// ==========================================
// 职责: 结构化订单的 JSON 落盘与回读
// 文件名: {代理}_{产品}_{时间戳}.json
// ==========================================

use crate::domain::BookingOrder;
use crate::repository::error::RepositoryResult;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// 订单文档存储
pub struct DocumentStore {
    output_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 保存订单，返回写入的完整路径
    pub fn save(&self, order: &BookingOrder) -> RepositoryResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let file_name = format!(
            "{}_{}_{}.json",
            sanitize(&order.agency),
            sanitize(&order.product),
            timestamp
        );
        let path = self.output_dir.join(file_name);

        let json = serde_json::to_string_pretty(order)?;
        fs::write(&path, json)?;
        tracing::info!(path = %path.display(), "订单已保存");
        Ok(path)
    }

    /// 回读已保存的订单
    pub fn load(&self, path: &Path) -> RepositoryResult<BookingOrder> {
        let json = fs::read_to_string(path)?;
        let order = serde_json::from_str(&json)?;
        Ok(order)
    }
}

/// 文件名清洗：路径分隔符与 Windows 保留字符替换为下划线，空值用占位
fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "Unknown".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CampaignPeriod, Spot};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order() -> BookingOrder {
        BookingOrder {
            agency: "Media/Hub".to_string(),
            advertiser: "Acme".to_string(),
            product: "Zoom".to_string(),
            company_name: "Media/Hub".to_string(),
            campaign_period: CampaignPeriod::new(date(2025, 6, 1), date(2025, 6, 3)),
            gross_cost: 1000.0,
            total_spots: 3,
            spots: vec![Spot {
                programme_name: "News Hour".to_string(),
                programme_start_time: "20:00".to_string(),
                duration: "30".to_string(),
                dates: vec![date(2025, 6, 1), date(2025, 6, 3)],
                total_spots: 3,
            }],
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());

        let path = store.save(&order()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        // 路径分隔符被清洗
        assert!(name.starts_with("Media_Hub_Zoom_"));
        assert!(name.ends_with(".json"));

        let loaded = store.load(&path).unwrap();
        assert_eq!(loaded, order());
    }

    #[test]
    fn test_blank_agency_gets_placeholder() {
        assert_eq!(sanitize("  "), "Unknown");
        assert_eq!(sanitize("A:B"), "A_B");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        let err = store.load(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(
            err,
            crate::repository::error::RepositoryError::IoError(_)
        ));
    }
}
