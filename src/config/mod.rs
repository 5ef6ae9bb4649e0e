// ==========================================
// 广告排播订单管理系统 - 配置层
// ==========================================
// 职责: 运行时配置加载（settings.json）
// 约定: 配置文件缺失或损坏时回退到默认值，不中断启动
// ==========================================

pub mod app_config;

// 重导出核心配置
pub use app_config::AppConfig;
