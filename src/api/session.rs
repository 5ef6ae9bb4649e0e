// ==========================================
// 广告排播订单管理系统 - 编辑会话
// ==========================================
// 职责: 持有当前订单与日历表，把编辑/联想/计价/入账
//       串成调用方可直接使用的单一门面
// 红线: 任何改动条数的操作之后必须重算计价
// ==========================================

use crate::config::AppConfig;
use crate::domain::types::{DealResolution, GridMode};
use crate::domain::{
    BookingGroup, BookingOrder, CalendarTable, Column, DealInfo, PeriodInfo,
};
use crate::engine::{
    AutoFillEngine, CalendarEngine, DealCommitOutcome, DealEngine, PricingEngine,
};
use crate::importer::BookingOrderReader;
use crate::repository::{
    DealRepository, DocumentStore, GridLookup, RateCardLookup, SqliteDealRepository,
    SqliteGridRepository, SqliteRateRepository,
};
use crate::api::error::{ApiError, ApiResult};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 入账前的准备结果：费率期、分组与同广告主既有交易
#[derive(Debug)]
pub struct DealProposal {
    pub existing_deals: Vec<DealInfo>,
    pub periods: Vec<PeriodInfo>,
    pub groups: Vec<BookingGroup>,
}

/// 编辑会话
///
/// 一次会话对应一份载入的订单；未载入订单时编辑与入账操作
/// 返回 NoActiveOrder
pub struct BookingSession {
    config: AppConfig,
    grid: Arc<dyn GridLookup>,
    documents: DocumentStore,
    autofill: AutoFillEngine,
    deal_engine: DealEngine,

    order: Option<BookingOrder>,
    table: Option<CalendarTable>,
    package_cost: String,
    grid_mode: GridMode,
    specific_date: Option<NaiveDate>,
    /// 最近一次入账成功的交易号
    current_deal_id: Option<i64>,
}

impl BookingSession {
    pub fn new(
        config: AppConfig,
        grid: Arc<dyn GridLookup>,
        rates: Arc<dyn RateCardLookup>,
        deals: Arc<dyn DealRepository>,
    ) -> Self {
        let documents = DocumentStore::new(config.json_output_dir.clone());
        let autofill = AutoFillEngine::new(Arc::clone(&grid), Arc::clone(&rates), &config);
        let deal_engine = DealEngine::new(Arc::clone(&rates), deals);
        let grid_mode = config.default_grid_mode;
        Self {
            config,
            grid,
            documents,
            autofill,
            deal_engine,
            order: None,
            table: None,
            package_cost: String::new(),
            grid_mode,
            specific_date: None,
            current_deal_id: None,
        }
    }

    /// 用同一个 SQLite 连接建全套仓储
    pub fn from_connection(config: AppConfig, conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            config,
            Arc::new(SqliteGridRepository::from_connection(Arc::clone(&conn))),
            Arc::new(SqliteRateRepository::from_connection(Arc::clone(&conn))),
            Arc::new(SqliteDealRepository::from_connection(conn)),
        )
    }

    // ==========================================
    // 载入与保存
    // ==========================================

    /// 从 Excel 工作簿导入订单
    pub fn import_workbook(&mut self, path: &Path) -> ApiResult<()> {
        let order = BookingOrderReader::new().read(path)?;
        self.install_order(order)
    }

    /// 从 JSON 文档载入订单
    pub fn import_document(&mut self, path: &Path) -> ApiResult<()> {
        let order = self.documents.load(path)?;
        self.install_order(order)
    }

    /// 把当前日历表回写进订单并保存为 JSON 文档
    pub fn save_document(&mut self) -> ApiResult<PathBuf> {
        self.sync_order()?;
        let Some(order) = self.order.as_ref() else {
            return Err(ApiError::NoActiveOrder);
        };
        let path = self.documents.save(order)?;
        Ok(path)
    }

    /// 载入订单：建表、历史联想回填、按总包价计价
    fn install_order(&mut self, order: BookingOrder) -> ApiResult<()> {
        let mut table = CalendarEngine::build_from_order(&order);
        self.package_cost = PricingEngine::normalize_package_cost(&order.gross_cost.to_string());

        let (from, to) = (table.start_date, table.end_date);
        self.autofill.auto_fill_after_load(&mut table, from, to)?;
        PricingEngine::reprice(&mut table, &self.package_cost);

        self.order = Some(order);
        self.table = Some(table);
        Ok(())
    }

    /// 日历表回写订单（投放期、明细、总条数）
    fn sync_order(&mut self) -> ApiResult<()> {
        let (Some(table), Some(order)) = (self.table.as_ref(), self.order.as_mut()) else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::update_booking_order(table, order);
        Ok(())
    }

    // ==========================================
    // 当前状态
    // ==========================================

    pub fn table(&self) -> ApiResult<&CalendarTable> {
        self.table.as_ref().ok_or(ApiError::NoActiveOrder)
    }

    pub fn order(&self) -> ApiResult<&BookingOrder> {
        self.order.as_ref().ok_or(ApiError::NoActiveOrder)
    }

    pub fn package_cost(&self) -> &str {
        &self.package_cost
    }

    pub fn grid_mode(&self) -> GridMode {
        self.grid_mode
    }

    pub fn current_deal_id(&self) -> Option<i64> {
        self.current_deal_id
    }

    // ==========================================
    // 单元编辑
    // ==========================================

    /// 单元编辑完成：按列分派联想规则，编辑后统一重算计价
    ///
    /// 联想校验失败时单元已被清空，错误继续上抛由调用方提示
    pub fn end_edit(&mut self, row: usize, col: Column, raw: &str) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        let (from, to) = (table.start_date, table.end_date);

        let result = match col {
            Column::Time => self.autofill.on_time_edited(table, row, raw, from, to),
            Column::Programme => self.autofill.on_programme_edited(table, row, raw, from, to),
            Column::Oid => self.autofill.on_oid_edited(
                table,
                row,
                raw,
                self.grid_mode,
                self.specific_date.unwrap_or(from),
            ),
            Column::Dur => self.autofill.on_dur_edited(table, row, raw),
            other => CalendarEngine::set_cell(table, row, other, raw),
        };

        PricingEngine::reprice(table, &self.package_cost);
        result?;
        Ok(())
    }

    // ==========================================
    // 行与块操作
    // ==========================================

    pub fn add_row(&mut self, at: usize) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::insert_row(table, at);
        Ok(())
    }

    pub fn delete_rows(&mut self, indices: &[usize]) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::delete_rows(table, indices);
        PricingEngine::reprice(table, &self.package_cost);
        Ok(())
    }

    pub fn duplicate_rows(&mut self, indices: &[usize]) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::duplicate_rows(table, indices);
        PricingEngine::reprice(table, &self.package_cost);
        Ok(())
    }

    pub fn paste(
        &mut self,
        start_row: usize,
        start_col: usize,
        block: &[Vec<String>],
    ) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::paste(table, start_row, start_col, block);
        PricingEngine::reprice(table, &self.package_cost);
        Ok(())
    }

    pub fn clear_cells(&mut self, cells: &[(usize, Column)]) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::clear_cells(table, cells);
        PricingEngine::reprice(table, &self.package_cost);
        Ok(())
    }

    pub fn sort_by(&mut self, col: Column) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::sort_by(table, col);
        Ok(())
    }

    // ==========================================
    // 投放期与模式
    // ==========================================

    /// 平移投放期起点（终点跟随，单元格保持相对位置）
    pub fn set_campaign_start(&mut self, new_start: NaiveDate) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::set_campaign_start(table, new_start);
        Ok(())
    }

    /// 调整投放期终点（截断或补零，随后重算）
    pub fn set_campaign_end(&mut self, new_end: NaiveDate) -> ApiResult<()> {
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        CalendarEngine::set_campaign_end(table, new_end);
        PricingEngine::reprice(table, &self.package_cost);
        Ok(())
    }

    /// 切换网格模式；离开指定日期模式时清空全部 OID
    pub fn set_grid_mode(&mut self, mode: GridMode) {
        if self.grid_mode == GridMode::SpecificDate && mode != GridMode::SpecificDate {
            if let Some(table) = self.table.as_mut() {
                CalendarEngine::clear_all_oids(table);
            }
        }
        self.grid_mode = mode;
    }

    pub fn set_specific_date(&mut self, date: NaiveDate) {
        self.specific_date = Some(date);
    }

    /// 设置套餐价（清洗后重算全表单价）
    pub fn set_package_cost(&mut self, raw: &str) -> ApiResult<()> {
        self.package_cost = PricingEngine::normalize_package_cost(raw);
        let Some(table) = self.table.as_mut() else {
            return Err(ApiError::NoActiveOrder);
        };
        PricingEngine::reprice(table, &self.package_cost);
        Ok(())
    }

    // ==========================================
    // 联想候选
    // ==========================================

    /// 时段联想候选（投放期内的历史记录）
    pub fn time_suggestions(&self, prefix: &str) -> ApiResult<Vec<String>> {
        let table = self.table()?;
        let list = self
            .grid
            .time_suggestions(prefix, table.start_date, table.end_date)?;
        Ok(list)
    }

    /// 节目联想候选（按时段过滤，可叠加名称子串）
    pub fn programme_suggestions(&self, start_time: &str, search: &str) -> ApiResult<Vec<String>> {
        let table = self.table()?;
        let list = self.grid.programme_suggestions(
            start_time,
            search,
            table.start_date,
            table.end_date,
        )?;
        Ok(list)
    }

    // ==========================================
    // 交易入账
    // ==========================================

    /// 入账准备：校验、费率期切分、分组，并查同广告主既有交易
    pub fn prepare_deal(&mut self) -> ApiResult<DealProposal> {
        self.sync_order()?;
        let (Some(table), Some(order)) = (self.table.as_ref(), self.order.as_ref()) else {
            return Err(ApiError::NoActiveOrder);
        };

        DealEngine::validate_table(table, &order.advertiser)?;
        let periods = self.deal_engine.campaign_periods(
            order.campaign_period.start_date,
            order.campaign_period.end_date,
        )?;
        let groups = DealEngine::group_bookings(table, &periods);
        let existing_deals = self.deal_engine.find_existing_deals(
            &order.advertiser,
            order.campaign_period.start_date,
            order.campaign_period.end_date,
            self.config.deal_search_window_days,
        )?;

        Ok(DealProposal {
            existing_deals,
            periods,
            groups,
        })
    }

    /// 按调用方决定入账
    pub fn commit_deal(
        &mut self,
        proposal: &DealProposal,
        resolution: DealResolution,
        replace_confirmed: bool,
    ) -> ApiResult<DealCommitOutcome> {
        let (Some(table), Some(order)) = (self.table.as_ref(), self.order.as_ref()) else {
            return Err(ApiError::NoActiveOrder);
        };
        let outcome = self.deal_engine.commit(
            table,
            order,
            &proposal.periods,
            &proposal.groups,
            resolution,
            replace_confirmed,
        )?;
        if let DealCommitOutcome::Committed { deal_id, .. } = &outcome {
            self.current_deal_id = Some(*deal_id);
        }
        Ok(outcome)
    }
}
