// ==========================================
// 广告排播订单管理系统 - 工作表网格
// ==========================================
// calamine 只出现在文件边界；读入后立即转为自有的
// CellValue 二维网格，之后的全部启发式都可脱离文件做单元测试
// ==========================================

use crate::domain::cell::CellValue;
use crate::importer::error::ImportError;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use std::path::Path;

/// 选表的最小行/列数要求
pub const MIN_SHEET_ROWS: usize = 10;
pub const MIN_SHEET_COLS: usize = 10;

/// 自有的工作表网格（行 × 列，松散类型单元）
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub name: String,
    cells: Vec<Vec<CellValue>>,
    cols: usize,
}

impl SheetGrid {
    /// 由单元格矩阵构造（测试与解析共用；列数取最长行）
    pub fn new(name: impl Into<String>, cells: Vec<Vec<CellValue>>) -> Self {
        let cols = cells.iter().map(|r| r.len()).max().unwrap_or(0);
        Self {
            name: name.into(),
            cells,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 取单元（越界视为空单元）
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static BLANK: CellValue = CellValue::Blank;
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&BLANK)
    }
}

/// 打开工作簿并读出全部工作表
///
/// 扩展名校验与文件存在性检查都在这里完成
pub fn load_workbook(path: &Path) -> Result<Vec<SheetGrid>, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != "xlsx" && ext != "xls" {
        return Err(ImportError::UnsupportedFormat(ext));
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut grids = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let cells: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect())
            .collect();

        grids.push(SheetGrid::new(sheet_name, cells));
    }

    Ok(grids)
}

/// calamine 单元 → 自有单元
fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Blank,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => match data.as_datetime() {
            Some(dt) => CellValue::Date(dt),
            None => CellValue::Blank,
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Blank,
    }
}

/// 在全部工作表中挑出排播数据表
///
/// 规则：行×列 乘积最大者胜出，但行、列都要达到下限；
/// 无一达标时退回第一张表；零张表报错。
pub fn select_booking_sheet(sheets: &[SheetGrid]) -> Result<&SheetGrid, ImportError> {
    let mut best: Option<&SheetGrid> = None;
    let mut best_score = 0usize;

    for sheet in sheets {
        if sheet.rows() >= MIN_SHEET_ROWS && sheet.cols() >= MIN_SHEET_COLS {
            let score = sheet.rows() * sheet.cols();
            if score > best_score {
                best_score = score;
                best = Some(sheet);
            }
        }
    }

    best.or_else(|| sheets.first())
        .ok_or(ImportError::NoBookingSheet)
}
