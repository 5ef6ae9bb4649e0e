// ==========================================
// 广告排播订单管理系统 - 版面查找原语
// ==========================================
// 排播单没有固定坐标，全部字段靠标签搜索定位：
// - 标签右侧取值（Agency : / Advertiser : 等）
// - 标签下方取值（Package Cost 类竖排字段）
// - 表头行 / 表头列按子串匹配
// ==========================================

use crate::importer::sheet::SheetGrid;

/// 标签下方取值的最大向下搜索行数
const BELOW_SEARCH_ROWS: usize = 4;

/// 找到首个整行文本包含任一标签的行号
///
/// 整行拼接后压缩空白再比，列头内的换行（"Programs\nName"）
/// 与列查找看到的是同一份文本
pub fn find_row_containing(grid: &SheetGrid, labels: &[&str]) -> Option<usize> {
    for r in 0..grid.rows() {
        let row_text: String = (0..grid.cols())
            .map(|c| grid.cell(r, c).display())
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = row_text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        if labels.iter().any(|l| normalized.contains(&l.to_uppercase())) {
            return Some(r);
        }
    }
    None
}

/// 在指定行内找首个匹配任一标签的列号（列头常有换行，先压缩空白再比）
pub fn find_column_in_row(grid: &SheetGrid, row: usize, labels: &[&str]) -> Option<usize> {
    if row >= grid.rows() {
        return None;
    }
    for c in 0..grid.cols() {
        let cell = grid.cell(row, c);
        if cell.is_blank() {
            continue;
        }
        if labels.iter().any(|l| cell.contains_ci_normalized(l)) {
            return Some(c);
        }
    }
    None
}

/// 全表扫描：找到标签单元后向右取首个非空值
///
/// 标签命中但右侧全空时继续扫描后续单元（同一标签可能出现多次）
pub fn find_value_right_of(grid: &SheetGrid, labels: &[&str]) -> Option<String> {
    for r in 0..grid.rows() {
        for c in 0..grid.cols() {
            let cell = grid.cell(r, c);
            if cell.is_blank() || !labels.iter().any(|l| cell.contains_ci(l)) {
                continue;
            }
            for k in (c + 1)..grid.cols() {
                let value = grid.cell(r, k);
                if !value.is_blank() {
                    return Some(value.display());
                }
            }
        }
    }
    None
}

/// 全表扫描：找到标签单元后在同列向下取首个非空值（最多向下 4 行）
pub fn find_value_below(grid: &SheetGrid, labels: &[&str]) -> Option<String> {
    for r in 0..grid.rows() {
        for c in 0..grid.cols() {
            let cell = grid.cell(r, c);
            if cell.is_blank() || !labels.iter().any(|l| cell.contains_ci(l)) {
                continue;
            }
            for below in (r + 1)..=(r + BELOW_SEARCH_ROWS).min(grid.rows().saturating_sub(1)) {
                let value = grid.cell(below, c);
                if !value.is_blank() {
                    return Some(value.display());
                }
            }
        }
    }
    None
}
