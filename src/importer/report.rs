// ==========================================
// 铁道模型藏品管理系统 - 导入结果聚合器
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 4.6 结果聚合
// ==========================================
// 职责: 跨分块累积行级结果,产出最终报告
// 红线: 聚合器自身不抛错;部分成功是常态而非异常
// ==========================================

use crate::domain::collection::{ImportReport, RowError};

// ==========================================
// ReportAggregator - 结果聚合器
// ==========================================
#[derive(Debug, Default)]
pub struct ReportAggregator {
    linked_rows: usize,
    independent_rows: usize,
    duplicate_rows: usize,
    expanded_records: usize,
    errors: Vec<RowError>,
    duplicates: Vec<RowError>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录结构解析错误（行已跳过）
    pub fn record_structural_error(&mut self, issue: RowError) {
        self.errors.push(issue);
    }

    /// 记录管理编号重复拒绝
    pub fn record_duplicate(&mut self, row_number: usize, message: String) {
        self.duplicate_rows += 1;
        self.duplicates.push(RowError {
            row_number,
            message,
        });
    }

    /// 记录一行成功链接目录
    pub fn record_linked(&mut self) {
        self.linked_rows += 1;
    }

    /// 记录一行成功创建独立记录
    pub fn record_independent(&mut self) {
        self.independent_rows += 1;
    }

    /// 记录分块提交失败导致的行错误
    pub fn record_commit_error(&mut self, row_number: usize, message: String) {
        self.errors.push(RowError {
            row_number,
            message,
        });
    }

    /// 记录套装展开生成的子件记录数
    pub fn record_expanded(&mut self, count: usize) {
        self.expanded_records += count;
    }

    /// 产出最终报告
    ///
    /// # 口径
    /// - total_rows = 成功 + 重复 + 错误（每个数据行恰好落入一类终态）
    /// - 错误明细按行号排序,保证输出确定性
    pub fn finish(mut self, batch_id: String, elapsed_ms: i64) -> ImportReport {
        self.errors.sort_by_key(|e| e.row_number);
        self.duplicates.sort_by_key(|e| e.row_number);

        let success_rows = self.linked_rows + self.independent_rows;
        ImportReport {
            batch_id,
            total_rows: success_rows + self.duplicate_rows + self.errors.len(),
            success_rows,
            linked_rows: self.linked_rows,
            independent_rows: self.independent_rows,
            duplicate_rows: self.duplicate_rows,
            error_rows: self.errors.len(),
            expanded_records: self.expanded_records,
            errors: self.errors,
            duplicates: self.duplicates,
            elapsed_ms,
        }
    }
}

// ==========================================
// 测试
// ==========================================
