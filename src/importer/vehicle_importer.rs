// ==========================================
// 铁道模型藏品管理系统 - 藏品导入器
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 2. 总体数据流
// ==========================================
// 职责: 整合导入流程: 解析 → 索引 → 归并 → 分块提交 → 套装展开 → 报告
// 红线: 行级问题只进报告,绝不抛错;仅整体输入非法才返回 Err
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::collection::{ImportBatch, ImportReport};
use crate::importer::batch_committer::{BatchCommitter, ReconciledRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::reconciler::{Disposition, RowReconciler};
use crate::importer::reference_index::ReferenceIndex;
use crate::importer::report::ReportAggregator;
use crate::importer::row_parser::{ParsedSheet, RowParser};
use crate::importer::set_expansion::SetExpansionEngine;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::vehicle_repo::VehicleRepository;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// VehicleImporter - 藏品导入器
// ==========================================
pub struct VehicleImporter<R, V, C>
where
    R: CatalogRepository + ?Sized,
    V: VehicleRepository + ?Sized,
    C: ImportConfigReader + ?Sized,
{
    catalog_repo: Arc<R>,
    vehicle_repo: Arc<V>,
    config: Arc<C>,
    parser: RowParser,
}

impl<R, V, C> VehicleImporter<R, V, C>
where
    R: CatalogRepository + ?Sized,
    V: VehicleRepository + ?Sized,
    C: ImportConfigReader + ?Sized,
{
    /// 创建新的 VehicleImporter 实例
    ///
    /// # 参数
    /// - catalog_repo: 目录仓储（只读）
    /// - vehicle_repo: 藏品车辆仓储
    /// - config: 配置读取器
    pub fn new(catalog_repo: Arc<R>, vehicle_repo: Arc<V>, config: Arc<C>) -> Self {
        Self {
            catalog_repo,
            vehicle_repo,
            config,
            parser: RowParser::new(),
        }
    }

    /// 从原始文本导入藏品数据（主入口）
    ///
    /// # 参数
    /// - raw_text: 完整导入文本（第1行行号列,第2行表头,第3行起数据）
    /// - user_id: 归属用户
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入报告（部分成功是常态）
    /// - Err(ImportError): 仅整体输入非法（空内容/缺表头）
    pub async fn import_text(&self, raw_text: &str, user_id: &str) -> ImportResult<ImportReport> {
        let sheet = self.parser.parse_text(raw_text)?;
        self.import_sheet(sheet, user_id).await
    }

    /// 从已解析的记录表导入（文本/文件路径共用的主流程）
    ///
    /// # 流程
    /// 1. 批量读取目录 → 构建参照索引
    /// 2. 批量预载本次输入涉及的已占用管理编号
    /// 3. 逐行归并判定（纯函数;运行内重复在此交叉检查）
    /// 4. 分块事务提交（失败隔离到分块）
    /// 5. 排空套装展开任务（尽力而为）
    /// 6. 汇总报告并落库批次记录
    pub async fn import_sheet(
        &self,
        sheet: ParsedSheet,
        user_id: &str,
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();

        info!(
            batch_id = %batch_id,
            user_id = %user_id,
            data_rows = sheet.rows.len(),
            structural_issues = sheet.issues.len(),
            "开始导入藏品数据"
        );

        // === 步骤 1: 构建目录参照索引（单次批量读取）===
        debug!("步骤 1: 构建目录参照索引");
        let entries = self.catalog_repo.list_entries().await?;
        let index = ReferenceIndex::build(entries);
        debug!(matchable_entries = index.len(), "参照索引构建完成");

        // === 步骤 2: 预载已占用管理编号（按本次输入过滤）===
        debug!("步骤 2: 预载已占用管理编号");
        let input_refs: Vec<String> = sheet
            .rows
            .iter()
            .filter_map(|r| r.external_ref.as_deref())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let existing = self
            .vehicle_repo
            .filter_existing_refs(user_id, &input_refs)
            .await?;
        let mut seen_refs: HashSet<String> = existing.into_iter().collect();
        debug!(preloaded = seen_refs.len(), "管理编号预载完成");

        // === 步骤 3: 逐行归并判定 ===
        debug!("步骤 3: 逐行归并判定");
        let mut reconciled = Vec::with_capacity(sheet.rows.len());
        for row in sheet.rows {
            let disposition = RowReconciler::reconcile(&row, &index, &seen_refs);

            // 运行内交叉检查: 被接受行占用其管理编号,同批后续重复行将被拒绝
            if !matches!(disposition, Disposition::DuplicateRejected { .. }) {
                if let Some(external_ref) = row.external_ref.as_deref() {
                    let trimmed = external_ref.trim();
                    if !trimmed.is_empty() {
                        seen_refs.insert(trimmed.to_string());
                    }
                }
            }

            reconciled.push(ReconciledRow { row, disposition });
        }

        // 结构错误先落账
        let mut aggregator = ReportAggregator::new();
        for issue in sheet.issues {
            aggregator.record_structural_error(issue);
        }

        // === 步骤 4: 分块事务提交 ===
        debug!("步骤 4: 分块事务提交");
        let chunk_size = self
            .config
            .get_import_chunk_size()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "import_chunk_size".to_string(),
                message: e.to_string(),
            })?;
        let tx_timeout_ms = self
            .config
            .get_chunk_tx_timeout_ms()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "chunk_tx_timeout_ms".to_string(),
                message: e.to_string(),
            })?;

        let committer = BatchCommitter::new(
            Arc::clone(&self.vehicle_repo),
            chunk_size,
            Duration::from_millis(tx_timeout_ms),
        );
        let expansion_jobs = committer
            .commit_all(user_id, reconciled, &mut aggregator)
            .await;

        // === 步骤 5: 排空套装展开任务（尽力而为,独立错误通道）===
        debug!(jobs = expansion_jobs.len(), "步骤 5: 套装展开");
        let dedup = self
            .config
            .get_set_expansion_dedup()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "set_expansion_dedup".to_string(),
                message: e.to_string(),
            })?;
        let expander = SetExpansionEngine::new(Arc::clone(&self.vehicle_repo), dedup);
        for job in &expansion_jobs {
            match expander.expand(user_id, &index, job).await {
                Ok(count) => aggregator.record_expanded(count),
                Err(e) => {
                    // 展开失败不归属任何行的终态,仅记日志
                    warn!(
                        set = %job.set_entry.catalog_code.as_deref().unwrap_or("?"),
                        parent_row = job.parent_row_number,
                        error = %e,
                        "套装展开失败（不影响父记录）"
                    );
                }
            }
        }

        // === 步骤 6: 汇总报告 + 批次落库 ===
        let elapsed = start_time.elapsed();
        let report = aggregator.finish(batch_id.clone(), elapsed.as_millis() as i64);

        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            user_id: user_id.to_string(),
            total_rows: report.total_rows as i32,
            linked_rows: report.linked_rows as i32,
            independent_rows: report.independent_rows as i32,
            duplicate_rows: report.duplicate_rows as i32,
            error_rows: report.error_rows as i32,
            expanded_records: report.expanded_records as i32,
            imported_at: Some(Utc::now()),
            elapsed_ms: Some(elapsed.as_millis() as i32),
            report_json: serde_json::to_string(&report).ok(),
        };
        if let Err(e) = self.vehicle_repo.insert_batch(batch).await {
            // 批次记录是附属元信息,写入失败不影响已完成的导入
            warn!(batch_id = %batch_id, error = %e, "批次记录写入失败");
        }

        info!(
            batch_id = %batch_id,
            total = report.total_rows,
            linked = report.linked_rows,
            independent = report.independent_rows,
            duplicates = report.duplicate_rows,
            errors = report.error_rows,
            expanded = report.expanded_records,
            elapsed_ms = report.elapsed_ms,
            "藏品数据导入完成"
        );

        Ok(report)
    }
}
