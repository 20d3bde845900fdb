// ==========================================
// 铁道模型藏品管理系统 - 分块提交器
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 4.5 分块提交
// ==========================================
// 职责: 按固定分块大小事务化写入归并结果
// 红线: 分块严格按输入顺序串行处理（运行内重复判定依赖此确定性）
// 红线: 单个坏分块绝不中止整次运行;分块事务超时必须低于外部运行时限
// ==========================================

use crate::domain::collection::{AdHocDescriptor, CandidateRow, OwnedVehicle};
use crate::domain::types::ProductKind;
use crate::importer::reconciler::Disposition;
use crate::importer::report::ReportAggregator;
use crate::importer::set_expansion::ExpansionJob;
use crate::repository::vehicle_repo::VehicleRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

// ==========================================
// ReconciledRow - 已判定行
// ==========================================
#[derive(Debug, Clone)]
pub struct ReconciledRow {
    pub row: CandidateRow,
    pub disposition: Disposition,
}

// ==========================================
// BatchCommitter - 分块提交器
// ==========================================
pub struct BatchCommitter<V>
where
    V: VehicleRepository + ?Sized,
{
    repo: Arc<V>,
    chunk_size: usize,
    tx_timeout: Duration,
}

impl<V> BatchCommitter<V>
where
    V: VehicleRepository + ?Sized,
{
    /// 创建分块提交器
    ///
    /// # 参数
    /// - chunk_size: 分块大小（固定常量,不随输入规模变化）
    /// - tx_timeout: 单分块事务硬超时
    pub fn new(repo: Arc<V>, chunk_size: usize, tx_timeout: Duration) -> Self {
        Self {
            repo,
            chunk_size: chunk_size.max(1),
            tx_timeout,
        }
    }

    /// 提交全部已判定行
    ///
    /// # 参数
    /// - user_id: 归属用户
    /// - reconciled: 完整判定结果序列（输入顺序）
    /// - aggregator: 结果聚合器（行级终态在此落账）
    ///
    /// # 返回
    /// - Vec<ExpansionJob>: 提交成功分块中套装行产生的展开任务
    ///
    /// # 失败语义
    /// - 分块事务失败/超时: 该分块全部待创建行标记错误,继续下一分块
    /// - 重复拒绝行为终态,不参与提交,也不因分块失败转为错误
    pub async fn commit_all(
        &self,
        user_id: &str,
        reconciled: Vec<ReconciledRow>,
        aggregator: &mut ReportAggregator,
    ) -> Vec<ExpansionJob> {
        let mut expansion_jobs = Vec::new();
        let total_chunks = reconciled.len().div_ceil(self.chunk_size);

        for (chunk_no, chunk) in reconciled.chunks(self.chunk_size).enumerate() {
            // === 组装本分块 ===
            let mut vehicles = Vec::new();
            // (行号, 是否链接目录) — 提交结果回填用
            let mut creatable: Vec<(usize, bool)> = Vec::new();
            let mut chunk_jobs = Vec::new();

            for item in chunk {
                match &item.disposition {
                    Disposition::DuplicateRejected { message, .. } => {
                        // 终态,不参与提交
                        aggregator.record_duplicate(item.row.row_number, message.clone());
                    }
                    Disposition::Linked { entry } => {
                        vehicles.push(Self::build_linked(user_id, &item.row, entry.entry_id));
                        creatable.push((item.row.row_number, true));

                        // 套装行: 分块提交成功后才真正入队
                        if entry.kind == ProductKind::Set {
                            chunk_jobs.push(ExpansionJob {
                                set_entry: entry.clone(),
                                parent_row_number: item.row.row_number,
                                parent_external_ref: item
                                    .row
                                    .external_ref
                                    .as_deref()
                                    .unwrap_or_default()
                                    .trim()
                                    .to_string(),
                                status: item.row.status,
                                storage_case: item.row.storage_case,
                                purchase_date: item.row.purchase_date,
                            });
                        }
                    }
                    Disposition::Independent { descriptor } => {
                        vehicles.push(Self::build_independent(
                            user_id,
                            &item.row,
                            descriptor.clone(),
                        ));
                        creatable.push((item.row.row_number, false));
                    }
                }
            }

            if vehicles.is_empty() {
                continue;
            }

            // === 事务提交（硬超时）===
            let commit = tokio::time::timeout(
                self.tx_timeout,
                self.repo.insert_vehicles_tx(vehicles),
            )
            .await;

            match commit {
                Ok(Ok(count)) => {
                    debug!(
                        chunk = chunk_no + 1,
                        total_chunks = total_chunks,
                        count = count,
                        "分块提交成功"
                    );
                    for (_, is_linked) in &creatable {
                        if *is_linked {
                            aggregator.record_linked();
                        } else {
                            aggregator.record_independent();
                        }
                    }
                    expansion_jobs.extend(chunk_jobs);
                }
                Ok(Err(e)) => {
                    let message = e.to_string();
                    warn!(
                        chunk = chunk_no + 1,
                        total_chunks = total_chunks,
                        error = %message,
                        "分块提交失败,整块标记错误后继续"
                    );
                    for (row_number, _) in &creatable {
                        aggregator
                            .record_commit_error(*row_number, format!("分块提交失败: {}", message));
                    }
                }
                Err(_elapsed) => {
                    warn!(
                        chunk = chunk_no + 1,
                        total_chunks = total_chunks,
                        timeout_ms = self.tx_timeout.as_millis() as u64,
                        "分块事务超时,整块标记错误后继续"
                    );
                    for (row_number, _) in &creatable {
                        aggregator.record_commit_error(
                            *row_number,
                            format!("分块事务超时（{} ms）", self.tx_timeout.as_millis()),
                        );
                    }
                }
            }
        }

        expansion_jobs
    }

    /// 已判定行 → 已链接藏品记录
    fn build_linked(user_id: &str, row: &CandidateRow, entry_id: i64) -> OwnedVehicle {
        OwnedVehicle::linked(
            user_id,
            entry_id,
            row.external_ref
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            row.status,
            row.storage_case,
            row.purchase_date,
            row.purchase_price,
            row.notes.clone(),
        )
    }

    /// 已判定行 → 独立藏品记录
    fn build_independent(
        user_id: &str,
        row: &CandidateRow,
        descriptor: AdHocDescriptor,
    ) -> OwnedVehicle {
        OwnedVehicle::independent(
            user_id,
            descriptor,
            row.external_ref
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            row.status,
            row.storage_case,
            row.purchase_date,
            row.purchase_price,
            row.notes.clone(),
        )
    }
}

// ==========================================
// 测试
// ==========================================
