// ==========================================
// 藏品导入API
// ==========================================
// 职责: 封装藏品导入相关功能,供宿主层（HTTP/桌面壳）调用
// ==========================================

use crate::api::error::ApiError;
use crate::config::ConfigManager;
use crate::domain::collection::{ImportBatch, ImportReport, RowError};
use crate::importer::{UniversalFileParser, VehicleImporter};
use crate::repository::{
    CatalogRepositoryImpl, VehicleRepository, VehicleRepositoryImpl,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次ID（由导入器生成,用于批次追溯）
    pub batch_id: String,
    /// 数据行总数
    pub total_rows: usize,
    /// 成功行数（linked + independent）
    pub imported: usize,
    /// 已链接目录行数
    pub linked: usize,
    /// 独立记录行数
    pub independent: usize,
    /// 管理编号重复被拒行数
    pub duplicates: usize,
    /// 错误行数
    pub errors: usize,
    /// 套装展开生成的子件记录数
    pub expanded: usize,
    /// 行级错误明细（行号1起算）
    pub error_details: Vec<RowError>,
    /// 重复拒绝明细
    pub duplicate_details: Vec<RowError>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl From<ImportReport> for ImportApiResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            batch_id: report.batch_id,
            total_rows: report.total_rows,
            imported: report.success_rows,
            linked: report.linked_rows,
            independent: report.independent_rows,
            duplicates: report.duplicate_rows,
            errors: report.error_rows,
            expanded: report.expanded_records,
            error_details: report.errors,
            duplicate_details: report.duplicates,
            elapsed_ms: report.elapsed_ms,
        }
    }
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 从原始文本导入藏品数据
    ///
    /// # 参数
    /// - raw_text: 完整导入文本
    /// - user_id: 归属用户
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果（部分成功是常态）
    /// - Err(ApiError): 仅整体输入非法或基础设施错误
    pub async fn import_collection_text(
        &self,
        raw_text: &str,
        user_id: &str,
    ) -> Result<ImportApiResponse, ApiError> {
        if user_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("用户标识不能为空".to_string()));
        }

        let importer = self.create_importer()?;
        let report = importer.import_text(raw_text, user_id).await?;
        Ok(report.into())
    }

    /// 从文件导入藏品数据（CSV / Excel）
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv/.xlsx/.xls）
    /// - user_id: 归属用户
    pub async fn import_collection_file(
        &self,
        file_path: &str,
        user_id: &str,
    ) -> Result<ImportApiResponse, ApiError> {
        if user_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("用户标识不能为空".to_string()));
        }

        let sheet = UniversalFileParser.parse(file_path)?;
        let importer = self.create_importer()?;
        let report = importer.import_sheet(sheet, user_id).await?;
        Ok(report.into())
    }

    /// 批量导入多个文件（并发执行,每个文件独立一次运行）
    ///
    /// # 参数
    /// - file_paths: 文件路径列表
    /// - user_id: 归属用户
    ///
    /// # 返回
    /// - 每个文件一个结果,失败以字符串消息返回（不中断其他文件）
    pub async fn batch_import(
        &self,
        file_paths: Vec<String>,
        user_id: &str,
    ) -> Vec<Result<ImportApiResponse, String>> {
        use futures::future::join_all;

        tracing::info!(count = file_paths.len(), "开始批量导入文件");

        let import_tasks = file_paths.into_iter().map(|path| async move {
            tracing::info!(file = %path, "开始导入文件");
            match self.import_collection_file(&path, user_id).await {
                Ok(response) => {
                    tracing::info!(file = %path, imported = response.imported, "文件导入成功");
                    Ok(response)
                }
                Err(e) => {
                    tracing::error!(file = %path, error = %e, "文件导入失败");
                    Err(format!("文件 {} 导入失败: {}", path, e))
                }
            }
        });

        let results = join_all(import_tasks).await;

        tracing::info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }

    /// 查询最近的导入批次
    ///
    /// # 参数
    /// - limit: 返回记录数（限制在 1-100 之间）
    pub async fn list_recent_batches(&self, limit: usize) -> Result<Vec<ImportBatch>, ApiError> {
        let limit = limit.clamp(1, 100);
        let repo = VehicleRepositoryImpl::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseError(format!("创建仓储失败: {}", e)))?;

        let batches = repo.get_recent_batches(limit).await?;
        Ok(batches)
    }

    /// 创建VehicleImporter实例
    fn create_importer(
        &self,
    ) -> Result<
        VehicleImporter<CatalogRepositoryImpl, VehicleRepositoryImpl, ConfigManager>,
        ApiError,
    > {
        let catalog_repo = CatalogRepositoryImpl::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseError(format!("创建目录仓储失败: {}", e)))?;
        let vehicle_repo = VehicleRepositoryImpl::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseError(format!("创建藏品仓储失败: {}", e)))?;
        let config = ConfigManager::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseError(format!("创建配置管理器失败: {}", e)))?;

        Ok(VehicleImporter::new(
            Arc::new(catalog_repo),
            Arc::new(vehicle_repo),
            Arc::new(config),
        ))
    }
}
