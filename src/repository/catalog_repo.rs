// ==========================================
// 铁道模型藏品管理系统 - 目录 Repository Trait
// ==========================================
// 职责: 定义目录数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::catalog::{CatalogEntry, NewCatalogEntry};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// CatalogRepository Trait
// ==========================================
// 用途: 目录条目数据访问
// 实现者: CatalogRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 批量读取全部目录条目（每次导入运行调用一次）
    ///
    /// # 返回
    /// - Ok(Vec<CatalogEntry>): 全部可用条目
    ///
    /// # 说明
    /// - 类型字符串非法的条目在此边界被跳过并告警,不进入结果
    async fn list_entries(&self) -> RepositoryResult<Vec<CatalogEntry>>;

    /// 插入一条目录条目
    ///
    /// # 参数
    /// - entry: 待插入条目（entry_id 由数据库分配）
    ///
    /// # 返回
    /// - Ok(i64): 新条目的 entry_id
    async fn insert_entry(&self, entry: NewCatalogEntry) -> RepositoryResult<i64>;

    /// 统计 catalog_entry 表记录数
    async fn count_entries(&self) -> RepositoryResult<usize>;
}
