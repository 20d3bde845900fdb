// ==========================================
// 铁道模型藏品管理系统 - 藏品车辆 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::collection::{ImportBatch, OwnedVehicle};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// VehicleRepository Trait
// ==========================================
// 用途: 藏品车辆导入相关数据访问
// 实现者: VehicleRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    // ===== 批量写入（事务化）=====

    /// 在单个事务内批量创建藏品车辆记录
    ///
    /// # 参数
    /// - vehicles: 待创建记录列表（一个分块）
    ///
    /// # 返回
    /// - Ok(usize): 成功创建的记录数
    /// - Err: 数据库错误（整个事务回滚,全有或全无）
    async fn insert_vehicles_tx(&self, vehicles: Vec<OwnedVehicle>) -> RepositoryResult<usize>;

    // ===== 查询与校验 =====

    /// 批量过滤已存在的管理编号（每次导入运行调用一次）
    ///
    /// # 参数
    /// - user_id: 归属用户
    /// - refs: 本次输入中出现的管理编号列表
    ///
    /// # 返回
    /// - Ok(Vec<String>): 其中已在库的管理编号
    async fn filter_existing_refs(
        &self,
        user_id: &str,
        refs: &[String],
    ) -> RepositoryResult<Vec<String>>;

    /// 查询某套装来源已展开生成的子件目录条目ID
    ///
    /// # 参数
    /// - user_id: 归属用户
    /// - set_code: 来源套装品番
    ///
    /// # 用途
    /// - 套装展开 SKIP_EXISTING 去重策略
    async fn list_expanded_component_ids(
        &self,
        user_id: &str,
        set_code: &str,
    ) -> RepositoryResult<Vec<i64>>;

    /// 查询指定用户的全部藏品车辆
    async fn list_vehicles_by_user(&self, user_id: &str) -> RepositoryResult<Vec<OwnedVehicle>>;

    /// 统计指定用户的藏品车辆数
    async fn count_vehicles(&self, user_id: &str) -> RepositoryResult<usize>;

    // ===== 批次管理 =====

    /// 插入导入批次记录
    async fn insert_batch(&self, batch: ImportBatch) -> RepositoryResult<()>;

    /// 查询最近的导入批次
    ///
    /// # 参数
    /// - limit: 返回记录数限制
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}
