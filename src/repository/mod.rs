// ==========================================
// 铁道模型藏品管理系统 - 数据仓储层
// ==========================================
// 职责: 数据访问接口与 rusqlite 实现
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

pub mod catalog_repo;
pub mod catalog_repo_impl;
pub mod error;
pub mod vehicle_repo;
pub mod vehicle_repo_impl;

// 重导出核心类型
pub use catalog_repo::CatalogRepository;
pub use catalog_repo_impl::CatalogRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
pub use vehicle_repo::VehicleRepository;
pub use vehicle_repo_impl::VehicleRepositoryImpl;
