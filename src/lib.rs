// ==========================================
// 铁道模型藏品管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 目录对账与批量导入引擎（HTTP/会话/界面由宿主层提供）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建库）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ProductKind, SetExpansionDedup, StorageCase, VehicleStatus};

// 领域实体
pub use domain::{
    AdHocDescriptor, CandidateRow, CatalogEntry, ImportBatch, ImportReport, NewCatalogEntry,
    OwnedVehicle, RowError,
};

// 导入引擎
pub use importer::{
    BatchCommitter, Disposition, ReferenceIndex, ReportAggregator, RowParser, RowReconciler,
    SetExpansionEngine, VehicleImporter,
};

// API
pub use api::{ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "铁道模型藏品管理系统";
