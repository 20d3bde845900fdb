// ==========================================
// 铁道模型藏品管理系统 - 配置层
// ==========================================
// 职责: 系统配置读取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

pub use config_manager::ConfigManager;
pub use import_config_trait::{
    ImportConfigReader, DEFAULT_CHUNK_TX_TIMEOUT_MS, DEFAULT_IMPORT_CHUNK_SIZE,
};
