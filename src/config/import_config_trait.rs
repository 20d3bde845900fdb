// ==========================================
// 铁道模型藏品管理系统 - 导入配置读取 Trait
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 4.5 分块提交 / 4.4 展开幂等性
// 职责: 定义导入引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::SetExpansionDedup;
use async_trait::async_trait;
use std::error::Error;

/// 分块大小默认值（行/分块）
pub const DEFAULT_IMPORT_CHUNK_SIZE: usize = 50;

/// 分块事务超时默认值（毫秒）
/// 必须显著低于调用方的整体运行时限,保证慢分块不会吃掉全部预算
pub const DEFAULT_CHUNK_TX_TIMEOUT_MS: u64 = 10_000;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入引擎所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取分块大小（每个事务写入的行数）
    ///
    /// # 默认值
    /// - 50
    ///
    /// # 说明
    /// - 固定常量,不随输入规模变化
    async fn get_import_chunk_size(&self) -> Result<usize, Box<dyn Error>>;

    /// 获取分块事务超时（毫秒）
    ///
    /// # 默认值
    /// - 10000
    ///
    /// # 说明
    /// - 超时的分块整体标记为错误,处理继续下一分块
    async fn get_chunk_tx_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    /// 获取套装展开去重策略
    ///
    /// # 默认值
    /// - ALLOW_DUPLICATES（历史行为:重复导入重复生成）
    async fn get_set_expansion_dedup(&self) -> Result<SetExpansionDedup, Box<dyn Error>>;
}
