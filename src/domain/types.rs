// ==========================================
// 铁道模型藏品管理系统 - 领域类型定义
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 0.2 封闭枚举约定
// 依据: data_dictionary_v0.1.md - 数据字典
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 产品类型 (Product Kind)
// ==========================================
// 红线: 封闭枚举,不是自由字符串
// 未知类型字符串在仓储读取边界拒绝,不得流入归并逻辑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Single,       // 单品车辆
    Set,          // 套装（含若干子件）
    SetComponent, // 套装子件（通过 parent_set_code 回指所属套装）
}

impl ProductKind {
    /// 数据库存储编码 → 枚举（未知值返回 None,由边界处理）
    pub fn from_db_code(code: &str) -> Option<Self> {
        match code.trim() {
            "SINGLE" => Some(ProductKind::Single),
            "SET" => Some(ProductKind::Set),
            "SET_COMPONENT" => Some(ProductKind::SetComponent),
            _ => None,
        }
    }

    /// 枚举 → 数据库存储编码
    pub fn as_db_code(&self) -> &'static str {
        match self {
            ProductKind::Single => "SINGLE",
            ProductKind::Set => "SET",
            ProductKind::SetComponent => "SET_COMPONENT",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_code())
    }
}

// ==========================================
// 车辆状态 (Vehicle Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// 导入时宽松解析: 未知 token 回落为 NORMAL,不作为行错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Normal,      // 正常
    Broken,      // 故障
    InRepair,    // 修理中
    Retired,     // 废车
    Transferred, // 已转让
}

impl VehicleStatus {
    /// 导入字段宽松解析（大小写不敏感,未知值回落默认值）
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "NORMAL" => VehicleStatus::Normal,
            "BROKEN" => VehicleStatus::Broken,
            "IN_REPAIR" | "REPAIR" => VehicleStatus::InRepair,
            "RETIRED" => VehicleStatus::Retired,
            "TRANSFERRED" => VehicleStatus::Transferred,
            _ => VehicleStatus::Normal,
        }
    }

    pub fn from_db_code(code: &str) -> Option<Self> {
        match code.trim() {
            "NORMAL" => Some(VehicleStatus::Normal),
            "BROKEN" => Some(VehicleStatus::Broken),
            "IN_REPAIR" => Some(VehicleStatus::InRepair),
            "RETIRED" => Some(VehicleStatus::Retired),
            "TRANSFERRED" => Some(VehicleStatus::Transferred),
            _ => None,
        }
    }

    pub fn as_db_code(&self) -> &'static str {
        match self {
            VehicleStatus::Normal => "NORMAL",
            VehicleStatus::Broken => "BROKEN",
            VehicleStatus::InRepair => "IN_REPAIR",
            VehicleStatus::Retired => "RETIRED",
            VehicleStatus::Transferred => "TRANSFERRED",
        }
    }
}

impl Default for VehicleStatus {
    fn default() -> Self {
        VehicleStatus::Normal
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_code())
    }
}

// ==========================================
// 保管状态 (Storage Case)
// ==========================================
// 记录原包装盒保管情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageCase {
    WithCase, // 带原盒
    NoCase,   // 无原盒
    Unknown,  // 不明
}

impl StorageCase {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "WITH_CASE" | "CASE" => StorageCase::WithCase,
            "NO_CASE" => StorageCase::NoCase,
            _ => StorageCase::Unknown,
        }
    }

    pub fn from_db_code(code: &str) -> Option<Self> {
        match code.trim() {
            "WITH_CASE" => Some(StorageCase::WithCase),
            "NO_CASE" => Some(StorageCase::NoCase),
            "UNKNOWN" => Some(StorageCase::Unknown),
            _ => None,
        }
    }

    pub fn as_db_code(&self) -> &'static str {
        match self {
            StorageCase::WithCase => "WITH_CASE",
            StorageCase::NoCase => "NO_CASE",
            StorageCase::Unknown => "UNKNOWN",
        }
    }
}

impl Default for StorageCase {
    fn default() -> Self {
        StorageCase::Unknown
    }
}

impl fmt::Display for StorageCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_code())
    }
}

// ==========================================
// 套装展开去重策略 (Set Expansion Dedup)
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 4.4 展开幂等性
// ALLOW_DUPLICATES: 每次导入都生成子件记录（历史行为）
// SKIP_EXISTING: 同一用户同一套装来源的子件已存在则跳过
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetExpansionDedup {
    AllowDuplicates,
    SkipExisting,
}

impl SetExpansionDedup {
    /// 配置值解析（未知值回落默认策略）
    pub fn from_config_value(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "SKIP_EXISTING" => SetExpansionDedup::SkipExisting,
            _ => SetExpansionDedup::AllowDuplicates,
        }
    }
}

impl Default for SetExpansionDedup {
    fn default() -> Self {
        SetExpansionDedup::AllowDuplicates
    }
}

impl fmt::Display for SetExpansionDedup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetExpansionDedup::AllowDuplicates => write!(f, "ALLOW_DUPLICATES"),
            SetExpansionDedup::SkipExisting => write!(f, "SKIP_EXISTING"),
        }
    }
}
