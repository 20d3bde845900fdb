// ==========================================
// 铁道模型藏品管理系统 - 目录领域模型
// ==========================================
// 依据: data_dictionary_v0.1.md - catalog_entry 表
// 红线: 目录条目对导入引擎只读,全体用户共享
// ==========================================

use crate::domain::types::ProductKind;
use serde::{Deserialize, Serialize};

// ==========================================
// CatalogEntry - 目录条目（参考产品定义）
// ==========================================
// 用途: 归并判定的匹配目标;导入引擎每次运行一次性批量读取
// 对齐: schema catalog_entry 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    // ===== 主键 =====
    pub entry_id: i64, // 目录条目ID

    // ===== 产品标识 =====
    pub brand: String,                // 厂商（KATO / TOMIX / ...）
    pub catalog_code: Option<String>, // 品番（可空;无品番条目不参与编码匹配）
    pub name: String,                 // 商品名

    // ===== 类型与套装关系 =====
    pub kind: ProductKind,              // 产品类型（单品/套装/套装子件）
    pub parent_set_code: Option<String>, // 所属套装品番（仅 kind=SET_COMPONENT 时有效）
}

impl CatalogEntry {
    /// 该条目是否可被 "brand:code" 键匹配
    pub fn is_code_matchable(&self) -> bool {
        self.catalog_code
            .as_ref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
    }
}

// ==========================================
// NewCatalogEntry - 目录条目写入载体
// ==========================================
// 用途: 目录维护/测试数据播种（entry_id 由数据库分配）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCatalogEntry {
    pub brand: String,
    pub catalog_code: Option<String>,
    pub name: String,
    pub kind: ProductKind,
    pub parent_set_code: Option<String>,
}
