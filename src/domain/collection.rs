// ==========================================
// 铁道模型藏品管理系统 - 藏品领域模型
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 3. 数据模型
// 依据: data_dictionary_v0.1.md - owned_vehicle / import_batch 表
// ==========================================

use crate::domain::types::{ProductKind, StorageCase, VehicleStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// CandidateRow - 导入中间结构体
// ==========================================
// 用途: 导入管道中间产物（行解析 → 归并判定 → 此结构）
// 生命周期: 仅在一次导入流程内
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    // 源字段（已类型转换,未校验）
    pub external_ref: Option<String>,    // 管理编号（用户自编号）
    pub brand: Option<String>,           // 厂商
    pub catalog_code: Option<String>,    // 品番
    pub name: Option<String>,            // 商品名
    pub status: VehicleStatus,           // 车辆状态
    pub storage_case: StorageCase,       // 保管状态
    pub purchase_date: Option<NaiveDate>, // 购入日
    pub purchase_price: Option<i64>,     // 购入价格（日元,整数）
    pub notes: Option<String>,           // 备注

    // 元信息
    pub row_number: usize, // 原始文件行号（1起算,用于报告）
}

impl CandidateRow {
    /// 该行是否携带完整的 厂商+品番 匹配键
    pub fn has_brand_code_pair(&self) -> bool {
        let has = |v: &Option<String>| v.as_ref().map(|s| !s.trim().is_empty()).unwrap_or(false);
        has(&self.brand) && has(&self.catalog_code)
    }
}

// ==========================================
// AdHocDescriptor - 独立藏品自述信息
// ==========================================
// 用途: 无目录链接的藏品记录随附的自由描述
// 红线: 与 catalog_entry_id 互斥（二者有且仅有其一有意义）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdHocDescriptor {
    pub brand: Option<String>,        // 厂商（自由文本）
    pub catalog_code: Option<String>, // 品番（自由文本,未经目录校验）
    pub name: String,                 // 名称（必填,无名时使用占位名）
    pub kind: ProductKind,            // 类型（独立记录一律视为单品）
    pub description: Option<String>,  // 补充说明（如"目录未找到"注记）
}

// ==========================================
// OwnedVehicle - 藏品车辆记录
// ==========================================
// 用途: 导入引擎的持久化产物;后续仅由藏品 CRUD 流程修改
// 对齐: schema owned_vehicle 表（自述信息作为影子列存储）
// 不变量: catalog_entry_id 与 adhoc 有且仅有其一有意义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedVehicle {
    // ===== 主键与归属 =====
    pub vehicle_id: String, // 车辆记录ID（UUID）
    pub user_id: String,    // 归属用户

    // ===== 目录链接 / 独立自述（互斥）=====
    pub catalog_entry_id: Option<i64>,   // 目录条目链接（NULL=独立记录）
    pub adhoc: Option<AdHocDescriptor>,  // 独立记录自述（NULL=已链接目录）

    // ===== 用户侧标识 =====
    pub external_ref: String, // 管理编号（可为空串;非空时同一用户内唯一）

    // ===== 状态与购入信息 =====
    pub status: VehicleStatus,
    pub storage_case: StorageCase,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<i64>, // 日元;套装子件不单独计价,恒为 NULL
    pub notes: Option<String>,

    // ===== 套装展开溯源 =====
    pub source_set_code: Option<String>, // 由套装展开生成时记录来源套装品番

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedVehicle {
    /// 构造已链接目录的藏品记录
    pub fn linked(
        user_id: &str,
        entry_id: i64,
        external_ref: String,
        status: VehicleStatus,
        storage_case: StorageCase,
        purchase_date: Option<NaiveDate>,
        purchase_price: Option<i64>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            vehicle_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            catalog_entry_id: Some(entry_id),
            adhoc: None,
            external_ref,
            status,
            storage_case,
            purchase_date,
            purchase_price,
            notes,
            source_set_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 构造独立（无目录链接）藏品记录
    pub fn independent(
        user_id: &str,
        descriptor: AdHocDescriptor,
        external_ref: String,
        status: VehicleStatus,
        storage_case: StorageCase,
        purchase_date: Option<NaiveDate>,
        purchase_price: Option<i64>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            vehicle_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            catalog_entry_id: None,
            adhoc: Some(descriptor),
            external_ref,
            status,
            storage_case,
            purchase_date,
            purchase_price,
            notes,
            source_set_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 不变量检查: 目录链接与独立自述有且仅有其一
    pub fn is_well_formed(&self) -> bool {
        self.catalog_entry_id.is_some() != self.adhoc.is_some()
    }
}

// ==========================================
// RowError - 行级错误
// ==========================================
// 用途: 报告中引用原始行号的人类可读消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize, // 原始文件行号（1起算）
    pub message: String,
}

// ==========================================
// ImportReport - 导入结果报告
// ==========================================
// 用途: 导入入口的最终返回结构;部分成功是常态而非异常
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String, // 批次 ID（UUID）

    // ===== 计数 =====
    pub total_rows: usize,       // 数据行总数（不含被丢弃的前两行）
    pub success_rows: usize,     // 成功行数（linked + independent）
    pub linked_rows: usize,      // 已链接目录行数
    pub independent_rows: usize, // 独立记录行数
    pub duplicate_rows: usize,   // 管理编号重复被拒行数
    pub error_rows: usize,       // 错误行数（结构错误 + 分块提交失败）
    pub expanded_records: usize, // 套装展开生成的子件记录数

    // ===== 明细 =====
    pub errors: Vec<RowError>,     // 行级错误消息
    pub duplicates: Vec<RowError>, // 重复拒绝消息

    // ===== 计时 =====
    pub elapsed_ms: i64,
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 用途: 记录导入批次元信息,供"最近批次"查询
// 对齐: schema import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub user_id: String,
    pub total_rows: i32,
    pub linked_rows: i32,
    pub independent_rows: i32,
    pub duplicate_rows: i32,
    pub error_rows: i32,
    pub expanded_records: i32,
    pub imported_at: Option<DateTime<Utc>>,
    pub elapsed_ms: Option<i32>,
    pub report_json: Option<String>, // 完整报告快照（JSON）
}
