// ==========================================
// 铁道模型藏品管理系统 - 行归并判定器
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 4.3 归并判定
// ==========================================
// 职责: 对单行决定去向: 重复拒绝 / 链接目录 / 独立记录
// 红线: 纯函数,不做任何网络或存储调用（可独立单测）
// 红线: 判定顺序为硬分支,无穿透: 重复 → 编码匹配 → 独立
// ==========================================

use crate::domain::catalog::CatalogEntry;
use crate::domain::collection::{AdHocDescriptor, CandidateRow};
use crate::domain::types::ProductKind;
use crate::importer::reference_index::ReferenceIndex;
use std::collections::HashSet;

/// 无名独立记录的占位名称
pub const UNKNOWN_NAME_PLACEHOLDER: &str = "名称不明";

// ==========================================
// Disposition - 单行判定结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// 管理编号重复,行被拒绝（不创建记录）
    DuplicateRejected {
        external_ref: String,
        message: String,
    },
    /// 链接到目录条目（条目类型为套装时由提交方追加展开任务）
    Linked { entry: CatalogEntry },
    /// 独立记录（无目录链接,携带自述信息）
    Independent { descriptor: AdHocDescriptor },
}

// ==========================================
// RowReconciler - 行归并判定器
// ==========================================
pub struct RowReconciler;

impl RowReconciler {
    /// 对单行做归并判定
    ///
    /// # 参数
    /// - row: 候选行
    /// - index: 目录参照索引（运行期只读）
    /// - seen_refs: 已占用的管理编号集合（运行前批量预载 + 运行内累积）
    ///
    /// # 判定顺序（硬分支）
    /// 1. 管理编号非空且已占用 → DuplicateRejected（先于目录匹配,避免无谓工作）
    /// 2. 厂商+品番 齐备 → 索引查找: 命中 → Linked;未命中 → Independent（附"目录未找到"注记）
    /// 3. 其余 → Independent（有名用名,无名用占位名;绝不静默丢行）
    pub fn reconcile(
        row: &CandidateRow,
        index: &ReferenceIndex,
        seen_refs: &HashSet<String>,
    ) -> Disposition {
        // === 分支 1: 管理编号重复检查 ===
        if let Some(external_ref) = row.external_ref.as_deref() {
            let trimmed = external_ref.trim();
            if !trimmed.is_empty() && seen_refs.contains(trimmed) {
                return Disposition::DuplicateRejected {
                    external_ref: trimmed.to_string(),
                    message: format!("管理编号已存在: {}", trimmed),
                };
            }
        }

        // === 分支 2: 厂商+品番 编码匹配 ===
        if row.has_brand_code_pair() {
            let brand = row.brand.as_deref().unwrap_or_default();
            let code = row.catalog_code.as_deref().unwrap_or_default();

            if let Some(entry) = index.lookup(brand, code) {
                return Disposition::Linked {
                    entry: entry.clone(),
                };
            }

            // 未命中: 以提供的 厂商/品番/名称 合成自述信息（无名时用 "厂商 品番" 组合名）
            let name = row
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("{} {}", brand.trim(), code.trim()));

            return Disposition::Independent {
                descriptor: AdHocDescriptor {
                    brand: row.brand.clone(),
                    catalog_code: row.catalog_code.clone(),
                    name,
                    kind: ProductKind::Single,
                    description: Some(format!(
                        "目录中未找到 {} {},已作为独立藏品导入",
                        brand.trim(),
                        code.trim()
                    )),
                },
            };
        }

        // === 分支 3: 无编码对,无条件独立 ===
        let name = row
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_NAME_PLACEHOLDER.to_string());

        Disposition::Independent {
            descriptor: AdHocDescriptor {
                brand: row.brand.clone(),
                catalog_code: None,
                name,
                kind: ProductKind::Single,
                description: None,
            },
        }
    }
}

// ==========================================
// 测试
// ==========================================
