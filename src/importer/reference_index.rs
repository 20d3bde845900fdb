// ==========================================
// 铁道模型藏品管理系统 - 目录参照索引
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 4.2 参照索引
// ==========================================
// 职责: 每次导入运行构建一次的内存索引,避免逐行查库
// 不变量: 运行期间只读;每次运行从头重建（目录可能在两次运行间变更）
// ==========================================

use crate::domain::catalog::CatalogEntry;
use crate::domain::types::ProductKind;
use std::collections::HashMap;

// ==========================================
// ReferenceIndex - 目录参照索引
// ==========================================
/// 目录参照索引
///
/// # 键口径
/// - 小写 "brand:code";无品番的条目不进索引（无法按编码匹配）
///
/// # 附加索引
/// - 套装子件按所属套装品番（小写）分组,套装展开无需再次读库
pub struct ReferenceIndex {
    by_brand_code: HashMap<String, CatalogEntry>,
    components_by_parent: HashMap<String, Vec<CatalogEntry>>,
}

impl ReferenceIndex {
    /// 从一次批量读取的目录条目构建索引
    pub fn build(entries: Vec<CatalogEntry>) -> Self {
        let mut by_brand_code = HashMap::new();
        let mut components_by_parent: HashMap<String, Vec<CatalogEntry>> = HashMap::new();

        for entry in entries {
            if entry.kind == ProductKind::SetComponent {
                if let Some(parent_code) = &entry.parent_set_code {
                    let parent_key = parent_code.trim().to_lowercase();
                    if !parent_key.is_empty() {
                        components_by_parent
                            .entry(parent_key)
                            .or_default()
                            .push(entry.clone());
                    }
                }
            }

            if entry.is_code_matchable() {
                let key = Self::key(
                    &entry.brand,
                    entry.catalog_code.as_deref().unwrap_or_default(),
                );
                by_brand_code.insert(key, entry);
            }
        }

        Self {
            by_brand_code,
            components_by_parent,
        }
    }

    /// 按 厂商+品番 查找（大小写不敏感,O(1)）
    pub fn lookup(&self, brand: &str, code: &str) -> Option<&CatalogEntry> {
        self.by_brand_code.get(&Self::key(brand, code))
    }

    /// 查找回指某套装品番的全部子件条目
    pub fn components_of(&self, set_code: &str) -> &[CatalogEntry] {
        self.components_by_parent
            .get(&set_code.trim().to_lowercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 可匹配条目数
    pub fn len(&self) -> usize {
        self.by_brand_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_brand_code.is_empty()
    }

    fn key(brand: &str, code: &str) -> String {
        format!("{}:{}", brand.trim().to_lowercase(), code.trim().to_lowercase())
    }
}

// ==========================================
// 测试
// ==========================================
