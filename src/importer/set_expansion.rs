// ==========================================
// 铁道模型藏品管理系统 - 套装展开引擎
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 4.4 套装展开
// ==========================================
// 职责: 按目录子件清单为套装记录合成子件藏品记录
// 红线: 尽力而为,独立于父行事务;失败仅记日志,绝不回滚父记录
// ==========================================

use crate::domain::catalog::CatalogEntry;
use crate::domain::collection::OwnedVehicle;
use crate::domain::types::{SetExpansionDedup, StorageCase, VehicleStatus};
use crate::importer::error::ImportResult;
use crate::importer::reference_index::ReferenceIndex;
use crate::repository::vehicle_repo::VehicleRepository;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// ExpansionJob - 套装展开任务
// ==========================================
// 用途: 分块提交成功时入队,主循环结束后统一排空
#[derive(Debug, Clone)]
pub struct ExpansionJob {
    pub set_entry: CatalogEntry,          // 套装目录条目（kind=SET）
    pub parent_row_number: usize,         // 父行原始行号
    pub parent_external_ref: String,      // 父行管理编号（可为空串）
    pub status: VehicleStatus,            // 自父行继承
    pub storage_case: StorageCase,        // 自父行继承
    pub purchase_date: Option<NaiveDate>, // 自父行继承
}

// ==========================================
// SetExpansionEngine - 套装展开引擎
// ==========================================
pub struct SetExpansionEngine<V>
where
    V: VehicleRepository + ?Sized,
{
    repo: Arc<V>,
    dedup: SetExpansionDedup,
}

impl<V> SetExpansionEngine<V>
where
    V: VehicleRepository + ?Sized,
{
    pub fn new(repo: Arc<V>, dedup: SetExpansionDedup) -> Self {
        Self { repo, dedup }
    }

    /// 执行一个套装展开任务
    ///
    /// # 参数
    /// - user_id: 归属用户
    /// - index: 目录参照索引（子件清单来源,不再读库）
    /// - job: 展开任务
    ///
    /// # 返回
    /// - Ok(usize): 本次生成的子件记录数
    ///
    /// # 子件记录口径
    /// - 链接到子件目录条目;管理编号留空（子件不参与用户自编号）
    /// - 状态/保管状态/购入日自父行复制;价格不单独计价,恒为空
    /// - 备注记录来源套装与父记录标识;source_set_code 记录溯源键
    pub async fn expand(
        &self,
        user_id: &str,
        index: &ReferenceIndex,
        job: &ExpansionJob,
    ) -> ImportResult<usize> {
        let set_code = match job.set_entry.catalog_code.as_deref() {
            Some(code) if !code.trim().is_empty() => code.trim(),
            // 经编码匹配链接的套装必有品番;此处仅防御空值
            _ => return Ok(0),
        };

        let components = index.components_of(set_code);
        if components.is_empty() {
            debug!(set_code = %set_code, "套装无已知子件,跳过展开");
            return Ok(0);
        }

        // SKIP_EXISTING: 同一用户同一套装来源已生成的子件不再重复生成
        let already_expanded: HashSet<i64> = match self.dedup {
            SetExpansionDedup::SkipExisting => self
                .repo
                .list_expanded_component_ids(user_id, set_code)
                .await?
                .into_iter()
                .collect(),
            SetExpansionDedup::AllowDuplicates => HashSet::new(),
        };

        let parent_label = if job.parent_external_ref.trim().is_empty() {
            format!("行 {}", job.parent_row_number)
        } else {
            job.parent_external_ref.trim().to_string()
        };

        let mut vehicles = Vec::new();
        for component in components {
            if already_expanded.contains(&component.entry_id) {
                debug!(
                    set_code = %set_code,
                    entry_id = component.entry_id,
                    "子件已存在,按去重策略跳过"
                );
                continue;
            }

            let mut vehicle = OwnedVehicle::linked(
                user_id,
                component.entry_id,
                String::new(),
                job.status,
                job.storage_case,
                job.purchase_date,
                None,
                Some(format!(
                    "由套装 {} 展开生成（父记录: {}）",
                    set_code, parent_label
                )),
            );
            vehicle.source_set_code = Some(set_code.to_string());
            vehicles.push(vehicle);
        }

        if vehicles.is_empty() {
            return Ok(0);
        }

        // 独立事务写入,与父分块事务解耦
        let count = self.repo.insert_vehicles_tx(vehicles).await?;
        Ok(count)
    }
}

// ==========================================
// 测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collection::ImportBatch;
    use crate::domain::types::ProductKind;
    use crate::repository::error::RepositoryResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // 测试用内存 Repository
    #[derive(Default)]
    struct RecordingRepo {
        inserted: Mutex<Vec<OwnedVehicle>>,
        pre_expanded: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl VehicleRepository for RecordingRepo {
        async fn insert_vehicles_tx(
            &self,
            vehicles: Vec<OwnedVehicle>,
        ) -> RepositoryResult<usize> {
            let count = vehicles.len();
            self.inserted.lock().unwrap().extend(vehicles);
            Ok(count)
        }

        async fn filter_existing_refs(
            &self,
            _user_id: &str,
            _refs: &[String],
        ) -> RepositoryResult<Vec<String>> {
            Ok(vec![])
        }

        async fn list_expanded_component_ids(
            &self,
            _user_id: &str,
            _set_code: &str,
        ) -> RepositoryResult<Vec<i64>> {
            Ok(self.pre_expanded.lock().unwrap().clone())
        }

        async fn list_vehicles_by_user(
            &self,
            _user_id: &str,
        ) -> RepositoryResult<Vec<OwnedVehicle>> {
            Ok(vec![])
        }

        async fn count_vehicles(&self, _user_id: &str) -> RepositoryResult<usize> {
            Ok(self.inserted.lock().unwrap().len())
        }

        async fn insert_batch(&self, _batch: ImportBatch) -> RepositoryResult<()> {
            Ok(())
        }

        async fn get_recent_batches(&self, _limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
            Ok(vec![])
        }
    }

    fn set_entry() -> CatalogEntry {
        CatalogEntry {
            entry_id: 10,
            brand: "KATO".to_string(),
            catalog_code: Some("10-1603".to_string()),
            name: "E233系 6両セット".to_string(),
            kind: ProductKind::Set,
            parent_set_code: None,
        }
    }

    fn component(id: i64, code: &str) -> CatalogEntry {
        CatalogEntry {
            entry_id: id,
            brand: "KATO".to_string(),
            catalog_code: Some(code.to_string()),
            name: format!("子件 {}", code),
            kind: ProductKind::SetComponent,
            parent_set_code: Some("10-1603".to_string()),
        }
    }

    fn job() -> ExpansionJob {
        ExpansionJob {
            set_entry: set_entry(),
            parent_row_number: 3,
            parent_external_ref: "A-001".to_string(),
            status: VehicleStatus::Broken,
            storage_case: StorageCase::WithCase,
            purchase_date: NaiveDate::from_ymd_opt(2023, 5, 1),
        }
    }

    #[tokio::test]
    async fn test_expand_creates_one_record_per_component() {
        let repo = Arc::new(RecordingRepo::default());
        let index = ReferenceIndex::build(vec![
            set_entry(),
            component(11, "10-1603-1"),
            component(12, "10-1603-2"),
        ]);
        let engine = SetExpansionEngine::new(Arc::clone(&repo), SetExpansionDedup::AllowDuplicates);

        let count = engine.expand("u1", &index, &job()).await.unwrap();
        assert_eq!(count, 2);

        let inserted = repo.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 2);
        for vehicle in inserted.iter() {
            // 属性自父行复制;子件不自编号、不计价
            assert_eq!(vehicle.user_id, "u1");
            assert_eq!(vehicle.status, VehicleStatus::Broken);
            assert_eq!(vehicle.storage_case, StorageCase::WithCase);
            assert_eq!(vehicle.purchase_date, NaiveDate::from_ymd_opt(2023, 5, 1));
            assert_eq!(vehicle.purchase_price, None);
            assert_eq!(vehicle.external_ref, "");
            assert_eq!(vehicle.source_set_code.as_deref(), Some("10-1603"));
            assert!(vehicle.is_well_formed());
            let notes = vehicle.notes.as_deref().unwrap();
            assert!(notes.contains("10-1603"));
            assert!(notes.contains("A-001"));
        }
    }

    #[tokio::test]
    async fn test_expand_without_components_is_noop() {
        let repo = Arc::new(RecordingRepo::default());
        let index = ReferenceIndex::build(vec![set_entry()]);
        let engine = SetExpansionEngine::new(Arc::clone(&repo), SetExpansionDedup::AllowDuplicates);

        let count = engine.expand("u1", &index, &job()).await.unwrap();
        assert_eq!(count, 0);
        assert!(repo.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expand_skip_existing_policy() {
        let repo = Arc::new(RecordingRepo::default());
        repo.pre_expanded.lock().unwrap().push(11); // 11 号子件已存在
        let index = ReferenceIndex::build(vec![
            set_entry(),
            component(11, "10-1603-1"),
            component(12, "10-1603-2"),
        ]);
        let engine = SetExpansionEngine::new(Arc::clone(&repo), SetExpansionDedup::SkipExisting);

        let count = engine.expand("u1", &index, &job()).await.unwrap();
        assert_eq!(count, 1);

        let inserted = repo.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].catalog_entry_id, Some(12));
    }

    #[tokio::test]
    async fn test_expand_anonymous_parent_uses_row_number() {
        let repo = Arc::new(RecordingRepo::default());
        let index = ReferenceIndex::build(vec![set_entry(), component(11, "10-1603-1")]);
        let engine = SetExpansionEngine::new(Arc::clone(&repo), SetExpansionDedup::AllowDuplicates);

        let mut anonymous = job();
        anonymous.parent_external_ref = String::new();
        engine.expand("u1", &index, &anonymous).await.unwrap();

        let inserted = repo.inserted.lock().unwrap();
        assert!(inserted[0].notes.as_deref().unwrap().contains("行 3"));
    }
}
