// ==========================================
// 铁道模型藏品管理系统 - 藏品车辆 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::collection::{AdHocDescriptor, ImportBatch, OwnedVehicle};
use crate::domain::types::{ProductKind, StorageCase, VehicleStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::vehicle_repo::VehicleRepository;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// VehicleRepositoryImpl
// ==========================================
pub struct VehicleRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl VehicleRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（测试/组合场景复用连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在事务中批量插入藏品车辆记录
    fn insert_vehicles_in_tx(
        tx: &Transaction,
        vehicles: &[OwnedVehicle],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO owned_vehicle (
                vehicle_id, user_id, catalog_entry_id, external_ref,
                status, storage_case, purchase_date, purchase_price, notes,
                adhoc_brand, adhoc_code, adhoc_name, adhoc_kind, adhoc_description,
                source_set_code, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17
            )
            "#,
        )?;

        let mut count = 0;
        for vehicle in vehicles {
            // 不变量: 目录链接与独立自述有且仅有其一
            if !vehicle.is_well_formed() {
                return Err(RepositoryError::ValidationError(format!(
                    "记录 {} 目录链接与独立自述状态非法",
                    vehicle.vehicle_id
                )));
            }

            let adhoc = vehicle.adhoc.as_ref();
            stmt.execute(params![
                vehicle.vehicle_id,
                vehicle.user_id,
                vehicle.catalog_entry_id,
                vehicle.external_ref,
                vehicle.status.as_db_code(),
                vehicle.storage_case.as_db_code(),
                vehicle.purchase_date.map(|d| d.to_string()),
                vehicle.purchase_price,
                vehicle.notes,
                adhoc.and_then(|a| a.brand.clone()),
                adhoc.and_then(|a| a.catalog_code.clone()),
                adhoc.map(|a| a.name.clone()),
                adhoc.map(|a| a.kind.as_db_code()),
                adhoc.and_then(|a| a.description.clone()),
                vehicle.source_set_code,
                vehicle.created_at.to_rfc3339(),
                vehicle.updated_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 行 → OwnedVehicle 转换（枚举编码在此边界校验）
    #[allow(clippy::type_complexity)]
    fn row_to_vehicle(
        raw: (
            String,
            String,
            Option<i64>,
            String,
            String,
            String,
            Option<String>,
            Option<i64>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            String,
            String,
        ),
    ) -> RepositoryResult<OwnedVehicle> {
        let (
            vehicle_id,
            user_id,
            catalog_entry_id,
            external_ref,
            status_raw,
            storage_raw,
            purchase_date_raw,
            purchase_price,
            notes,
            adhoc_brand,
            adhoc_code,
            adhoc_name,
            adhoc_kind_raw,
            adhoc_description,
            source_set_code,
            created_at_raw,
            updated_at_raw,
        ) = raw;

        let status = VehicleStatus::from_db_code(&status_raw).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: format!("非法状态编码: {}", status_raw),
            }
        })?;
        let storage_case = StorageCase::from_db_code(&storage_raw).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "storage_case".to_string(),
                message: format!("非法保管状态编码: {}", storage_raw),
            }
        })?;

        let adhoc = match adhoc_name {
            Some(name) => {
                let kind = adhoc_kind_raw
                    .as_deref()
                    .and_then(ProductKind::from_db_code)
                    .unwrap_or(ProductKind::Single);
                Some(AdHocDescriptor {
                    brand: adhoc_brand,
                    catalog_code: adhoc_code,
                    name,
                    kind,
                    description: adhoc_description,
                })
            }
            None => None,
        };

        Ok(OwnedVehicle {
            vehicle_id,
            user_id,
            catalog_entry_id,
            external_ref,
            adhoc,
            status,
            storage_case,
            purchase_date: purchase_date_raw.and_then(|s| s.parse::<NaiveDate>().ok()),
            purchase_price,
            notes,
            source_set_code,
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at_raw)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at_raw)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }
}

const VEHICLE_COLUMNS: &str = r#"
    vehicle_id, user_id, catalog_entry_id, external_ref,
    status, storage_case, purchase_date, purchase_price, notes,
    adhoc_brand, adhoc_code, adhoc_name, adhoc_kind, adhoc_description,
    source_set_code, created_at, updated_at
"#;

#[async_trait]
impl VehicleRepository for VehicleRepositoryImpl {
    /// 在单个事务内批量创建藏品车辆记录（全有或全无）
    async fn insert_vehicles_tx(&self, vehicles: Vec<OwnedVehicle>) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let count = Self::insert_vehicles_in_tx(&tx, &vehicles)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 批量过滤已存在的管理编号
    async fn filter_existing_refs(
        &self,
        user_id: &str,
        refs: &[String],
    ) -> RepositoryResult<Vec<String>> {
        if refs.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        // 构建 IN 子句的占位符（?2 起,?1 为 user_id）
        let placeholders = refs
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(",");

        let query = format!(
            "SELECT DISTINCT external_ref FROM owned_vehicle \
             WHERE user_id = ?1 AND external_ref <> '' AND external_ref IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&query)?;

        // 绑定参数
        let mut sql_params: Vec<&dyn rusqlite::ToSql> = vec![&user_id];
        for r in refs {
            sql_params.push(r as &dyn rusqlite::ToSql);
        }

        let existing = stmt
            .query_map(sql_params.as_slice(), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(existing)
    }

    /// 查询某套装来源已展开生成的子件目录条目ID
    async fn list_expanded_component_ids(
        &self,
        user_id: &str,
        set_code: &str,
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT catalog_entry_id FROM owned_vehicle
            WHERE user_id = ?1 AND source_set_code = ?2 AND catalog_entry_id IS NOT NULL
            "#,
        )?;

        let ids = stmt
            .query_map(params![user_id, set_code], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    /// 查询指定用户的全部藏品车辆
    async fn list_vehicles_by_user(&self, user_id: &str) -> RepositoryResult<Vec<OwnedVehicle>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let query = format!(
            "SELECT {} FROM owned_vehicle WHERE user_id = ?1 ORDER BY created_at, vehicle_id",
            VEHICLE_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;

        let raw_rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<i64>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<String>>(9)?,
                    row.get::<_, Option<String>>(10)?,
                    row.get::<_, Option<String>>(11)?,
                    row.get::<_, Option<String>>(12)?,
                    row.get::<_, Option<String>>(13)?,
                    row.get::<_, Option<String>>(14)?,
                    row.get::<_, String>(15)?,
                    row.get::<_, String>(16)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows.into_iter().map(Self::row_to_vehicle).collect()
    }

    /// 统计指定用户的藏品车辆数
    async fn count_vehicles(&self, user_id: &str) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM owned_vehicle WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    /// 插入导入批次记录
    async fn insert_batch(&self, batch: ImportBatch) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, user_id, total_rows, linked_rows, independent_rows,
                duplicate_rows, error_rows, expanded_records,
                imported_at, elapsed_ms, report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.user_id,
                batch.total_rows,
                batch.linked_rows,
                batch.independent_rows,
                batch.duplicate_rows,
                batch.error_rows,
                batch.expanded_records,
                batch.imported_at.map(|dt| dt.to_rfc3339()),
                batch.elapsed_ms,
                batch.report_json,
            ],
        )?;

        Ok(())
    }

    /// 查询最近的导入批次
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, user_id, total_rows, linked_rows, independent_rows,
                   duplicate_rows, error_rows, expanded_records,
                   imported_at, elapsed_ms, report_json
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;

        let batches = stmt
            .query_map(params![limit], |row| {
                Ok(ImportBatch {
                    batch_id: row.get(0)?,
                    user_id: row.get(1)?,
                    total_rows: row.get(2)?,
                    linked_rows: row.get(3)?,
                    independent_rows: row.get(4)?,
                    duplicate_rows: row.get(5)?,
                    error_rows: row.get(6)?,
                    expanded_records: row.get(7)?,
                    imported_at: row
                        .get::<_, Option<String>>(8)?
                        .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
                        .map(|dt| dt.with_timezone(&chrono::Utc)),
                    elapsed_ms: row.get(9)?,
                    report_json: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }
}
