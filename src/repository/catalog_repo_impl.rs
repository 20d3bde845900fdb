// ==========================================
// 铁道模型藏品管理系统 - 目录 Repository 实现
// ==========================================
// 职责: 实现目录数据访问（使用 rusqlite）
// 红线: 未知类型字符串在此边界拒绝（跳过+告警）,不流入归并逻辑
// ==========================================

use crate::domain::catalog::{CatalogEntry, NewCatalogEntry};
use crate::domain::types::ProductKind;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// CatalogRepositoryImpl
// ==========================================
pub struct CatalogRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepositoryImpl {
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
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    /// 批量读取全部目录条目
    async fn list_entries(&self) -> RepositoryResult<Vec<CatalogEntry>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT entry_id, brand, catalog_code, name, kind, parent_set_code
            FROM catalog_entry
            ORDER BY entry_id
            "#,
        )?;

        let raw_rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // 类型字符串在此处归一;非法值跳过并告警（不中断整次读取）
        let mut entries = Vec::with_capacity(raw_rows.len());
        for (entry_id, brand, catalog_code, name, kind_raw, parent_set_code) in raw_rows {
            match ProductKind::from_db_code(&kind_raw) {
                Some(kind) => entries.push(CatalogEntry {
                    entry_id,
                    brand,
                    catalog_code,
                    name,
                    kind,
                    parent_set_code,
                }),
                None => {
                    warn!(
                        entry_id = entry_id,
                        kind = %kind_raw,
                        "目录条目类型字符串非法,已跳过"
                    );
                }
            }
        }

        Ok(entries)
    }

    /// 插入一条目录条目
    async fn insert_entry(&self, entry: NewCatalogEntry) -> RepositoryResult<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO catalog_entry (brand, catalog_code, name, kind, parent_set_code)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entry.brand,
                entry.catalog_code,
                entry.name,
                entry.kind.as_db_code(),
                entry.parent_set_code,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 统计 catalog_entry 表记录数
    async fn count_entries(&self) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM catalog_entry", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}
