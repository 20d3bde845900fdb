// ==========================================
// 铁道模型藏品管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供建库入口（CREATE TABLE IF NOT EXISTS,幂等）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// # 表
/// - catalog_entry: 目录条目（参考产品,全用户共享）
/// - owned_vehicle: 藏品车辆记录（独立自述信息作为影子列）
/// - import_batch: 导入批次元信息
/// - config_kv: 键值配置（scope_id 预留多作用域）
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS catalog_entry (
            entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
            brand TEXT NOT NULL,
            catalog_code TEXT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            parent_set_code TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_catalog_brand_code
            ON catalog_entry(brand, catalog_code);
        CREATE INDEX IF NOT EXISTS idx_catalog_parent_set
            ON catalog_entry(parent_set_code);

        CREATE TABLE IF NOT EXISTS owned_vehicle (
            vehicle_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            catalog_entry_id INTEGER REFERENCES catalog_entry(entry_id),
            external_ref TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL,
            storage_case TEXT NOT NULL,
            purchase_date TEXT,
            purchase_price INTEGER,
            notes TEXT,
            adhoc_brand TEXT,
            adhoc_code TEXT,
            adhoc_name TEXT,
            adhoc_kind TEXT,
            adhoc_description TEXT,
            source_set_code TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- 管理编号非空时同一用户内唯一
        CREATE UNIQUE INDEX IF NOT EXISTS idx_vehicle_user_ref
            ON owned_vehicle(user_id, external_ref)
            WHERE external_ref <> '';
        CREATE INDEX IF NOT EXISTS idx_vehicle_user
            ON owned_vehicle(user_id);
        CREATE INDEX IF NOT EXISTS idx_vehicle_source_set
            ON owned_vehicle(user_id, source_set_code);

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            total_rows INTEGER NOT NULL DEFAULT 0,
            linked_rows INTEGER NOT NULL DEFAULT 0,
            independent_rows INTEGER NOT NULL DEFAULT 0,
            duplicate_rows INTEGER NOT NULL DEFAULT 0,
            error_rows INTEGER NOT NULL DEFAULT 0,
            expanded_records INTEGER NOT NULL DEFAULT 0,
            imported_at TEXT,
            elapsed_ms INTEGER,
            report_json TEXT
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;

    Ok(())
}
