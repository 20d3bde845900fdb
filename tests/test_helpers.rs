// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、目录播种等功能
// ==========================================

#![allow(dead_code)]

use rusqlite::params;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = rail_collection::db::open_sqlite_connection(&db_path)?;
    rail_collection::db::initialize_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 播种一条目录条目,返回 entry_id
pub fn seed_catalog_entry(
    db_path: &str,
    brand: &str,
    catalog_code: Option<&str>,
    name: &str,
    kind: &str,
    parent_set_code: Option<&str>,
) -> Result<i64, Box<dyn Error>> {
    let conn = rail_collection::db::open_sqlite_connection(db_path)?;
    conn.execute(
        r#"
        INSERT INTO catalog_entry (brand, catalog_code, name, kind, parent_set_code)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![brand, catalog_code, name, kind, parent_set_code],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 播种单品目录条目
pub fn seed_single(db_path: &str, brand: &str, code: &str, name: &str) -> i64 {
    seed_catalog_entry(db_path, brand, Some(code), name, "SINGLE", None).expect("播种单品失败")
}

/// 播种套装目录条目
pub fn seed_set(db_path: &str, brand: &str, code: &str, name: &str) -> i64 {
    seed_catalog_entry(db_path, brand, Some(code), name, "SET", None).expect("播种套装失败")
}

/// 播种套装子件目录条目
pub fn seed_component(db_path: &str, brand: &str, code: &str, name: &str, parent_code: &str) -> i64 {
    seed_catalog_entry(db_path, brand, Some(code), name, "SET_COMPONENT", Some(parent_code))
        .expect("播种子件失败")
}

/// 写入 global scope 配置值
pub fn set_config(db_path: &str, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let conn = rail_collection::db::open_sqlite_connection(db_path)?;
    conn.execute(
        r#"
        INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at)
        VALUES ('global', ?1, ?2, datetime('now'))
        "#,
        params![key, value],
    )?;
    Ok(())
}

/// 标准导入文本: 行号列行 + 表头 + 数据行
pub fn import_text(data_lines: &[&str]) -> String {
    let mut text = String::from("1,2,3,4,5,6,7,8,9\n");
    text.push_str("管理编号,厂商,品番,商品名,状态,保管,购入日,价格,备注\n");
    for line in data_lines {
        text.push_str(line);
        text.push('\n');
    }
    text
}
