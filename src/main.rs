// ==========================================
// 铁道模型藏品管理系统 - 命令行入口
// ==========================================
// 用途: 从命令行驱动一次藏品导入（宿主层缺位时的最小驱动器）
// 用法: rail-collection <db_path> <file_path> <user_id>
// ==========================================

use rail_collection::api::ImportApi;
use rail_collection::{db, logging};

#[tokio::main]
async fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 藏品批量导入", rail_collection::APP_NAME);
    tracing::info!("系统版本: {}", rail_collection::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("用法: {} <db_path> <file_path> <user_id>", args[0]);
        std::process::exit(2);
    }
    let db_path = &args[1];
    let file_path = &args[2];
    let user_id = &args[3];

    // 建库（幂等）
    let conn = match db::open_sqlite_connection(db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "数据库打开失败");
            std::process::exit(1);
        }
    };
    if let Err(e) = db::initialize_schema(&conn) {
        tracing::error!(error = %e, "数据库初始化失败");
        std::process::exit(1);
    }
    drop(conn);

    // 执行导入
    let api = ImportApi::new(db_path.clone());
    match api.import_collection_file(file_path, user_id).await {
        Ok(response) => {
            tracing::info!(
                batch_id = %response.batch_id,
                total = response.total_rows,
                imported = response.imported,
                linked = response.linked,
                independent = response.independent,
                duplicates = response.duplicates,
                errors = response.errors,
                expanded = response.expanded,
                elapsed_ms = response.elapsed_ms,
                "导入完成"
            );
            for error in &response.error_details {
                tracing::warn!(row = error.row_number, "{}", error.message);
            }
            for duplicate in &response.duplicate_details {
                tracing::warn!(row = duplicate.row_number, "{}", duplicate.message);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "导入失败");
            std::process::exit(1);
        }
    }
}
