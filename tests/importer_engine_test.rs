// ==========================================
// 铁道模型藏品管理系统 - VehicleImporter 集成测试
// ==========================================
// 覆盖: 目录链接 / 套装展开 / 独立回落 / 重复拒绝 / 结构错误
// ==========================================

mod test_helpers;

use rail_collection::config::ConfigManager;
use rail_collection::domain::types::{StorageCase, VehicleStatus};
use rail_collection::importer::{ImportError, VehicleImporter};
use rail_collection::repository::{
    CatalogRepositoryImpl, VehicleRepository, VehicleRepositoryImpl,
};
use std::sync::Arc;

// ==========================================
// 辅助函数: 搭建导入器
// ==========================================
fn build_importer(
    db_path: &str,
) -> VehicleImporter<CatalogRepositoryImpl, VehicleRepositoryImpl, ConfigManager> {
    let catalog_repo = CatalogRepositoryImpl::new(db_path).expect("创建目录仓储失败");
    let vehicle_repo = VehicleRepositoryImpl::new(db_path).expect("创建藏品仓储失败");
    let config = ConfigManager::new(db_path).expect("创建配置管理器失败");
    VehicleImporter::new(Arc::new(catalog_repo), Arc::new(vehicle_repo), Arc::new(config))
}

fn vehicle_repo(db_path: &str) -> VehicleRepositoryImpl {
    VehicleRepositoryImpl::new(db_path).expect("创建藏品仓储失败")
}

// ==========================================
// 场景: 厂商+品番 命中单品条目 → Linked
// ==========================================
#[tokio::test]
async fn test_import_links_single_item_by_brand_and_code() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    let entry_id = test_helpers::seed_single(&db_path, "KATO", "10-1603", "E233系 中央線");

    let text = test_helpers::import_text(&[
        "A-001,KATO,10-1603,,NORMAL,WITH_CASE,2023-05-01,12800,初回購入",
    ]);
    let report = build_importer(&db_path)
        .import_text(&text, "u1")
        .await
        .unwrap();

    assert_eq!(report.total_rows, 1);
    assert_eq!(report.success_rows, 1);
    assert_eq!(report.linked_rows, 1);
    assert_eq!(report.independent_rows, 0);
    assert_eq!(report.error_rows, 0);
    assert_eq!(report.expanded_records, 0);

    let vehicles = vehicle_repo(&db_path).list_vehicles_by_user("u1").await.unwrap();
    assert_eq!(vehicles.len(), 1);
    let vehicle = &vehicles[0];
    assert_eq!(vehicle.catalog_entry_id, Some(entry_id));
    assert!(vehicle.adhoc.is_none());
    assert_eq!(vehicle.external_ref, "A-001");
    assert_eq!(vehicle.purchase_price, Some(12800));
}

// ==========================================
// 场景: 命中套装条目 → 1 父记录 + N 子件记录
// ==========================================
#[tokio::test]
async fn test_import_set_expands_components_with_copied_attributes() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    let set_id = test_helpers::seed_set(&db_path, "KATO", "10-1603", "E233系 6両セット");
    let comp_a = test_helpers::seed_component(&db_path, "KATO", "10-1603-1", "クハE233", "10-1603");
    let comp_b = test_helpers::seed_component(&db_path, "KATO", "10-1603-2", "モハE233", "10-1603");

    let text = test_helpers::import_text(&[
        "A-001,KATO,10-1603,,BROKEN,WITH_CASE,2023-05-01,19800,",
    ]);
    let report = build_importer(&db_path)
        .import_text(&text, "u1")
        .await
        .unwrap();

    // 1 行成功链接 + 2 条展开子件
    assert_eq!(report.success_rows, 1);
    assert_eq!(report.linked_rows, 1);
    assert_eq!(report.expanded_records, 2);
    assert_eq!(report.error_rows, 0);

    let vehicles = vehicle_repo(&db_path).list_vehicles_by_user("u1").await.unwrap();
    assert_eq!(vehicles.len(), 3);

    let parent = vehicles
        .iter()
        .find(|v| v.catalog_entry_id == Some(set_id))
        .expect("父记录缺失");
    assert_eq!(parent.external_ref, "A-001");
    assert_eq!(parent.purchase_price, Some(19800));
    assert!(parent.source_set_code.is_none());

    for comp_id in [comp_a, comp_b] {
        let component = vehicles
            .iter()
            .find(|v| v.catalog_entry_id == Some(comp_id))
            .expect("子件记录缺失");
        // 状态/保管/购入日自父行复制;价格不单独计价;不自编号
        assert_eq!(component.status, VehicleStatus::Broken);
        assert_eq!(component.storage_case, StorageCase::WithCase);
        assert_eq!(component.purchase_date, parent.purchase_date);
        assert_eq!(component.purchase_price, None);
        assert_eq!(component.external_ref, "");
        assert_eq!(component.source_set_code.as_deref(), Some("10-1603"));
        assert!(component.notes.as_deref().unwrap().contains("10-1603"));
        assert!(component.notes.as_deref().unwrap().contains("A-001"));
    }
}

// ==========================================
// 场景: 无 厂商+品番 → 无条件独立,绝不丢行
// ==========================================
#[tokio::test]
async fn test_import_row_without_brand_code_is_independent() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    test_helpers::seed_single(&db_path, "KATO", "10-1603", "E233系");

    let text = test_helpers::import_text(&[",,,Unknown Loco,NORMAL,NO_CASE,,,"]);
    let report = build_importer(&db_path)
        .import_text(&text, "u1")
        .await
        .unwrap();

    assert_eq!(report.success_rows, 1);
    assert_eq!(report.independent_rows, 1);
    assert_eq!(report.linked_rows, 0);
    assert_eq!(report.error_rows, 0);

    let vehicles = vehicle_repo(&db_path).list_vehicles_by_user("u1").await.unwrap();
    assert_eq!(vehicles.len(), 1);
    let descriptor = vehicles[0].adhoc.as_ref().expect("自述信息缺失");
    assert_eq!(descriptor.name, "Unknown Loco");
    assert!(vehicles[0].catalog_entry_id.is_none());
}

// ==========================================
// 场景: 厂商+品番 未命中 → 独立 + "目录未找到"注记
// ==========================================
#[tokio::test]
async fn test_import_catalog_miss_falls_back_with_note() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    test_helpers::seed_single(&db_path, "KATO", "10-1603", "E233系");

    let text = test_helpers::import_text(&["B-001,TOMIX,98430,,NORMAL,UNKNOWN,,,"]);
    let report = build_importer(&db_path)
        .import_text(&text, "u1")
        .await
        .unwrap();

    // 归并未命中不是错误
    assert_eq!(report.independent_rows, 1);
    assert_eq!(report.error_rows, 0);

    let vehicles = vehicle_repo(&db_path).list_vehicles_by_user("u1").await.unwrap();
    let descriptor = vehicles[0].adhoc.as_ref().unwrap();
    assert_eq!(descriptor.name, "TOMIX 98430");
    assert_eq!(descriptor.brand.as_deref(), Some("TOMIX"));
    assert_eq!(descriptor.catalog_code.as_deref(), Some("98430"));
    assert!(descriptor.description.as_deref().unwrap().contains("目录中未找到"));
}

// ==========================================
// 场景: 管理编号已在库 → 重复拒绝,其余行正常
// ==========================================
#[tokio::test]
async fn test_import_rejects_preexisting_external_ref() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    test_helpers::seed_single(&db_path, "KATO", "10-1603", "E233系");

    // 第一次导入占用 A-001
    let importer = build_importer(&db_path);
    let first = test_helpers::import_text(&["A-001,KATO,10-1603,,NORMAL,WITH_CASE,,,"]);
    importer.import_text(&first, "u1").await.unwrap();

    // 第二次导入: A-001 重复,A-002 正常
    let second = test_helpers::import_text(&[
        "A-001,KATO,10-1603,,NORMAL,WITH_CASE,,,",
        "A-002,KATO,10-1603,,NORMAL,WITH_CASE,,,",
    ]);
    let report = importer.import_text(&second, "u1").await.unwrap();

    assert_eq!(report.total_rows, 2);
    assert_eq!(report.duplicate_rows, 1);
    assert_eq!(report.success_rows, 1);
    assert_eq!(report.error_rows, 0);
    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(report.duplicates[0].row_number, 3);
    assert!(report.duplicates[0].message.contains("A-001"));

    // 重复行不创建记录: 首轮 1 条 + 次轮 1 条
    let count = vehicle_repo(&db_path).count_vehicles("u1").await.unwrap();
    assert_eq!(count, 2);
}

// ==========================================
// 场景: 同批内重复管理编号 → 后行被交叉检查拒绝
// ==========================================
#[tokio::test]
async fn test_import_cross_checks_duplicates_within_run() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    test_helpers::seed_single(&db_path, "KATO", "10-1603", "E233系");

    let text = test_helpers::import_text(&[
        "A-001,KATO,10-1603,,NORMAL,WITH_CASE,,,",
        "A-001,KATO,10-1603,,NORMAL,WITH_CASE,,,",
    ]);
    let report = build_importer(&db_path)
        .import_text(&text, "u1")
        .await
        .unwrap();

    assert_eq!(report.success_rows, 1);
    assert_eq!(report.duplicate_rows, 1);
    assert_eq!(report.error_rows, 0);
    assert_eq!(report.duplicates[0].row_number, 4);

    let count = vehicle_repo(&db_path).count_vehicles("u1").await.unwrap();
    assert_eq!(count, 1);
}

// ==========================================
// 场景: 结构错误行跳过,其余行继续
// ==========================================
#[tokio::test]
async fn test_import_structural_error_does_not_abort_run() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    test_helpers::seed_single(&db_path, "KATO", "10-1603", "E233系");

    let text = test_helpers::import_text(&[
        "A-001,KATO,10-1603", // 列数不足
        "A-002,KATO,10-1603,,NORMAL,WITH_CASE,,,",
    ]);
    let report = build_importer(&db_path)
        .import_text(&text, "u1")
        .await
        .unwrap();

    assert_eq!(report.total_rows, 2);
    assert_eq!(report.success_rows, 1);
    assert_eq!(report.error_rows, 1);
    assert_eq!(report.errors[0].row_number, 3);
    assert!(report.errors[0].message.contains("列数不足"));
}

// ==========================================
// 场景: 整体输入非法 → 唯一短路整次运行的情形
// ==========================================
#[tokio::test]
async fn test_import_malformed_input_short_circuits() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    let importer = build_importer(&db_path);

    let empty = importer.import_text("", "u1").await;
    assert!(matches!(empty, Err(ImportError::EmptyInput)));

    let no_header = importer.import_text("1,2,3,4,5,6,7,8,9\n", "u1").await;
    assert!(matches!(no_header, Err(ImportError::MissingHeader { .. })));

    // 短路发生在任何行处理之前
    let count = vehicle_repo(&db_path).count_vehicles("u1").await.unwrap();
    assert_eq!(count, 0);
}

// ==========================================
// 场景: 套装展开去重策略 SKIP_EXISTING
// ==========================================
#[tokio::test]
async fn test_import_set_expansion_skip_existing_policy() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    test_helpers::seed_set(&db_path, "KATO", "10-1603", "E233系 セット");
    test_helpers::seed_component(&db_path, "KATO", "10-1603-1", "クハE233", "10-1603");
    test_helpers::seed_component(&db_path, "KATO", "10-1603-2", "モハE233", "10-1603");
    test_helpers::set_config(&db_path, "set_expansion_dedup", "SKIP_EXISTING").unwrap();

    let importer = build_importer(&db_path);

    let first = test_helpers::import_text(&["A-001,KATO,10-1603,,NORMAL,WITH_CASE,,,"]);
    let first_report = importer.import_text(&first, "u1").await.unwrap();
    assert_eq!(first_report.expanded_records, 2);

    // 再次导入同一套装: 子件已存在,不再重复生成
    let second = test_helpers::import_text(&["A-002,KATO,10-1603,,NORMAL,WITH_CASE,,,"]);
    let second_report = importer.import_text(&second, "u1").await.unwrap();
    assert_eq!(second_report.linked_rows, 1);
    assert_eq!(second_report.expanded_records, 0);

    // 2 父记录 + 2 子件
    let count = vehicle_repo(&db_path).count_vehicles("u1").await.unwrap();
    assert_eq!(count, 4);
}

// ==========================================
// 场景: 默认策略 ALLOW_DUPLICATES 重复展开
// ==========================================
#[tokio::test]
async fn test_import_set_expansion_allows_duplicates_by_default() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    test_helpers::seed_set(&db_path, "KATO", "10-1603", "E233系 セット");
    test_helpers::seed_component(&db_path, "KATO", "10-1603-1", "クハE233", "10-1603");

    let importer = build_importer(&db_path);
    let first = test_helpers::import_text(&["A-001,KATO,10-1603,,NORMAL,WITH_CASE,,,"]);
    importer.import_text(&first, "u1").await.unwrap();
    let second = test_helpers::import_text(&["A-002,KATO,10-1603,,NORMAL,WITH_CASE,,,"]);
    let report = importer.import_text(&second, "u1").await.unwrap();

    assert_eq!(report.expanded_records, 1);
    // 2 父记录 + 2 子件（历史行为: 每次导入都展开）
    let count = vehicle_repo(&db_path).count_vehicles("u1").await.unwrap();
    assert_eq!(count, 4);
}

// ==========================================
// 场景: 分块大小配置生效（多分块提交）
// ==========================================
#[tokio::test]
async fn test_import_with_small_chunk_size_processes_all_rows() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    test_helpers::seed_single(&db_path, "KATO", "10-1603", "E233系");
    test_helpers::set_config(&db_path, "import_chunk_size", "2").unwrap();

    let rows: Vec<String> = (1..=5)
        .map(|i| format!("C-{:03},KATO,10-1603,,NORMAL,WITH_CASE,,,", i))
        .collect();
    let row_refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
    let text = test_helpers::import_text(&row_refs);

    let report = build_importer(&db_path)
        .import_text(&text, "u1")
        .await
        .unwrap();

    // 3 个分块（2+2+1）全部按输入顺序提交
    assert_eq!(report.success_rows, 5);
    assert_eq!(report.linked_rows, 5);
    assert_eq!(report.error_rows, 0);

    let vehicles = vehicle_repo(&db_path).list_vehicles_by_user("u1").await.unwrap();
    assert_eq!(vehicles.len(), 5);
}
