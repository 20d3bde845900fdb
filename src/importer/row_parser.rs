// ==========================================
// 铁道模型藏品管理系统 - 行解析器
// ==========================================
// 依据: Import_Engine_Spec_v0.2.md - 4.1 行解析
// 依据: Field_Mapping_Spec_v0.2.md - 列序与口径
// ==========================================
// 职责: 原始文本 → CandidateRow 序列 + 结构错误列表
// 口径: 位置列,不按表头名解释;RFC4180 双引号转义
// ==========================================

use crate::domain::collection::{CandidateRow, RowError};
use crate::domain::types::{StorageCase, VehicleStatus};
use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;

// ==========================================
// 列布局（依据 Field_Mapping_Spec_v0.2）
// ==========================================
// 0: 管理编号  1: 厂商  2: 品番  3: 商品名
// 4: 车辆状态  5: 保管状态  6: 购入日  7: 购入价格  8: 备注
const COL_EXTERNAL_REF: usize = 0;
const COL_BRAND: usize = 1;
const COL_CATALOG_CODE: usize = 2;
const COL_NAME: usize = 3;
const COL_STATUS: usize = 4;
const COL_STORAGE_CASE: usize = 5;
const COL_PURCHASE_DATE: usize = 6;
const COL_PURCHASE_PRICE: usize = 7;
const COL_NOTES: usize = 8;

/// 最小列数 = 解析器实际读取的最高列下标 + 1
pub const MIN_COLUMNS: usize = COL_NOTES + 1;

// ==========================================
// ParsedSheet - 解析产物
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSheet {
    pub rows: Vec<CandidateRow>,  // 有效数据行（输入顺序）
    pub issues: Vec<RowError>,    // 结构错误（行号1起算,不中断解析）
}

// ==========================================
// RowParser - 行解析器
// ==========================================
/// 行解析器
///
/// # 职责
/// 1. 解析原始定界文本（引号字段、转义引号、字段内换行）
/// 2. 丢弃第 1 物理行（行号列行）,第 2 物理行仅做最小列数校验
/// 3. 空行静默跳过;列数不足的行记结构错误后跳过
/// 4. 自由文本字段内的 <br> 标记归一为换行符
///
/// # 红线
/// - 表头文本不做语义解释（位置列口径）
/// - 结构错误不短路整次解析;仅空内容/缺表头才是致命错误
/// - 同一输入重复解析结果逐字节一致（确定性）
pub struct RowParser;

impl RowParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析原始文本
    ///
    /// # 参数
    /// - raw_text: 完整导入文本（第1行行号列,第2行表头,第3行起数据）
    ///
    /// # 返回
    /// - Ok(ParsedSheet): 数据行 + 结构错误列表
    /// - Err(ImportError): 整体输入非法（空内容/缺表头）
    pub fn parse_text(&self, raw_text: &str) -> ImportResult<ParsedSheet> {
        if raw_text.trim().is_empty() {
            return Err(ImportError::EmptyInput);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致,短行在下游统一报告
            .from_reader(raw_text.as_bytes());

        let mut records: Vec<(usize, Vec<String>)> = Vec::new();
        let mut issues: Vec<RowError> = Vec::new();

        for result in reader.records() {
            match result {
                Ok(record) => {
                    // position() 给出记录起始物理行号（1起算;引号内换行占多行）
                    let line = record
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(0);
                    records.push((line, record.iter().map(|s| s.to_string()).collect()));
                }
                Err(e) => {
                    // 引号格式非法等记录级错误: 记错误行号,继续解析后续记录
                    let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                    issues.push(RowError {
                        row_number: line,
                        message: format!("行格式非法: {}", e),
                    });
                }
            }
        }

        self.parse_records(records, issues)
    }

    /// 解析位置化记录流（CSV 与 Excel 路径共用）
    ///
    /// # 参数
    /// - records: (物理行号, 字段列表) 序列,含前两行
    /// - issues: 上游已累积的结构错误
    pub fn parse_records(
        &self,
        records: Vec<(usize, Vec<String>)>,
        mut issues: Vec<RowError>,
    ) -> ImportResult<ParsedSheet> {
        if records.is_empty() {
            return Err(ImportError::EmptyInput);
        }
        // 第 1 行: 行号列行,丢弃。第 2 行: 表头,仅校验最小列数
        if records.len() < 2 {
            return Err(ImportError::MissingHeader {
                expected: MIN_COLUMNS,
            });
        }
        let header = &records[1].1;
        if header.len() < MIN_COLUMNS {
            return Err(ImportError::MissingHeader {
                expected: MIN_COLUMNS,
            });
        }

        let mut rows = Vec::new();
        for (line, fields) in records.into_iter().skip(2) {
            // 跳过完全空白的行（不计为数据行）
            if fields.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            if fields.len() < MIN_COLUMNS {
                issues.push(RowError {
                    row_number: line,
                    message: format!(
                        "列数不足: 期望至少 {} 列,实际 {} 列",
                        MIN_COLUMNS,
                        fields.len()
                    ),
                });
                continue;
            }

            rows.push(Self::map_record(&fields, line));
        }

        // 行号序输出,保证重复解析结果一致
        issues.sort_by_key(|i| i.row_number);

        Ok(ParsedSheet { rows, issues })
    }

    /// 字段映射: 位置字段 → CandidateRow
    fn map_record(fields: &[String], row_number: usize) -> CandidateRow {
        CandidateRow {
            external_ref: Self::get_string_field(fields, COL_EXTERNAL_REF),
            brand: Self::get_string_field(fields, COL_BRAND),
            catalog_code: Self::get_string_field(fields, COL_CATALOG_CODE),
            name: Self::get_text_field(fields, COL_NAME),
            status: fields
                .get(COL_STATUS)
                .map(|s| VehicleStatus::parse_lenient(s))
                .unwrap_or_default(),
            storage_case: fields
                .get(COL_STORAGE_CASE)
                .map(|s| StorageCase::parse_lenient(s))
                .unwrap_or_default(),
            purchase_date: Self::get_date_field(fields, COL_PURCHASE_DATE),
            purchase_price: Self::get_price_field(fields, COL_PURCHASE_PRICE),
            notes: Self::get_text_field(fields, COL_NOTES),
            row_number,
        }
    }

    // ==========================================
    // 辅助方法: 字段解析
    // ==========================================

    fn get_string_field(fields: &[String], index: usize) -> Option<String> {
        fields
            .get(index)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// 自由文本字段: 去空白 + <br> 标记归一
    fn get_text_field(fields: &[String], index: usize) -> Option<String> {
        Self::get_string_field(fields, index).map(|s| Self::normalize_breaks(&s))
    }

    fn get_date_field(fields: &[String], index: usize) -> Option<NaiveDate> {
        fields.get(index).and_then(|s| {
            let trimmed = s.trim();
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
                .ok()
        })
    }

    /// 价格字段: 容忍千分位逗号与货币记号（日元整数）
    fn get_price_field(fields: &[String], index: usize) -> Option<i64> {
        fields.get(index).and_then(|s| {
            s.trim()
                .replace(',', "")
                .replace('¥', "")
                .replace('円', "")
                .trim()
                .parse::<i64>()
                .ok()
        })
    }

    /// <br> 系列标记归一为换行符
    fn normalize_breaks(raw: &str) -> String {
        let mut out = raw.to_string();
        for marker in ["<br />", "<br/>", "<br>", "<BR />", "<BR/>", "<BR>"] {
            out = out.replace(marker, "\n");
        }
        out
    }
}

impl Default for RowParser {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    /// 标准三段输入: 行号列行 + 表头 + 数据
    fn wrap_data(data_lines: &str) -> String {
        format!(
            "1,2,3,4,5,6,7,8,9\n管理编号,厂商,品番,商品名,状态,保管,购入日,价格,备注\n{}",
            data_lines
        )
    }

    #[test]
    fn test_parse_basic_rows() {
        let text = wrap_data(
            "A-001,KATO,10-1603,E233系,NORMAL,WITH_CASE,2023-05-01,12800,初回品\n\
             A-002,TOMIX,98430,,BROKEN,NO_CASE,2023/06/15,\"9,800\",",
        );
        let parser = RowParser::new();
        let sheet = parser.parse_text(&text).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert!(sheet.issues.is_empty());

        let first = &sheet.rows[0];
        assert_eq!(first.row_number, 3);
        assert_eq!(first.external_ref.as_deref(), Some("A-001"));
        assert_eq!(first.brand.as_deref(), Some("KATO"));
        assert_eq!(first.catalog_code.as_deref(), Some("10-1603"));
        assert_eq!(first.status, VehicleStatus::Normal);
        assert_eq!(first.storage_case, StorageCase::WithCase);
        assert_eq!(
            first.purchase_date,
            NaiveDate::from_ymd_opt(2023, 5, 1)
        );
        assert_eq!(first.purchase_price, Some(12800));

        let second = &sheet.rows[1];
        assert_eq!(second.row_number, 4);
        assert_eq!(second.name, None);
        // 斜线日期与千分位价格
        assert_eq!(
            second.purchase_date,
            NaiveDate::from_ymd_opt(2023, 6, 15)
        );
        assert_eq!(second.purchase_price, Some(9800));
    }

    #[test]
    fn test_parse_quoted_fields_with_delimiter_and_escaped_quotes() {
        let text = wrap_data(
            "A-001,KATO,10-1603,\"E233系, 中央線\",NORMAL,WITH_CASE,,,\"俗称 \"\"オレンジ\"\" 帯\"",
        );
        let sheet = RowParser::new().parse_text(&text).unwrap();

        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].name.as_deref(), Some("E233系, 中央線"));
        assert_eq!(
            sheet.rows[0].notes.as_deref(),
            Some("俗称 \"オレンジ\" 帯")
        );
    }

    #[test]
    fn test_parse_embedded_newline_keeps_physical_row_numbers() {
        let text = wrap_data(
            "A-001,KATO,10-1603,E233系,NORMAL,WITH_CASE,,,\"第一行\n第二行\"\n\
             A-002,TOMIX,98430,485系,NORMAL,NO_CASE,,,",
        );
        let sheet = RowParser::new().parse_text(&text).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].row_number, 3);
        assert_eq!(sheet.rows[0].notes.as_deref(), Some("第一行\n第二行"));
        // 引号内换行占用物理行,下一条记录行号顺延
        assert_eq!(sheet.rows[1].row_number, 5);
    }

    #[test]
    fn test_parse_br_markers_normalized() {
        let text = wrap_data(
            "A-001,KATO,10-1603,E233系<br>增结套装,NORMAL,WITH_CASE,,,备注一<br/>备注二",
        );
        let sheet = RowParser::new().parse_text(&text).unwrap();

        assert_eq!(
            sheet.rows[0].name.as_deref(),
            Some("E233系\n增结套装")
        );
        assert_eq!(sheet.rows[0].notes.as_deref(), Some("备注一\n备注二"));
    }

    #[test]
    fn test_parse_short_row_reported_and_skipped() {
        let text = wrap_data(
            "A-001,KATO,10-1603\n\
             A-002,TOMIX,98430,485系,NORMAL,NO_CASE,,,OK",
        );
        let sheet = RowParser::new().parse_text(&text).unwrap();

        // 短行跳过,后续行继续
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].external_ref.as_deref(), Some("A-002"));
        assert_eq!(sheet.issues.len(), 1);
        assert_eq!(sheet.issues[0].row_number, 3);
        assert!(sheet.issues[0].message.contains("列数不足"));
    }

    #[test]
    fn test_parse_blank_lines_skipped_silently() {
        let text = wrap_data(
            "A-001,KATO,10-1603,E233系,NORMAL,WITH_CASE,,,\n\
             \n\
             A-002,TOMIX,98430,485系,NORMAL,NO_CASE,,,",
        );
        let sheet = RowParser::new().parse_text(&text).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert!(sheet.issues.is_empty());
    }

    #[test]
    fn test_parse_empty_input_rejected() {
        let parser = RowParser::new();
        assert!(matches!(
            parser.parse_text(""),
            Err(ImportError::EmptyInput)
        ));
        assert!(matches!(
            parser.parse_text("   \n  "),
            Err(ImportError::EmptyInput)
        ));
    }

    #[test]
    fn test_parse_missing_or_short_header_rejected() {
        let parser = RowParser::new();
        // 只有行号列行,没有表头
        assert!(matches!(
            parser.parse_text("1,2,3,4,5,6,7,8,9\n"),
            Err(ImportError::MissingHeader { .. })
        ));
        // 表头列数不足
        assert!(matches!(
            parser.parse_text("1,2,3\na,b,c\nx,y,z"),
            Err(ImportError::MissingHeader { .. })
        ));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = wrap_data(
            "A-001,KATO,10-1603,E233系,NORMAL,WITH_CASE,2023-05-01,12800,第一\n\
             bad-row,only,three\n\
             A-003,,,自由記述車両,broken,,,不明,",
        );
        let parser = RowParser::new();
        let first = parser.parse_text(&text).unwrap();
        let second = parser.parse_text(&text).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_lenient_status_and_price() {
        let text = wrap_data("A-001,KATO,10-1603,E233系,謎状態,???,2023-13-99,値段不明,");
        let sheet = RowParser::new().parse_text(&text).unwrap();

        let row = &sheet.rows[0];
        // 未知 token 回落默认值;非法日期/价格视为缺失
        assert_eq!(row.status, VehicleStatus::Normal);
        assert_eq!(row.storage_case, StorageCase::Unknown);
        assert_eq!(row.purchase_date, None);
        assert_eq!(row.purchase_price, None);
    }
}
