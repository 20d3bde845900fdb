// ==========================================
// 铁道模型藏品管理系统 - 文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 职责: 文件 → 位置化记录流 → RowParser 共用管道
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_parser::{ParsedSheet, RowParser};
use calamine::{open_workbook, Reader, Xlsx};
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser {
    /// 解析文件为 ParsedSheet（行号/表头/最小列数口径与文本路径一致）
    fn parse_to_sheet(&self, file_path: &Path) -> ImportResult<ParsedSheet>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvFileParser;

impl FileParser for CsvFileParser {
    fn parse_to_sheet(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(
                file_path.display().to_string(),
            ));
        }

        // 检查扩展名
        if let Some(ext) = file_path.extension() {
            if ext != "csv" {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let raw_text = std::fs::read_to_string(file_path)?;
        RowParser::new().parse_text(&raw_text)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelFileParser;

impl FileParser for ExcelFileParser {
    fn parse_to_sheet(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(
                file_path.display().to_string(),
            ));
        }

        // 检查扩展名
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext.to_string()));
        }

        // 打开 Excel 文件
        let mut workbook: Xlsx<_> = open_workbook(file_path)
            .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError(
                "Excel 文件无工作表".to_string(),
            ));
        }
        // TODO: 多工作表导入（当前仅第一个工作表）

        let sheet_name = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 工作表行 → 位置化记录（行号 1 起算,与文本路径同口径:
        // 第 1 行行号列、第 2 行表头由 RowParser 统一处理）
        let records: Vec<(usize, Vec<String>)> = range
            .rows()
            .enumerate()
            .map(|(idx, row)| {
                (
                    idx + 1,
                    row.iter()
                        .map(|cell| cell.to_string().trim().to_string())
                        .collect(),
                )
            })
            .collect();

        RowParser::new().parse_records(records, Vec::new())
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedSheet> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvFileParser.parse_to_sheet(path),
            "xlsx" | "xls" => ExcelFileParser.parse_to_sheet(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_csv_file_parser_valid_file() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "1,2,3,4,5,6,7,8,9").unwrap();
        writeln!(temp_file, "管理编号,厂商,品番,商品名,状态,保管,购入日,价格,备注").unwrap();
        writeln!(temp_file, "A-001,KATO,10-1603,E233系,NORMAL,WITH_CASE,,,").unwrap();
        writeln!(temp_file, "A-002,TOMIX,98430,485系,NORMAL,NO_CASE,,,").unwrap();

        let sheet = CsvFileParser.parse_to_sheet(temp_file.path()).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].external_ref.as_deref(), Some("A-001"));
        assert_eq!(sheet.rows[0].brand.as_deref(), Some("KATO"));
    }

    #[test]
    fn test_csv_file_parser_file_not_found() {
        let result = CsvFileParser.parse_to_sheet(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
