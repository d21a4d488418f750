// ==========================================
// 喷涂线颜色排序系统 - 导入层
// ==========================================
// 职责: 当日颜色清单导入，生成 ColorItem
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod file_parser;
pub mod item_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use item_importer::{ItemImportReport, ItemImporter, RowIssue};
