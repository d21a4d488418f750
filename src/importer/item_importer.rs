// ==========================================
// 喷涂线颜色排序系统 - 当日颜色清单导入
// ==========================================
// 职责: 原始记录 → ColorItem（类型/序列类别代码在此一次性规范化）
// 规则:
// - 代码为空 / 类型缺失或未知 / 序列类别未知 → 拒绝该行并报出
// - 序列号无法解析 → 按缺失处理（计算时视为 0），报出但不拒绝
// - 锁定标记: 1/true/yes/y/si/x 视为锁定
// ==========================================

use crate::domain::item::ColorItem;
use crate::domain::types::{ItemType, SequenceClass};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

// 列名别名（小写比较）
const CODE_ALIASES: &[&str] = &["code", "codice"];
const TYPE_ALIASES: &[&str] = &["type", "tipo"];
const SEQUENCE_ALIASES: &[&str] = &["sequence", "sequenza"];
const SEQUENCE_CLASS_ALIASES: &[&str] = &["sequence_type", "tipo_sequenza"];
const LOCKED_ALIASES: &[&str] = &["locked", "bloccato"];
const POSITION_ALIASES: &[&str] = &["position", "posizione"];

/// 行级问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub field: String,
    pub value: String,
    pub message: String,
    /// 是否导致该行被拒绝
    pub rejected: bool,
}

/// 导入结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemImportReport {
    pub items: Vec<ColorItem>,
    pub issues: Vec<RowIssue>,
    pub total_rows: usize,
}

impl ItemImportReport {
    pub fn rejected_rows(&self) -> usize {
        let mut rows: Vec<usize> = self
            .issues
            .iter()
            .filter(|i| i.rejected)
            .map(|i| i.row)
            .collect();
        rows.dedup();
        rows.len()
    }
}

pub struct ItemImporter;

impl ItemImporter {
    /// 从 CSV / Excel 文件导入
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ItemImportReport> {
        let path = file_path.as_ref();
        let records = UniversalFileParser.parse(path)?;
        let report = self.import_records(&records)?;

        tracing::info!(
            file = %path.display(),
            rows = report.total_rows,
            items = report.items.len(),
            rejected = report.rejected_rows(),
            "颜色清单导入完成"
        );
        Ok(report)
    }

    /// 从原始记录导入
    ///
    /// # 返回
    /// - Ok(report): 有效颜色项 + 行级问题
    /// - Err(MissingColumn): 缺少代码或类型列
    pub fn import_records(&self, records: &[RawRecord]) -> ImportResult<ItemImportReport> {
        let mut report = ItemImportReport {
            total_rows: records.len(),
            ..Default::default()
        };
        if records.is_empty() {
            return Ok(report);
        }

        let columns = ColumnMap::from_records(records);
        let code_col = columns.require("code", CODE_ALIASES)?;
        let type_col = columns.require("type", TYPE_ALIASES)?;

        for record in records {
            let mut row_issues = Vec::new();
            let item = parse_row(record, &columns, &code_col, &type_col, &mut row_issues);
            for issue in &row_issues {
                tracing::warn!(
                    row = issue.row,
                    field = %issue.field,
                    value = %issue.value,
                    rejected = issue.rejected,
                    "{}",
                    issue.message
                );
            }
            report.issues.extend(row_issues);
            if let Some(item) = item {
                report.items.push(item);
            }
        }

        Ok(report)
    }
}

/// 规范化列名 → 实际表头
struct ColumnMap {
    by_lower: HashMap<String, String>,
}

impl ColumnMap {
    fn from_records(records: &[RawRecord]) -> Self {
        let mut by_lower = HashMap::new();
        for record in records {
            for header in record.fields.keys() {
                by_lower
                    .entry(header.trim().to_lowercase())
                    .or_insert_with(|| header.clone());
            }
        }
        Self { by_lower }
    }

    fn find(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|a| self.by_lower.get(*a).cloned())
    }

    fn require(&self, column: &str, aliases: &[&str]) -> ImportResult<String> {
        self.find(aliases).ok_or_else(|| ImportError::MissingColumn {
            column: column.to_string(),
            aliases: aliases.join("|"),
        })
    }
}

fn parse_row(
    record: &RawRecord,
    columns: &ColumnMap,
    code_col: &str,
    type_col: &str,
    issues: &mut Vec<RowIssue>,
) -> Option<ColorItem> {
    let get = |col: Option<String>| -> String {
        col.and_then(|c| record.fields.get(&c).map(|v| v.trim().to_string()))
            .unwrap_or_default()
    };
    let mut issue = |field: &str, value: &str, message: String, rejected: bool| {
        issues.push(RowIssue {
            row: record.row,
            field: field.to_string(),
            value: value.to_string(),
            message,
            rejected,
        });
    };

    let code = get(Some(code_col.to_string()));
    if code.is_empty() {
        issue("code", "", "产品代码为空".to_string(), true);
        return None;
    }

    let raw_type = get(Some(type_col.to_string()));
    let item_type = match ItemType::from_code(&raw_type) {
        Ok(t) => t,
        Err(_) if raw_type.is_empty() => {
            issue("type", "", "颜色类型为空".to_string(), true);
            return None;
        }
        Err(unknown) => {
            issue("type", &raw_type, format!("未知颜色类型: {}", unknown), true);
            return None;
        }
    };

    let raw_class = get(columns.find(SEQUENCE_CLASS_ALIASES));
    let sequence_class = match SequenceClass::from_code(&raw_class) {
        Ok(c) => c,
        Err(unknown) => {
            issue(
                "sequence_type",
                &raw_class,
                format!("未知序列类别: {}", unknown),
                true,
            );
            return None;
        }
    };

    let raw_sequence = get(columns.find(SEQUENCE_ALIASES));
    let sequence = if raw_sequence.is_empty() {
        None
    } else {
        let parsed = parse_non_negative(&raw_sequence);
        if parsed.is_none() {
            issue(
                "sequence",
                &raw_sequence,
                "序列号无法解析，按缺失处理".to_string(),
                false,
            );
        }
        parsed.and_then(|v| u32::try_from(v).ok())
    };

    let locked = parse_flag(&get(columns.find(LOCKED_ALIASES)));

    let raw_position = get(columns.find(POSITION_ALIASES));
    let position = if raw_position.is_empty() {
        None
    } else {
        let parsed = parse_non_negative(&raw_position);
        if parsed.is_none() {
            issue(
                "position",
                &raw_position,
                "位置无法解析，已忽略".to_string(),
                false,
            );
        }
        parsed.and_then(|v| usize::try_from(v).ok())
    };

    let mut item = ColorItem::new(code, item_type).with_sequence_class(sequence_class);
    item.sequence = sequence;
    item.locked = locked;
    item.position = position;
    Some(item)
}

/// 解析非负整数（兼容 Excel 导出的 "3.0"）
fn parse_non_negative(raw: &str) -> Option<u64> {
    if let Ok(v) = raw.parse::<u64>() {
        return Some(v);
    }
    match raw.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Some(f as u64),
        _ => None,
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "si" | "sì" | "x"
    )
}
