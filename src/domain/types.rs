// ==========================================
// 喷涂线颜色排序系统 - 领域类型定义
// ==========================================
// 职责: 颜色类型 / 序列类别的枚举与一次性规范化
// 红线: 类型代码只在入口处解析一次，未知代码必须报出，不得静默兜底
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 颜色类型 (Item Type)
// ==========================================
// 数据库/外部输入使用短代码: R / RE / F / K / E
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    UrgentRestock,    // R  紧急补货
    NonUrgentRestock, // RE 非紧急补货
    Fixed,            // F  固定色
    Kit,              // K  套件
    Aesthetic,        // E  外观色（作为换色触发时极不受欢迎）
    Other,            // O  其他
}

impl ItemType {
    /// 外部短代码
    pub fn code(&self) -> &'static str {
        match self {
            ItemType::UrgentRestock => "R",
            ItemType::NonUrgentRestock => "RE",
            ItemType::Fixed => "F",
            ItemType::Kit => "K",
            ItemType::Aesthetic => "E",
            ItemType::Other => "O",
        }
    }

    /// 从外部代码解析（TRIM + UPPER，兼容带引号的历史数据）
    ///
    /// # 返回
    /// - Ok(ItemType): 已知代码
    /// - Err(String): 未知代码（原样返回，供调用方报出）
    pub fn from_code(raw: &str) -> Result<Self, String> {
        let cleaned = raw.trim().trim_matches('\'').trim().to_uppercase();
        match cleaned.as_str() {
            "R" | "REINTEGRO" | "URGENT_RESTOCK" => Ok(ItemType::UrgentRestock),
            "RE" | "NON_URGENT_RESTOCK" => Ok(ItemType::NonUrgentRestock),
            "F" | "FISSO" | "FIXED" => Ok(ItemType::Fixed),
            "K" | "KIT" => Ok(ItemType::Kit),
            "E" | "ESTETICO" | "AESTHETIC" => Ok(ItemType::Aesthetic),
            "O" | "ALTRO" | "OTHER" => Ok(ItemType::Other),
            _ => Err(raw.trim().to_string()),
        }
    }

    /// 同码兄弟项的内部顺序: F > R > K > 其他 > E
    pub fn sibling_rank(&self) -> u8 {
        match self {
            ItemType::Fixed => 0,
            ItemType::UrgentRestock => 1,
            ItemType::Kit => 2,
            ItemType::NonUrgentRestock | ItemType::Other => 3,
            ItemType::Aesthetic => 4,
        }
    }

    pub fn is_restock(&self) -> bool {
        matches!(self, ItemType::UrgentRestock | ItemType::NonUrgentRestock)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::from_code(s).map_err(|code| format!("未知颜色类型: {}", code))
    }
}

// ==========================================
// 序列类别 (Sequence Class)
// ==========================================
// 小序列(当天可完成) / 次日序列 / 未设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SequenceClass {
    SameDay,
    NextDay,
    #[default]
    Unset,
}

impl SequenceClass {
    /// 同分时的排序键: 当天序列优先，其余并列
    pub fn tie_rank(&self) -> u8 {
        match self {
            SequenceClass::SameDay => 0,
            SequenceClass::NextDay | SequenceClass::Unset => 1,
        }
    }

    /// 从外部代码解析；空值视为 Unset
    pub fn from_code(raw: &str) -> Result<Self, String> {
        let cleaned = raw.trim().to_lowercase();
        match cleaned.as_str() {
            "" => Ok(SequenceClass::Unset),
            "piccola" | "same_day" | "sameday" => Ok(SequenceClass::SameDay),
            "successiva" | "next_day" | "nextday" => Ok(SequenceClass::NextDay),
            _ => Err(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for SequenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceClass::SameDay => write!(f, "SAME_DAY"),
            SequenceClass::NextDay => write!(f, "NEXT_DAY"),
            SequenceClass::Unset => write!(f, "UNSET"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_from_code_normalizes() {
        assert_eq!(ItemType::from_code(" r "), Ok(ItemType::UrgentRestock));
        assert_eq!(ItemType::from_code("RE"), Ok(ItemType::NonUrgentRestock));
        assert_eq!(ItemType::from_code("'F'"), Ok(ItemType::Fixed));
        assert_eq!(ItemType::from_code("estetico"), Ok(ItemType::Aesthetic));
        assert_eq!(ItemType::from_code("XYZ"), Err("XYZ".to_string()));
    }

    #[test]
    fn test_sibling_rank_order() {
        let mut types = vec![
            ItemType::Aesthetic,
            ItemType::Kit,
            ItemType::Other,
            ItemType::UrgentRestock,
            ItemType::Fixed,
        ];
        types.sort_by_key(|t| t.sibling_rank());
        assert_eq!(
            types,
            vec![
                ItemType::Fixed,
                ItemType::UrgentRestock,
                ItemType::Kit,
                ItemType::Other,
                ItemType::Aesthetic
            ]
        );
    }

    #[test]
    fn test_sequence_class_from_code() {
        assert_eq!(SequenceClass::from_code("piccola"), Ok(SequenceClass::SameDay));
        assert_eq!(SequenceClass::from_code("Successiva"), Ok(SequenceClass::NextDay));
        assert_eq!(SequenceClass::from_code("  "), Ok(SequenceClass::Unset));
        assert!(SequenceClass::from_code("domani").is_err());
        assert!(SequenceClass::SameDay.tie_rank() < SequenceClass::NextDay.tie_rank());
    }
}
