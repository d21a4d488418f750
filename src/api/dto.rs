// ==========================================
// 喷涂线颜色排序系统 - API 请求/响应 DTO
// ==========================================
// 职责: 外部 JSON 形状 ↔ 领域类型；类型/序列类别代码在此规范化一次
// 兼容: 历史字段名（colors_today / first_color / prioritized_reintegrations 等）
// ==========================================

use crate::domain::item::ColorItem;
use crate::domain::types::{ItemType, SequenceClass};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// 序列号: 数字或文本
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SequenceValue {
    Number(i64),
    Float(f64),
    Text(String),
}

impl SequenceValue {
    /// 非负整数才有效；其余按缺失处理
    pub fn to_sequence(&self) -> Option<u32> {
        match self {
            SequenceValue::Number(n) => u32::try_from(*n).ok(),
            SequenceValue::Float(f) if *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64 => {
                Some(*f as u32)
            }
            SequenceValue::Float(_) => None,
            SequenceValue::Text(s) => s.trim().parse::<u32>().ok(),
        }
    }
}

// ==========================================
// 颜色项输入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorItemDto {
    pub code: String,

    /// 类型代码: R / RE / F / K / E
    #[serde(rename = "type")]
    pub item_type: String,

    #[serde(default)]
    pub sequence: Option<SequenceValue>,

    /// piccola / successiva（或 same_day / next_day）
    #[serde(default)]
    pub sequence_type: Option<String>,

    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub position: Option<usize>,
}

impl ColorItemDto {
    /// 转换为领域对象
    ///
    /// # 返回
    /// - Err(String): 代码为空、类型或序列类别未知
    pub fn to_item(&self) -> Result<ColorItem, String> {
        let code = self.code.trim();
        if code.is_empty() {
            return Err("产品代码不能为空".to_string());
        }

        let item_type = ItemType::from_code(&self.item_type)
            .map_err(|raw| format!("{}: 未知颜色类型 '{}'", code, raw))?;

        let sequence_class = match self.sequence_type.as_deref() {
            Some(raw) => SequenceClass::from_code(raw)
                .map_err(|raw| format!("{}: 未知序列类别 '{}'", code, raw))?,
            None => SequenceClass::Unset,
        };

        let mut item = ColorItem::new(code, item_type).with_sequence_class(sequence_class);
        item.sequence = self.sequence.as_ref().and_then(SequenceValue::to_sequence);
        item.locked = self.locked;
        item.position = self.position;
        Ok(item)
    }
}

impl From<&ColorItem> for ColorItemDto {
    fn from(item: &ColorItem) -> Self {
        Self {
            code: item.code.clone(),
            item_type: item.item_type.code().to_string(),
            sequence: item.sequence.map(|s| SequenceValue::Number(i64::from(s))),
            sequence_type: match item.sequence_class {
                SequenceClass::SameDay => Some("piccola".to_string()),
                SequenceClass::NextDay => Some("successiva".to_string()),
                SequenceClass::Unset => None,
            },
            locked: item.locked,
            position: item.position,
        }
    }
}

// ==========================================
// 请求
// ==========================================

/// 完整优化请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizeRequest {
    #[serde(alias = "colors_today")]
    pub items: Vec<ColorItemDto>,

    #[serde(default, alias = "start_cluster_name")]
    pub start_cluster: Option<String>,

    #[serde(default, alias = "first_color")]
    pub first_item: Option<String>,

    #[serde(default, alias = "prioritized_reintegrations")]
    pub priority_codes: Option<Vec<String>>,
}

/// 锁定项约束下的重新优化请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockedOptimizeRequest {
    #[serde(alias = "colors")]
    pub items: Vec<ColorItemDto>,

    #[serde(default, alias = "prioritized_reintegrations")]
    pub priority_codes: Option<Vec<String>>,
}

/// 换色组锁定请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterLockRequest {
    #[serde(alias = "colors")]
    pub items: Vec<ColorItemDto>,

    /// 换色组 → 是否锁定
    #[serde(default)]
    pub cluster_locks: HashMap<String, bool>,

    #[serde(default, alias = "prioritized_reintegrations")]
    pub priority_codes: Option<Vec<String>>,
}

/// 按换色组顺序重排请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterOrderRequest {
    #[serde(alias = "colors")]
    pub items: Vec<ColorItemDto>,

    pub cluster_order: Vec<String>,
}

/// 按位置排列重排请求（new_positions[i] = 新第 i 位所取的原下标）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReorderRequest {
    #[serde(alias = "colors")]
    pub items: Vec<ColorItemDto>,

    pub new_positions: Vec<usize>,
}

// ==========================================
// 响应
// ==========================================

/// 人工调整结果
#[derive(Debug, Clone, Serialize)]
pub struct ReorderResponse {
    pub ordered_items: Vec<ColorItem>,
    pub message: String,
}

/// 换色组成员视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMemberInfo {
    pub id: i64,
    pub cluster: String,
    pub item_code: String,
}

/// 转换规则视图 / 写入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRuleInfo {
    #[serde(default)]
    pub id: Option<i64>,
    pub source_cluster: String,
    pub target_cluster: String,
    pub weight: i64,
    #[serde(default)]
    pub required_codes: Vec<String>,
    /// 类型代码；None = 不约束
    #[serde(default)]
    pub required_type: Option<String>,
}
