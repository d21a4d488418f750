// ==========================================
// 喷涂线颜色排序系统 - 颜色项实体
// ==========================================
// 生命周期: 单次优化调用内创建，流水线中就地补充 cluster / position，
//           响应生成后丢弃（无跨调用身份）
// ==========================================

use crate::domain::types::{ItemType, SequenceClass};
use serde::{Deserialize, Serialize};

/// 当天待生产的一个颜色项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorItem {
    /// 产品代码（如 RAL9005）
    pub code: String,

    /// 颜色类型
    pub item_type: ItemType,

    /// 用户序列号（缺失/无法解析时为 None，计算时按 0 处理）
    #[serde(default)]
    pub sequence: Option<u32>,

    /// 序列类别
    #[serde(default)]
    pub sequence_class: SequenceClass,

    /// 解析后的换色组（未解析时为 None，会被报出而非丢弃）
    #[serde(default)]
    pub cluster: Option<String>,

    /// 是否锁定位置
    #[serde(default)]
    pub locked: bool,

    /// 锁定时的位置
    #[serde(default)]
    pub position: Option<usize>,
}

impl ColorItem {
    pub fn new(code: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            code: code.into(),
            item_type,
            sequence: None,
            sequence_class: SequenceClass::Unset,
            cluster: None,
            locked: false,
            position: None,
        }
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_sequence_class(mut self, sequence_class: SequenceClass) -> Self {
        self.sequence_class = sequence_class;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// 参与计算的序列值（缺失按 0）
    pub fn effective_sequence(&self) -> u32 {
        self.sequence.unwrap_or(0)
    }

    /// 日志/提示使用的标识: code_type
    pub fn label(&self) -> String {
        format!("{}_{}", self.code, self.item_type)
    }
}
