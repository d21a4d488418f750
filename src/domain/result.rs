// ==========================================
// 喷涂线颜色排序系统 - 优化结果
// ==========================================
// 每次调用创建一次，之后只读
// ==========================================

use crate::domain::item::ColorItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// ==========================================
// TourCost - 路径成本（有限值或不可行）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TourCost {
    Finite(i64),
    Infeasible,
}

impl TourCost {
    pub fn is_feasible(&self) -> bool {
        matches!(self, TourCost::Finite(_))
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            TourCost::Finite(v) => Some(*v),
            TourCost::Infeasible => None,
        }
    }
}

impl fmt::Display for TourCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TourCost::Finite(v) => write!(f, "{}", v),
            TourCost::Infeasible => write!(f, "infeasible"),
        }
    }
}

// 对外输出: 数值或 "infeasible"
impl Serialize for TourCost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TourCost::Finite(v) => serializer.serialize_i64(*v),
            TourCost::Infeasible => serializer.serialize_str("infeasible"),
        }
    }
}

// ==========================================
// RankedTour - 候选路径
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedTour {
    /// 换色组名称序列（开放路径，不回到起点）
    pub clusters: Vec<String>,
    pub cost: i64,
}

// ==========================================
// OptimizationResult - 一次优化调用的完整输出
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    /// 本次调用 ID
    pub run_id: String,

    /// 排序后的颜色项（已标注 cluster）
    pub ordered_items: Vec<ColorItem>,

    /// 实际使用的换色组路径
    pub cluster_sequence: Vec<String>,

    /// 实际路径成本
    pub cost: TourCost,

    /// 前 N 条候选路径（按成本非降序，去重）
    pub alternatives: Vec<RankedTour>,

    /// 未能解析换色组的产品代码
    pub unresolved_codes: Vec<String>,

    /// 是否走了降级（按组分组、不优化）路径
    pub fallback: bool,

    /// 异常与提示（长度不符等）
    pub warnings: Vec<String>,

    /// 人类可读的诊断摘要
    pub message: String,

    pub generated_at: DateTime<Utc>,
}

impl OptimizationResult {
    pub fn is_optimized(&self) -> bool {
        !self.fallback && self.cost.is_feasible()
    }
}
