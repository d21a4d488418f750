// ==========================================
// 喷涂线颜色排序系统 - 领域模型层
// ==========================================
// 职责: 定义颜色项、换色组、转换规则与优化结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod cluster;
pub mod item;
pub mod result;
pub mod types;

// 重导出核心类型
pub use cluster::{ClusterMembership, TransitionRule, TransitionRuleSet};
pub use item::ColorItem;
pub use result::{OptimizationResult, RankedTour, TourCost};
pub use types::{ItemType, SequenceClass};
