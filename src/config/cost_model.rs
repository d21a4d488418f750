// ==========================================
// 喷涂线颜色排序系统 - 成本模型参数
// ==========================================
// 职责: 汇总所有可调常量（类型权重、奖励/惩罚、哨兵值、Top-N）
// 红线: 纯数据，不含读取逻辑；引擎只消费此结构
// ==========================================

use crate::domain::types::ItemType;
use serde::{Deserialize, Serialize};

/// 求解器可接受的换色组数量上限（DP 表 2^N·N 格，20 组约 168 MB）
pub const MAX_CLUSTERS_CEILING: usize = 20;

/// INFINITE 哨兵上限：N 条边的路径成本之和不会溢出 i64
pub const MAX_INFINITE_COST: i64 = 1_000_000_000;

// ==========================================
// TypeWeights - 颜色类型优先权重（越小越先）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeWeights {
    pub urgent_restock: i64,
    pub non_urgent_restock: i64,
    pub fixed: i64,
    pub kit: i64,
    pub aesthetic: i64,
    pub other: i64,
}

impl Default for TypeWeights {
    fn default() -> Self {
        Self {
            urgent_restock: 0,
            non_urgent_restock: 1,
            fixed: 2,
            kit: 4,
            aesthetic: 100,
            other: 100,
        }
    }
}

impl TypeWeights {
    pub fn weight_of(&self, item_type: ItemType) -> i64 {
        match item_type {
            ItemType::UrgentRestock => self.urgent_restock,
            ItemType::NonUrgentRestock => self.non_urgent_restock,
            ItemType::Fixed => self.fixed,
            ItemType::Kit => self.kit,
            ItemType::Aesthetic => self.aesthetic,
            ItemType::Other => self.other,
        }
    }
}

// ==========================================
// CostModelConfig - 成本模型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModelConfig {
    pub type_weights: TypeWeights,

    /// 目标组含优先补货代码时的奖励（负数）
    pub priority_restock_bonus: i64,
    /// 目标组含紧急补货项时的奖励（负数）
    pub urgent_restock_bonus: i64,
    /// 目标组含非紧急补货项时的奖励（负数）
    pub non_urgent_restock_bonus: i64,

    /// 目标组序列优先级更高（数值更小）时的奖励（负数）
    pub sequence_priority_bonus: i64,
    /// 目标组序列优先级更低时的惩罚（正数）
    pub sequence_priority_penalty: i64,
    /// 序列优先级差达到该值才调整
    pub sequence_priority_threshold: i64,

    /// 必需类型为 Fixed 但目标组缺失时的惩罚
    pub unsatisfied_fixed_penalty: i64,

    /// 无规则时的默认转换权重
    pub default_transition_weight: i64,
    /// 同组转换成本
    pub same_cluster_cost: i64,
    /// 禁止转换的哨兵值
    pub infinite_cost: i64,

    /// 返回的候选路径数量
    pub top_n: usize,
    /// 无序列值的换色组优先级
    pub empty_cluster_priority: i64,
    /// 求解器可接受的最大换色组数量（状态空间 2^N·N）
    pub max_clusters: usize,
}

impl Default for CostModelConfig {
    fn default() -> Self {
        Self {
            type_weights: TypeWeights::default(),
            priority_restock_bonus: -50,
            urgent_restock_bonus: -20,
            non_urgent_restock_bonus: -10,
            sequence_priority_bonus: -50,
            sequence_priority_penalty: 25,
            sequence_priority_threshold: 1,
            unsatisfied_fixed_penalty: 100,
            default_transition_weight: 10,
            same_cluster_cost: 1,
            infinite_cost: 9999,
            top_n: 3,
            empty_cluster_priority: 999,
            max_clusters: 16,
        }
    }
}

impl CostModelConfig {
    /// 校验参数一致性
    ///
    /// # 返回
    /// - Ok(()): 参数可用
    /// - Err(Vec<String>): 所有不一致项（中文描述）
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.infinite_cost <= 1 || self.infinite_cost > MAX_INFINITE_COST {
            problems.push(format!(
                "infinite_cost 必须位于 (1, {}]: {}",
                MAX_INFINITE_COST, self.infinite_cost
            ));
        }
        if self.same_cluster_cost < 1 || self.same_cluster_cost >= self.infinite_cost {
            problems.push(format!(
                "same_cluster_cost 必须位于 [1, infinite_cost): {}",
                self.same_cluster_cost
            ));
        }
        if self.default_transition_weight < 0 {
            problems.push(format!(
                "default_transition_weight 不能为负: {}",
                self.default_transition_weight
            ));
        }
        for (name, value) in [
            ("priority_restock_bonus", self.priority_restock_bonus),
            ("urgent_restock_bonus", self.urgent_restock_bonus),
            ("non_urgent_restock_bonus", self.non_urgent_restock_bonus),
            ("sequence_priority_bonus", self.sequence_priority_bonus),
        ] {
            if value > 0 {
                problems.push(format!("{} 应为非正数: {}", name, value));
            }
        }
        if self.sequence_priority_penalty < 0 {
            problems.push(format!(
                "sequence_priority_penalty 不能为负: {}",
                self.sequence_priority_penalty
            ));
        }
        if self.unsatisfied_fixed_penalty < 0 {
            problems.push(format!(
                "unsatisfied_fixed_penalty 不能为负: {}",
                self.unsatisfied_fixed_penalty
            ));
        }
        if self.top_n == 0 {
            problems.push("top_n 至少为 1".to_string());
        }
        if self.max_clusters == 0 || self.max_clusters > MAX_CLUSTERS_CEILING {
            problems.push(format!(
                "max_clusters 必须位于 [1, {}]: {}",
                MAX_CLUSTERS_CEILING, self.max_clusters
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CostModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.type_weights.weight_of(ItemType::Kit), 4);
        assert_eq!(config.infinite_cost, 9999);
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let config = CostModelConfig {
            top_n: 0,
            urgent_restock_bonus: 5,
            same_cluster_cost: 0,
            ..CostModelConfig::default()
        };
        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
    }

    #[test]
    fn test_max_clusters_ceiling() {
        let at_ceiling = CostModelConfig {
            max_clusters: MAX_CLUSTERS_CEILING,
            ..CostModelConfig::default()
        };
        assert!(at_ceiling.validate().is_ok());

        let above = CostModelConfig {
            max_clusters: MAX_CLUSTERS_CEILING + 1,
            ..CostModelConfig::default()
        };
        let problems = above.validate().unwrap_err();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("max_clusters"));
    }

    #[test]
    fn test_infinite_cost_upper_bound() {
        let at_bound = CostModelConfig {
            infinite_cost: MAX_INFINITE_COST,
            ..CostModelConfig::default()
        };
        assert!(at_bound.validate().is_ok());

        let huge = CostModelConfig {
            infinite_cost: i64::MAX,
            ..CostModelConfig::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CostModelConfig =
            serde_json::from_str(r#"{"default_transition_weight": 7}"#).unwrap();
        assert_eq!(config.default_transition_weight, 7);
        assert_eq!(config.top_n, 3);
    }
}
