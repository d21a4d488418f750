// ==========================================
// 喷涂线颜色排序系统 - 换色成本矩阵
// ==========================================
// 职责: 依据转换规则 + 成本模型，构建当日换色组的 N×N 成本矩阵
// 输入: 换色组解析结果 + 颜色项 + 转换规则 + 优先补货代码
// 输出: 稠密矩阵（行优先存储），所有元素 ∈ [1, INFINITE]
// 红线: 约束不满足时写入 INFINITE，不抛错
// ==========================================

use crate::config::cost_model::CostModelConfig;
use crate::domain::cluster::{TransitionRule, TransitionRuleSet};
use crate::domain::item::ColorItem;
use crate::domain::result::TourCost;
use crate::domain::types::ItemType;
use crate::engine::cluster_resolver::ResolvedClusters;
use std::collections::HashSet;

// ==========================================
// CostMatrix - 稠密成本矩阵
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    names: Vec<String>,
    cells: Vec<i64>,
    infinite: i64,
}

impl CostMatrix {
    /// 由行优先数据直接构建（测试与外部矩阵使用）
    ///
    /// # 返回
    /// - None: 数据长度不是 names.len() 的平方
    pub fn from_rows(names: Vec<String>, cells: Vec<i64>, infinite: i64) -> Option<Self> {
        if cells.len() != names.len() * names.len() {
            return None;
        }
        Some(Self {
            names,
            cells,
            infinite,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn infinite(&self) -> i64 {
        self.infinite
    }

    pub fn index_of(&self, cluster: &str) -> Option<usize> {
        self.names.iter().position(|n| n == cluster)
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.cells[from * self.names.len() + to]
    }

    #[inline]
    pub fn is_forbidden(&self, from: usize, to: usize) -> bool {
        self.get(from, to) >= self.infinite
    }

    /// 计算给定开放路径的成本
    ///
    /// 任一边被禁止即为 Infeasible；空路径与单点路径成本为 0
    pub fn tour_cost(&self, tour: &[usize]) -> TourCost {
        let mut total = 0i64;
        for pair in tour.windows(2) {
            if self.is_forbidden(pair[0], pair[1]) {
                return TourCost::Infeasible;
            }
            total = total.saturating_add(self.get(pair[0], pair[1]));
        }
        TourCost::Finite(total)
    }

    /// 按换色组名称计算路径成本
    ///
    /// # 返回
    /// - None: 路径中存在矩阵外的换色组
    pub fn tour_cost_by_names(&self, tour: &[String]) -> Option<TourCost> {
        let indices: Option<Vec<usize>> = tour.iter().map(|n| self.index_of(n)).collect();
        indices.map(|idx| self.tour_cost(&idx))
    }

    pub fn names_of(&self, tour: &[usize]) -> Vec<String> {
        tour.iter().map(|&i| self.names[i].clone()).collect()
    }
}

// ==========================================
// 目标换色组当日内容摘要
// ==========================================
#[derive(Debug, Default)]
struct DestinationProfile {
    codes: HashSet<String>,
    types: HashSet<ItemType>,
    has_priority_restock: bool,
    has_urgent_restock: bool,
    has_non_urgent_restock: bool,
}

impl DestinationProfile {
    fn build(indices: &[usize], items: &[ColorItem], priority_codes: &HashSet<&str>) -> Self {
        let mut profile = Self::default();
        for &idx in indices {
            let item = &items[idx];
            profile.codes.insert(item.code.clone());
            profile.types.insert(item.item_type);
            match item.item_type {
                ItemType::UrgentRestock => {
                    profile.has_urgent_restock = true;
                    if priority_codes.contains(item.code.as_str()) {
                        profile.has_priority_restock = true;
                    }
                }
                ItemType::NonUrgentRestock => profile.has_non_urgent_restock = true,
                _ => {}
            }
        }
        profile
    }

    fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

// ==========================================
// CostMatrixBuilder
// ==========================================
pub struct CostMatrixBuilder<'a> {
    config: &'a CostModelConfig,
}

impl<'a> CostMatrixBuilder<'a> {
    pub fn new(config: &'a CostModelConfig) -> Self {
        Self { config }
    }

    /// 构建成本矩阵
    ///
    /// # 参数
    /// - resolved: 换色组解析结果（矩阵下标 = resolved.order 下标）
    /// - items: 当日颜色项
    /// - rules: 转换规则
    /// - priority_codes: 优先补货代码
    pub fn build(
        &self,
        resolved: &ResolvedClusters,
        items: &[ColorItem],
        rules: &TransitionRuleSet,
        priority_codes: &[String],
    ) -> CostMatrix {
        let names = resolved.order.clone();
        let n = names.len();
        let priority_set: HashSet<&str> = priority_codes.iter().map(|s| s.trim()).collect();

        let profiles: Vec<DestinationProfile> = names
            .iter()
            .map(|name| {
                let indices = resolved.members.get(name).map(|v| v.as_slice()).unwrap_or(&[]);
                DestinationProfile::build(indices, items, &priority_set)
            })
            .collect();
        let priorities: Vec<i64> = names
            .iter()
            .map(|name| {
                resolved
                    .priority_of(name)
                    .unwrap_or(self.config.empty_cluster_priority)
            })
            .collect();

        let default_rule = TransitionRule::with_weight(self.config.default_transition_weight);
        let mut cells = vec![self.config.infinite_cost; n * n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    cells[i * n + j] = self.config.same_cluster_cost;
                    continue;
                }
                let rule = rules.get(&names[i], &names[j]).unwrap_or(&default_rule);
                let cost = self.transition_cost(rule, &profiles[j], priorities[i], priorities[j]);
                if cost >= self.config.infinite_cost {
                    tracing::debug!(from = %names[i], to = %names[j], "换色转换被禁止");
                }
                cells[i * n + j] = cost;
            }
        }

        tracing::debug!(clusters = n, "成本矩阵构建完成");

        CostMatrix {
            names,
            cells,
            infinite: self.config.infinite_cost,
        }
    }

    /// 单条转换 (源 → 目标) 的成本
    fn transition_cost(
        &self,
        rule: &TransitionRule,
        dest: &DestinationProfile,
        source_priority: i64,
        dest_priority: i64,
    ) -> i64 {
        let cfg = self.config;
        let required_type = rule.required_type;

        // 代码约束先判定；代码约束失败时不再判定类型
        let codes_ok = if rule.required_codes.is_empty() {
            true
        } else {
            !dest.is_empty() && rule.required_codes.iter().any(|c| dest.codes.contains(c))
        };
        let type_ok = match required_type {
            None => true,
            Some(_) if !codes_ok => true,
            Some(t) => !dest.is_empty() && dest.types.contains(&t),
        };

        if codes_ok && type_ok {
            let mut cost = rule.weight;

            let bonus = if dest.has_priority_restock {
                cfg.priority_restock_bonus
            } else if dest.has_urgent_restock {
                cfg.urgent_restock_bonus
            } else if dest.has_non_urgent_restock {
                cfg.non_urgent_restock_bonus
            } else {
                0
            };
            cost = cost.saturating_add(bonus).max(1);

            let diff = dest_priority.saturating_sub(source_priority).saturating_abs();
            if diff >= cfg.sequence_priority_threshold {
                if dest_priority < source_priority {
                    cost = cost.saturating_add(cfg.sequence_priority_bonus).max(1);
                } else if dest_priority > source_priority {
                    cost = cost.saturating_add(cfg.sequence_priority_penalty).max(1);
                }
            }

            return cost.min(cfg.infinite_cost);
        }

        if codes_ok && !type_ok && required_type == Some(ItemType::Fixed) {
            return rule
                .weight
                .saturating_add(cfg.unsatisfied_fixed_penalty)
                .max(1)
                .min(cfg.infinite_cost);
        }

        cfg.infinite_cost
    }
}
