// ==========================================
// 喷涂线颜色排序系统 - 锁定约束下的重新优化
// ==========================================
// 职责: 保持锁定颜色项的位置不变，只对未锁定项重新排序
// 规则:
// - 全部锁定: 原样返回
// - 起点 = 原序列中最后一个锁定项所在换色组
// - 同组的未锁定项前置，再对未锁定项执行完整流水线
// - 结果按顺序回填到未锁定槽位
// 红线: 锁定项的下标与内容严格不变
// ==========================================

use crate::domain::item::ColorItem;
use crate::domain::result::{OptimizationResult, TourCost};
use crate::engine::manual_ops::assign_locked_positions;
use crate::engine::orchestrator::{SequenceOrchestrator, SequenceRequest};
use crate::i18n::{t, t_with_args};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ConstrainedReoptimizer<'a> {
    orchestrator: &'a SequenceOrchestrator,
}

impl<'a> ConstrainedReoptimizer<'a> {
    pub fn new(orchestrator: &'a SequenceOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// 在锁定项周围重新优化
    ///
    /// # 参数
    /// - items: 当前序列（locked 标记锁定项）
    /// - request: 成员映射与规则；起点由最后一个锁定项推断，首色不生效
    pub fn reoptimize(&self, mut items: Vec<ColorItem>, request: &SequenceRequest<'_>) -> OptimizationResult {
        for item in items.iter_mut() {
            if let Some(cluster) = request.membership.cluster_of(&item.code) {
                item.cluster = Some(cluster.to_string());
            }
        }

        let locked_count = items.iter().filter(|i| i.locked).count();
        let free: Vec<ColorItem> = items.iter().filter(|i| !i.locked).cloned().collect();

        if free.is_empty() {
            info!(items = items.len(), "所有颜色项均已锁定，保持原顺序");
            return OptimizationResult {
                run_id: Uuid::new_v4().to_string(),
                ordered_items: with_locked_positions(items),
                cluster_sequence: Vec::new(),
                cost: TourCost::Finite(0),
                alternatives: Vec::new(),
                unresolved_codes: Vec::new(),
                fallback: false,
                warnings: Vec::new(),
                message: t("reoptimize.all_locked"),
                generated_at: Utc::now(),
            };
        }

        let start_cluster = items
            .iter()
            .rev()
            .find(|i| i.locked)
            .and_then(|i| i.cluster.clone());

        let free_ordered = match &start_cluster {
            Some(start) => {
                let (same, other): (Vec<ColorItem>, Vec<ColorItem>) = free
                    .into_iter()
                    .partition(|i| i.cluster.as_deref() == Some(start.as_str()));
                same.into_iter().chain(other).collect()
            }
            None => free,
        };

        let mut free_request = SequenceRequest::new(request.membership, request.rules)
            .with_priority_codes(request.priority_codes.clone());
        free_request.start_cluster = match &start_cluster {
            Some(start) => Some(start.clone()),
            None if locked_count == 0 => request.start_cluster.clone(),
            None => None,
        };
        if locked_count == 0 {
            free_request.first_item = request.first_item.clone();
        } else if start_cluster.is_none() {
            warn!("最后一个锁定项无法解析换色组，按自由起点优化");
        }

        info!(
            locked = locked_count,
            free = free_ordered.len(),
            start = ?start_cluster,
            "开始锁定约束下的重新优化"
        );

        let free_count = free_ordered.len();
        let mut result = self.orchestrator.optimize(free_ordered, &free_request);

        let mut optimized = std::mem::take(&mut result.ordered_items).into_iter();
        let mut merged: Vec<ColorItem> = Vec::with_capacity(items.len());
        for item in items {
            if item.locked {
                merged.push(item);
            } else if let Some(next) = optimized.next() {
                merged.push(next);
            }
        }
        result.ordered_items = with_locked_positions(merged);

        if locked_count > 0 {
            result.message = format!(
                "{}\n{}",
                t_with_args(
                    "reoptimize.done",
                    &[
                        ("locked", &locked_count.to_string()),
                        ("free", &free_count.to_string()),
                    ],
                ),
                result.message
            );
        }
        result
    }

    /// 换色组锁定: 被锁定换色组的所有颜色项视为锁定，再重新优化
    pub fn reoptimize_with_cluster_locks(
        &self,
        items: Vec<ColorItem>,
        cluster_locks: &HashMap<String, bool>,
        request: &SequenceRequest<'_>,
    ) -> OptimizationResult {
        let items: Vec<ColorItem> = items
            .into_iter()
            .map(|mut item| {
                let cluster = request
                    .membership
                    .cluster_of(&item.code)
                    .map(str::to_string)
                    .or_else(|| item.cluster.clone());
                if let Some(c) = &cluster {
                    if cluster_locks.get(c).copied().unwrap_or(false) {
                        item.locked = true;
                    }
                }
                item.cluster = cluster;
                item
            })
            .collect();

        self.reoptimize(items, request)
    }
}

fn with_locked_positions(mut items: Vec<ColorItem>) -> Vec<ColorItem> {
    assign_locked_positions(&mut items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cost_model::CostModelConfig;
    use crate::domain::cluster::{ClusterMembership, TransitionRuleSet};
    use crate::domain::types::ItemType;

    fn membership() -> ClusterMembership {
        ClusterMembership::from_pairs([
            ("A", "A1"),
            ("A", "A2"),
            ("B", "B1"),
            ("B", "B2"),
            ("C", "C1"),
        ])
        .unwrap()
    }

    fn kit(code: &str, seq: u32) -> ColorItem {
        ColorItem::new(code, ItemType::Kit).with_sequence(seq)
    }

    fn codes(items: &[ColorItem]) -> Vec<&str> {
        items.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn test_all_locked_returns_input() {
        let m = membership();
        let rules = TransitionRuleSet::new();
        let orch = SequenceOrchestrator::new(CostModelConfig::default());
        let items = vec![kit("B1", 0).locked(), kit("A1", 0).locked()];

        let result = ConstrainedReoptimizer::new(&orch)
            .reoptimize(items, &SequenceRequest::new(&m, &rules));

        assert_eq!(codes(&result.ordered_items), vec!["B1", "A1"]);
        assert_eq!(result.ordered_items[1].position, Some(1));
        assert!(result.cluster_sequence.is_empty());
    }

    #[test]
    fn test_locked_prefix_is_preserved() {
        let m = membership();
        let rules = TransitionRuleSet::new();
        let orch = SequenceOrchestrator::new(CostModelConfig::default());
        let items = vec![
            kit("C1", 9).locked(),
            kit("A1", 9).locked(),
            kit("B1", 1),
            kit("A2", 5),
            kit("B2", 1),
        ];

        let result = ConstrainedReoptimizer::new(&orch)
            .reoptimize(items.clone(), &SequenceRequest::new(&m, &rules));

        assert_eq!(&codes(&result.ordered_items)[..2], &["C1", "A1"]);
        assert_eq!(result.ordered_items[0].position, Some(0));
        assert_eq!(result.ordered_items[1].position, Some(1));

        let mut tail: Vec<&str> = codes(&result.ordered_items)[2..].to_vec();
        // 起点为最后一个锁定项的换色组 A
        assert_eq!(tail[0], "A2");
        assert_eq!(result.cluster_sequence[0], "A");
        tail.sort();
        assert_eq!(tail, vec!["A2", "B1", "B2"]);
        assert!(result.ordered_items[2..].iter().all(|i| i.position.is_none()));
    }

    #[test]
    fn test_locked_items_in_the_middle_keep_slots() {
        let m = membership();
        let rules = TransitionRuleSet::new();
        let orch = SequenceOrchestrator::new(CostModelConfig::default());
        let items = vec![
            kit("A1", 3),
            kit("B1", 1).locked(),
            kit("C1", 2),
            kit("A2", 3).locked(),
            kit("B2", 1),
        ];

        let result = ConstrainedReoptimizer::new(&orch)
            .reoptimize(items, &SequenceRequest::new(&m, &rules));

        let out = codes(&result.ordered_items);
        assert_eq!(out.len(), 5);
        assert_eq!(out[1], "B1");
        assert_eq!(out[3], "A2");
        // 起点为 A（最后一个锁定项 A2），A1 排在首个空槽
        assert_eq!(out[0], "A1");
    }

    #[test]
    fn test_cluster_lock_marks_members_locked() {
        let m = membership();
        let rules = TransitionRuleSet::new();
        let orch = SequenceOrchestrator::new(CostModelConfig::default());
        let items = vec![kit("B1", 5), kit("A1", 1), kit("B2", 5), kit("C1", 0)];
        let locks: HashMap<String, bool> =
            [("B".to_string(), true), ("A".to_string(), false)].into_iter().collect();

        let result = ConstrainedReoptimizer::new(&orch).reoptimize_with_cluster_locks(
            items,
            &locks,
            &SequenceRequest::new(&m, &rules),
        );

        let out = codes(&result.ordered_items);
        assert_eq!(out[0], "B1");
        assert_eq!(out[2], "B2");
        assert!(result.ordered_items[0].locked);
        assert!(!result.ordered_items[1].locked);
        let mut free = vec![out[1], out[3]];
        free.sort();
        assert_eq!(free, vec!["A1", "C1"]);
    }
}
