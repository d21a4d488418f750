use super::*;
use crate::domain::cluster::TransitionRule;
use crate::domain::types::ItemType;

// ==========================================
// 测试辅助函数
// ==========================================

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

fn codes(result: &OptimizationResult) -> Vec<&str> {
    result.ordered_items.iter().map(|i| i.code.as_str()).collect()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn orchestrator() -> SequenceOrchestrator {
    SequenceOrchestrator::new(CostModelConfig::default())
}

// ==========================================
// 基本场景
// ==========================================

#[test]
fn test_empty_input_is_noop() {
    let m = membership();
    let rules = TransitionRuleSet::new();
    let result = orchestrator().optimize(vec![], &SequenceRequest::new(&m, &rules));

    assert!(result.ordered_items.is_empty());
    assert!(result.cluster_sequence.is_empty());
    assert_eq!(result.cost, TourCost::Finite(0));
    assert_eq!(result.warnings, vec![EngineIssue::InputEmpty.to_string()]);
}

#[test]
fn test_lower_priority_cluster_goes_first() {
    // A 优先级 3, B 优先级 1, 默认权重 10, 序列惩罚 25
    let m = membership();
    let rules = TransitionRuleSet::new();
    let items = vec![kit("A1", 3), kit("B1", 1)];
    let result = orchestrator().optimize(items, &SequenceRequest::new(&m, &rules));

    assert!(result.is_optimized());
    assert_eq!(result.cluster_sequence, names(&["B", "A"]));
    assert_eq!(result.cost, TourCost::Finite(35));
    assert_eq!(codes(&result), vec!["B1", "A1"]);
    assert_eq!(result.alternatives.len(), 1);
    assert_eq!(result.ordered_items[0].cluster.as_deref(), Some("B"));
    assert!(!result.run_id.is_empty());
}

#[test]
fn test_explicit_start_is_honoured() {
    let m = membership();
    let rules = TransitionRuleSet::new();
    let items = vec![kit("A1", 3), kit("B1", 1)];
    let request = SequenceRequest::new(&m, &rules).with_start_cluster("A");
    let result = orchestrator().optimize(items, &request);

    assert_eq!(result.cluster_sequence, names(&["A", "B"]));
    assert_eq!(result.cost, TourCost::Finite(1));
    for alt in &result.alternatives {
        assert_eq!(alt.clusters[0], "A");
    }
}

#[test]
fn test_first_item_drives_start_cluster() {
    let m = membership();
    let rules = TransitionRuleSet::new();
    let items = vec![kit("B1", 1), kit("A2", 5), kit("A1", 5)];
    let request = SequenceRequest::new(&m, &rules).with_first_item(" A1 ");
    let result = orchestrator().optimize(items, &request);

    assert_eq!(result.cluster_sequence, names(&["A", "B"]));
    assert_eq!(codes(&result), vec!["A1", "A2", "B1"]);
    assert_eq!(result.cost, TourCost::Finite(1));
}

#[test]
fn test_first_item_overrides_explicit_start_and_recosts() {
    let m = membership();
    let rules = TransitionRuleSet::new();
    let items = vec![kit("A1", 1), kit("B1", 2)];
    let request = SequenceRequest::new(&m, &rules)
        .with_start_cluster("A")
        .with_first_item("B1");
    let result = orchestrator().optimize(items, &request);

    // 求解路径 A → B（35），首色前移后实际路径 B → A（1）
    assert_eq!(result.alternatives[0].clusters, names(&["A", "B"]));
    assert_eq!(result.alternatives[0].cost, 35);
    assert_eq!(result.cluster_sequence, names(&["B", "A"]));
    assert_eq!(result.cost, TourCost::Finite(1));
    assert_eq!(codes(&result)[0], "B1");
}

#[test]
fn test_missing_fixed_type_costs_penalty() {
    let m = membership();
    let mut rules = TransitionRuleSet::new();
    rules.insert("A", "B", TransitionRule::with_weight(10).require_type(ItemType::Fixed));
    let items = vec![kit("A1", 1), kit("B1", 1)];
    let result = orchestrator().optimize(items, &SequenceRequest::new(&m, &rules));

    assert_eq!(result.cluster_sequence, names(&["A", "B"]));
    assert_eq!(result.cost, TourCost::Finite(110));
}

#[test]
fn test_unresolved_items_are_kept_last() {
    let m = membership();
    let rules = TransitionRuleSet::new();
    let items = vec![kit("ZZ9", 0), kit("A1", 1), kit("B1", 2)];
    let result = orchestrator().optimize(items, &SequenceRequest::new(&m, &rules));

    assert_eq!(codes(&result), vec!["A1", "B1", "ZZ9"]);
    assert_eq!(result.unresolved_codes, vec!["ZZ9"]);
    assert!(result.ordered_items[2].cluster.is_none());
    assert!(!result.fallback);
    assert_eq!(result.warnings.len(), 1);
}

// ==========================================
// 降级场景
// ==========================================

fn blocked_rules() -> TransitionRuleSet {
    let mut rules = TransitionRuleSet::new();
    rules.insert("A", "B", TransitionRule::with_weight(10).require_codes(["B9"]));
    rules
}

#[test]
fn test_explicit_start_without_path_falls_back() {
    let m = membership();
    let rules = blocked_rules();
    let items = vec![kit("B2", 5), kit("A1", 0), kit("B1", 5)];
    let request = SequenceRequest::new(&m, &rules).with_start_cluster("A");
    let result = orchestrator().optimize(items, &request);

    assert!(result.fallback);
    assert!(!result.is_optimized());
    assert_eq!(result.cost, TourCost::Infeasible);
    assert!(result.cluster_sequence.is_empty());
    assert_eq!(codes(&result), vec!["A1", "B2", "B1"]);
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_implicit_start_without_path_retries_free() {
    let m = membership();
    let rules = blocked_rules();
    let items = vec![kit("A1", 0), kit("B1", 5)];
    let result = orchestrator().optimize(items, &SequenceRequest::new(&m, &rules));

    assert!(!result.fallback);
    assert_eq!(result.cluster_sequence, names(&["B", "A"]));
    assert_eq!(result.cost, TourCost::Finite(1));
}

#[test]
fn test_too_many_clusters_falls_back() {
    let m = membership();
    let rules = TransitionRuleSet::new();
    let config = CostModelConfig {
        max_clusters: 2,
        ..CostModelConfig::default()
    };
    let items = vec![kit("C1", 0), kit("A1", 1), kit("B1", 2)];
    let result = SequenceOrchestrator::new(config).optimize(items, &SequenceRequest::new(&m, &rules));

    assert!(result.fallback);
    assert_eq!(codes(&result), vec!["C1", "A1", "B1"]);
    assert!(result
        .warnings
        .contains(&EngineIssue::TooManyClusters { count: 3, max: 2 }.to_string()));
}

#[test]
fn test_all_unresolved_keeps_arrival_order() {
    let m = membership();
    let rules = TransitionRuleSet::new();
    let items = vec![kit("X2", 0), kit("X1", 0)];
    let result = orchestrator().optimize(items, &SequenceRequest::new(&m, &rules));

    assert!(result.fallback);
    assert_eq!(codes(&result), vec!["X2", "X1"]);
    assert_eq!(result.unresolved_codes, vec!["X2", "X1"]);
}

// ==========================================
// 性质
// ==========================================

#[test]
fn test_output_is_permutation_with_contiguous_codes() {
    let m = membership();
    let rules = TransitionRuleSet::new();
    let items = vec![
        ColorItem::new("A1", ItemType::Aesthetic).with_sequence(4),
        ColorItem::new("B1", ItemType::UrgentRestock).with_sequence(2),
        ColorItem::new("A2", ItemType::Fixed).with_sequence(4),
        ColorItem::new("A1", ItemType::Kit).with_sequence(1),
        ColorItem::new("C1", ItemType::NonUrgentRestock).with_sequence(3),
        ColorItem::new("B1", ItemType::Fixed).with_sequence(9),
        ColorItem::new("B2", ItemType::Kit),
    ];
    let result = orchestrator().optimize(items.clone(), &SequenceRequest::new(&m, &rules));

    assert_eq!(result.ordered_items.len(), items.len());
    for item in &items {
        let found = result
            .ordered_items
            .iter()
            .filter(|o| o.code == item.code && o.item_type == item.item_type)
            .count();
        assert_eq!(found, 1, "{}", item.label());
    }

    let out: Vec<&str> = codes(&result);
    let mut closed: Vec<&str> = Vec::new();
    for (i, code) in out.iter().enumerate() {
        if i > 0 && out[i - 1] == *code {
            continue;
        }
        assert!(!closed.contains(code), "{:?}", out);
        closed.push(code);
    }
}
