use super::*;
use crate::domain::result::TourCost;

const INF: i64 = 9999;

// ==========================================
// 测试辅助函数
// ==========================================

fn make_matrix(rows: &[&[i64]]) -> CostMatrix {
    let n = rows.len();
    let names = (0..n).map(|i| format!("C{}", i)).collect();
    let cells = rows.iter().flat_map(|r| r.iter().copied()).collect();
    CostMatrix::from_rows(names, cells, INF).unwrap()
}

/// 确定性伪随机矩阵（线性同余），约 1/6 的边被禁止
fn pseudo_random_matrix(n: usize, seed: u64) -> CostMatrix {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as i64
    };
    let mut cells = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            if i == j {
                cells.push(1);
            } else if next() % 6 == 0 {
                cells.push(INF);
            } else {
                cells.push(1 + next() % 60);
            }
        }
    }
    let names = (0..n).map(|i| format!("C{}", i)).collect();
    CostMatrix::from_rows(names, cells, INF).unwrap()
}

/// 穷举所有排列求最小成本（校验用）
fn brute_force_min(matrix: &CostMatrix, start: Option<usize>) -> Option<i64> {
    fn permute(
        matrix: &CostMatrix,
        current: &mut Vec<usize>,
        used: &mut Vec<bool>,
        best: &mut Option<i64>,
    ) {
        let n = matrix.len();
        if current.len() == n {
            if let TourCost::Finite(c) = matrix.tour_cost(current) {
                if best.map_or(true, |b| c < b) {
                    *best = Some(c);
                }
            }
            return;
        }
        for k in 0..n {
            if used[k] {
                continue;
            }
            used[k] = true;
            current.push(k);
            permute(matrix, current, used, best);
            current.pop();
            used[k] = false;
        }
    }

    let n = matrix.len();
    let mut best = None;
    let mut used = vec![false; n];
    let mut current = Vec::new();
    if let Some(s) = start {
        used[s] = true;
        current.push(s);
    }
    permute(matrix, &mut current, &mut used, &mut best);
    best
}

// ==========================================
// 退化规模
// ==========================================

#[test]
fn test_empty_matrix_returns_nothing() {
    let m = CostMatrix::from_rows(vec![], vec![], INF).unwrap();
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);
    assert!(outcome.tours.is_empty());
    assert!(outcome.issues.is_empty());
}

#[test]
fn test_single_cluster_is_trivial() {
    let m = make_matrix(&[&[1]]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);
    assert_eq!(outcome.tours, vec![SolvedTour { order: vec![0], cost: 0 }]);

    let outcome = HeldKarpSolver::new(3, 16).solve(&m, Some(0));
    assert_eq!(outcome.tours.len(), 1);
}

#[test]
fn test_start_out_of_range_is_reported() {
    let m = make_matrix(&[&[1]]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, Some(1));
    assert!(outcome.tours.is_empty());
    assert!(matches!(outcome.issues[0], EngineIssue::NoFeasiblePath { .. }));
}

#[test]
fn test_too_many_clusters_is_guarded() {
    let m = pseudo_random_matrix(5, 1);
    let outcome = HeldKarpSolver::new(3, 4).solve(&m, None);
    assert!(outcome.tours.is_empty());
    assert_eq!(
        outcome.issues,
        vec![EngineIssue::TooManyClusters { count: 5, max: 4 }]
    );
}

// ==========================================
// 核心求解
// ==========================================

#[test]
fn test_two_clusters_prefers_cheaper_direction() {
    // 0 → 1 成本 35, 1 → 0 成本 1
    let m = make_matrix(&[&[1, 35], &[1, 1]]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);

    assert_eq!(outcome.best().unwrap().order, vec![1, 0]);
    assert_eq!(outcome.best().unwrap().cost, 1);
    assert_eq!(outcome.tours.len(), 2);
    assert_eq!(outcome.tours[1].order, vec![0, 1]);
}

#[test]
fn test_fixed_start_is_honoured() {
    let m = make_matrix(&[
        &[1, 5, 1],
        &[1, 1, 1],
        &[9, 9, 1],
    ]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, Some(2));

    assert!(!outcome.tours.is_empty());
    for tour in &outcome.tours {
        assert_eq!(tour.order[0], 2);
    }
    // 2 → 0 → 1 = 14, 2 → 1 → 0 = 10
    assert_eq!(outcome.best().unwrap().order, vec![2, 1, 0]);
    assert_eq!(outcome.best().unwrap().cost, 10);
}

#[test]
fn test_forbidden_edges_are_avoided() {
    // 唯一可行路径 0 → 1 → 2
    let m = make_matrix(&[
        &[1, 3, INF],
        &[INF, 1, 4],
        &[INF, INF, 1],
    ]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);

    assert_eq!(outcome.tours.len(), 1);
    assert_eq!(outcome.tours[0], SolvedTour { order: vec![0, 1, 2], cost: 7 });
}

#[test]
fn test_no_feasible_path_reports_issue() {
    let m = make_matrix(&[
        &[1, INF, INF],
        &[INF, 1, INF],
        &[INF, INF, 1],
    ]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);
    assert!(outcome.tours.is_empty());
    assert!(matches!(outcome.issues[0], EngineIssue::NoFeasiblePath { .. }));
}

#[test]
fn test_fixed_start_with_no_outgoing_edge_is_infeasible() {
    let m = make_matrix(&[
        &[1, INF, INF],
        &[2, 1, 2],
        &[2, 2, 1],
    ]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, Some(0));
    assert!(outcome.tours.is_empty());

    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);
    assert!(outcome.tours.iter().all(|t| *t.order.last().unwrap() == 0));
}

#[test]
fn test_costs_above_sentinel_sum_are_still_feasible() {
    // 两条 6000 的边之和超过 INFINITE，但没有被禁止的边
    let m = make_matrix(&[
        &[1, 6000, INF],
        &[INF, 1, 6000],
        &[INF, INF, 1],
    ]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);
    assert_eq!(outcome.best().unwrap().cost, 12000);
}

#[test]
fn test_tie_break_lowest_predecessor_index() {
    // 所有边等价: 终点相同成本时按终点下标排序，回溯时取最小下标前驱
    let m = make_matrix(&[&[1, 5, 5], &[5, 1, 5], &[5, 5, 1]]);
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);

    assert_eq!(outcome.tours.len(), 3);
    assert_eq!(outcome.tours[0].order, vec![2, 1, 0]);
    assert_eq!(outcome.tours[1].order, vec![2, 0, 1]);
    assert_eq!(outcome.tours[2].order, vec![1, 0, 2]);
}

#[test]
fn test_top_n_sorted_and_distinct() {
    for seed in 0..20u64 {
        let m = pseudo_random_matrix(6, seed);
        let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);

        assert!(outcome.tours.len() <= 3);
        for pair in outcome.tours.windows(2) {
            assert!(pair[0].cost <= pair[1].cost);
            assert_ne!(pair[0].order, pair[1].order);
        }
        for tour in &outcome.tours {
            assert_eq!(tour.order.len(), 6);
            assert_eq!(m.tour_cost(&tour.order), TourCost::Finite(tour.cost));
        }
    }
}

// ==========================================
// 穷举校验
// ==========================================

#[test]
fn test_matches_brute_force_without_start() {
    for n in 2..=8usize {
        for seed in 0..6u64 {
            let m = pseudo_random_matrix(n, seed * 31 + n as u64);
            let expected = brute_force_min(&m, None);
            let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);
            assert_eq!(
                outcome.best().map(|t| t.cost),
                expected,
                "n={} seed={}",
                n,
                seed
            );
        }
    }
}

#[test]
fn test_matches_brute_force_with_fixed_start() {
    for n in 2..=7usize {
        for seed in 0..4u64 {
            let m = pseudo_random_matrix(n, seed * 17 + 3);
            for start in 0..n {
                let expected = brute_force_min(&m, Some(start));
                let outcome = HeldKarpSolver::new(3, 16).solve(&m, Some(start));
                assert_eq!(
                    outcome.best().map(|t| t.cost),
                    expected,
                    "n={} seed={} start={}",
                    n,
                    seed,
                    start
                );
                assert!(outcome.tours.iter().all(|t| t.order[0] == start));
            }
        }
    }
}

#[test]
fn test_repeated_solves_do_not_share_state() {
    let m = pseudo_random_matrix(6, 42);
    let solver = HeldKarpSolver::new(3, 16);

    let fixed = solver.solve(&m, Some(3));
    let free = solver.solve(&m, None);
    let fixed_again = solver.solve(&m, Some(3));

    assert_eq!(fixed.tours, fixed_again.tours);
    assert_eq!(free.best().map(|t| t.cost), brute_force_min(&m, None));
}

#[test]
fn test_max_clusters_is_capped_at_ceiling() {
    let m = pseudo_random_matrix(MAX_CLUSTERS_CEILING + 1, 3);
    let outcome = HeldKarpSolver::new(3, 64).solve(&m, None);
    assert!(outcome.tours.is_empty());
    assert_eq!(
        outcome.issues,
        vec![EngineIssue::TooManyClusters {
            count: MAX_CLUSTERS_CEILING + 1,
            max: MAX_CLUSTERS_CEILING
        }]
    );
}

#[test]
fn test_huge_edge_costs_do_not_overflow() {
    // 单边可行，但任意两边之和溢出 → 视为不可达
    let big = i64::MAX - 10;
    let m = CostMatrix::from_rows(
        vec!["A".into(), "B".into(), "C".into()],
        vec![1, big, big, big, 1, big, big, big, 1],
        i64::MAX,
    )
    .unwrap();
    let outcome = HeldKarpSolver::new(3, 16).solve(&m, None);
    assert!(outcome.tours.is_empty());
    assert!(matches!(outcome.issues[0], EngineIssue::NoFeasiblePath { .. }));
}
