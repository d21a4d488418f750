// ==========================================
// 喷涂线颜色排序系统 - 最优换色路径求解 (Held-Karp)
// ==========================================
// 职责: 在成本矩阵上求最小成本的开放哈密顿路径（不回到起点），
//       可选固定起点，返回前 N 条不同的最优路径
// 输入: CostMatrix + 可选起点下标
// 输出: 按 (成本, 终点下标) 升序的候选路径
// 红线: DP 表只属于单次求解调用，调用结束即丢弃，不得跨调用共享
// 红线: 只有经过被禁止的边 (≥ INFINITE) 的路径才视为不可行
// ==========================================

use crate::config::cost_model::MAX_CLUSTERS_CEILING;
use crate::engine::cost_matrix::CostMatrix;
use crate::engine::error::EngineIssue;

#[cfg(test)]
mod tests;

// ==========================================
// SolvedTour - 一条候选路径
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedTour {
    /// 换色组下标序列（矩阵下标）
    pub order: Vec<usize>,
    pub cost: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SolveOutcome {
    /// 候选路径，成本非降序，无重复
    pub tours: Vec<SolvedTour>,
    pub issues: Vec<EngineIssue>,
}

impl SolveOutcome {
    pub fn best(&self) -> Option<&SolvedTour> {
        self.tours.first()
    }
}

// ==========================================
// SolveContext - 单次求解的 DP 表
// ==========================================
// table[mask * n + last] = 访问恰好 mask 中的换色组、止于 last 的最小成本
// UNREACHABLE 表示不可达（每格 8 字节，20 组约 168 MB）
const UNREACHABLE: i64 = i64::MAX;

struct SolveContext<'m> {
    matrix: &'m CostMatrix,
    n: usize,
    start: Option<usize>,
    table: Vec<i64>,
}

impl<'m> SolveContext<'m> {
    fn new(matrix: &'m CostMatrix, start: Option<usize>) -> Self {
        let n = matrix.len();
        Self {
            matrix,
            n,
            start,
            table: vec![UNREACHABLE; (1usize << n) * n],
        }
    }

    #[inline]
    fn cell(&self, mask: usize, last: usize) -> Option<i64> {
        let value = self.table[mask * self.n + last];
        (value != UNREACHABLE).then_some(value)
    }

    /// 自底向上填表（mask 递增，子集总在超集之前完成）
    fn fill(&mut self) {
        let n = self.n;
        for mask in 1usize..(1 << n) {
            for last in 0..n {
                if mask & (1 << last) == 0 {
                    continue;
                }
                let value = if mask == 1 << last {
                    match self.start {
                        Some(s) if s != last => None,
                        _ => Some(0),
                    }
                } else {
                    self.best_predecessor(mask, last).map(|(cost, _)| cost)
                };
                self.table[mask * n + last] = value.unwrap_or(UNREACHABLE);
            }
        }
    }

    /// 在 mask \ {last} 中选择最佳前驱
    ///
    /// 同成本时下标最小者胜出
    fn best_predecessor(&self, mask: usize, last: usize) -> Option<(i64, usize)> {
        let prev_mask = mask ^ (1 << last);
        let mut best: Option<(i64, usize)> = None;
        for k in 0..self.n {
            if prev_mask & (1 << k) == 0 || self.matrix.is_forbidden(k, last) {
                continue;
            }
            let Some(before) = self.cell(prev_mask, k) else {
                continue;
            };
            let total = before.saturating_add(self.matrix.get(k, last));
            if total == UNREACHABLE {
                continue;
            }
            match best {
                Some((cost, _)) if cost <= total => {}
                _ => best = Some((total, k)),
            }
        }
        best
    }

    /// 从 (全集, end) 回溯路径
    fn reconstruct(&self, end: usize) -> Result<Vec<usize>, EngineIssue> {
        let mut mask = (1usize << self.n) - 1;
        let mut last = end;
        let mut tour = vec![last];

        while mask != 1 << last {
            match self.best_predecessor(mask, last) {
                Some((_, k)) => {
                    mask ^= 1 << last;
                    last = k;
                    tour.push(k);
                }
                None => {
                    return Err(EngineIssue::NoFeasiblePath {
                        reason: format!("回溯中断: 终点 {} 无可行前驱", end),
                    })
                }
            }
        }
        tour.reverse();

        if tour.len() != self.n {
            return Err(EngineIssue::LengthMismatch {
                context: "路径回溯".to_string(),
                expected: self.n,
                actual: tour.len(),
            });
        }
        if let Some(s) = self.start {
            if tour.first() != Some(&s) {
                return Err(EngineIssue::NoFeasiblePath {
                    reason: format!("回溯路径未从固定起点 {} 开始", s),
                });
            }
        }
        Ok(tour)
    }
}

// ==========================================
// HeldKarpSolver
// ==========================================
pub struct HeldKarpSolver {
    top_n: usize,
    max_clusters: usize,
}

impl HeldKarpSolver {
    /// # 参数
    /// - top_n: 返回的候选路径数量上限
    /// - max_clusters: 可接受的最大换色组数量（状态空间 2^N·N，不超过 MAX_CLUSTERS_CEILING）
    pub fn new(top_n: usize, max_clusters: usize) -> Self {
        Self {
            top_n,
            max_clusters: max_clusters.min(MAX_CLUSTERS_CEILING),
        }
    }

    /// 求解前 N 条最优开放路径
    ///
    /// # 参数
    /// - matrix: 成本矩阵
    /// - start: 固定起点下标（None 表示任意起点）
    ///
    /// # 返回
    /// - tours 为空: 无可行路径（或换色组数为 0 / 超限），由调用方降级处理
    pub fn solve(&self, matrix: &CostMatrix, start: Option<usize>) -> SolveOutcome {
        let n = matrix.len();
        let mut outcome = SolveOutcome::default();

        if n == 0 || self.top_n == 0 {
            return outcome;
        }
        if n > self.max_clusters {
            tracing::warn!(clusters = n, max = self.max_clusters, "换色组数量超限，跳过求解");
            outcome.issues.push(EngineIssue::TooManyClusters {
                count: n,
                max: self.max_clusters,
            });
            return outcome;
        }
        if let Some(s) = start {
            if s >= n {
                outcome.issues.push(EngineIssue::NoFeasiblePath {
                    reason: format!("固定起点下标越界: {} (共 {} 个换色组)", s, n),
                });
                return outcome;
            }
        }
        if n == 1 {
            outcome.tours.push(SolvedTour {
                order: vec![0],
                cost: 0,
            });
            return outcome;
        }

        tracing::info!(clusters = n, start = ?start, top_n = self.top_n, "开始求解最优换色路径");

        let mut ctx = SolveContext::new(matrix, start);
        ctx.fill();

        let full = (1usize << n) - 1;
        let mut candidates: Vec<(i64, usize)> = (0..n)
            .filter_map(|end| ctx.cell(full, end).map(|cost| (cost, end)))
            .collect();
        candidates.sort();

        if candidates.is_empty() {
            tracing::warn!(clusters = n, start = ?start, "所有终点均不可达");
            outcome.issues.push(EngineIssue::NoFeasiblePath {
                reason: "所有终点的路径成本均不可行".to_string(),
            });
            return outcome;
        }

        for (cost, end) in candidates {
            if outcome.tours.len() >= self.top_n {
                break;
            }
            match ctx.reconstruct(end) {
                Ok(order) => {
                    if outcome.tours.iter().any(|t| t.order == order) {
                        continue;
                    }
                    outcome.tours.push(SolvedTour { order, cost });
                }
                Err(issue) => {
                    tracing::warn!(end = end, issue = %issue, "候选路径回溯失败，已丢弃");
                    outcome.issues.push(issue);
                }
            }
        }

        if outcome.tours.is_empty() {
            outcome.issues.push(EngineIssue::NoFeasiblePath {
                reason: "所有候选路径回溯失败".to_string(),
            });
        } else {
            tracing::info!(
                best_cost = outcome.tours[0].cost,
                candidates = outcome.tours.len(),
                "求解完成"
            );
        }

        outcome
    }
}
