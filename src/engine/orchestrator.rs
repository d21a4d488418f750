// ==========================================
// 喷涂线颜色排序系统 - 排序流水线编排
// ==========================================
// 职责: 串联 换色组解析 → 成本矩阵 → 路径求解 → 组内排序，
//       生成 OptimizationResult（含候选路径与诊断信息）
// 红线: 任何失败路径都返回尽力而为的结果 + 诊断，不返回 Err
// 红线: 无 I/O；规则与成员映射由调用方提供
// ==========================================

use crate::config::cost_model::CostModelConfig;
use crate::domain::cluster::{ClusterMembership, TransitionRuleSet};
use crate::domain::item::ColorItem;
use crate::domain::result::{OptimizationResult, RankedTour, TourCost};
use crate::engine::cluster_resolver::{ClusterResolver, ResolvedClusters};
use crate::engine::color_sequencer::ColorSequencer;
use crate::engine::cost_matrix::CostMatrixBuilder;
use crate::engine::error::EngineIssue;
use crate::engine::path_solver::HeldKarpSolver;
use crate::i18n::{t, t_with_args};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

// ==========================================
// SequenceRequest - 单次排序的外部输入
// ==========================================
#[derive(Debug, Clone)]
pub struct SequenceRequest<'a> {
    pub membership: &'a ClusterMembership,
    pub rules: &'a TransitionRuleSet,

    /// 强制起点换色组
    pub start_cluster: Option<String>,

    /// 首色代码
    pub first_item: Option<String>,

    /// 优先补货代码
    pub priority_codes: Vec<String>,
}

impl<'a> SequenceRequest<'a> {
    pub fn new(membership: &'a ClusterMembership, rules: &'a TransitionRuleSet) -> Self {
        Self {
            membership,
            rules,
            start_cluster: None,
            first_item: None,
            priority_codes: Vec::new(),
        }
    }

    pub fn with_start_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.start_cluster = Some(cluster.into());
        self
    }

    pub fn with_first_item(mut self, code: impl Into<String>) -> Self {
        self.first_item = Some(code.into());
        self
    }

    pub fn with_priority_codes(mut self, codes: Vec<String>) -> Self {
        self.priority_codes = codes;
        self
    }

    fn explicit_start(&self) -> Option<&str> {
        self.start_cluster
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn first_code(&self) -> Option<&str> {
        self.first_item
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// 起点来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartSource {
    Explicit,
    FirstItem,
    LowestPriority,
}

/// 降级原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackReason {
    NoClusters,
    TooManyClusters,
    NoFeasiblePath,
}

// ==========================================
// SequenceOrchestrator
// ==========================================
pub struct SequenceOrchestrator {
    config: CostModelConfig,
}

impl SequenceOrchestrator {
    pub fn new(config: CostModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CostModelConfig {
        &self.config
    }

    /// 执行完整排序流水线
    ///
    /// # 参数
    /// - items: 当日颜色项（到达顺序）
    /// - request: 成员映射、转换规则与可选约束
    ///
    /// # 返回
    /// OptimizationResult（无可行路径时 fallback = true，cost = Infeasible）
    pub fn optimize(&self, mut items: Vec<ColorItem>, request: &SequenceRequest<'_>) -> OptimizationResult {
        let run_id = Uuid::new_v4().to_string();
        let cfg = &self.config;

        info!(
            run_id = %run_id,
            items = items.len(),
            start = ?request.explicit_start(),
            first_item = ?request.first_code(),
            priority_codes = request.priority_codes.len(),
            "开始颜色排序"
        );

        if items.is_empty() {
            warn!(run_id = %run_id, "输入为空");
            return OptimizationResult {
                run_id,
                ordered_items: Vec::new(),
                cluster_sequence: Vec::new(),
                cost: TourCost::Finite(0),
                alternatives: Vec::new(),
                unresolved_codes: Vec::new(),
                fallback: false,
                warnings: vec![EngineIssue::InputEmpty.to_string()],
                message: t("sequencing.empty_input"),
                generated_at: Utc::now(),
            };
        }

        let explicit_start = request.explicit_start();
        let first_code = request.first_code();

        // 1) 换色组解析
        let resolved = ClusterResolver::new(cfg.empty_cluster_priority).resolve(
            &mut items,
            request.membership,
            explicit_start,
        );
        let mut issues = resolved.issues.clone();
        let unresolved_codes = resolved.unresolved_codes(&items);

        if resolved.order.is_empty() {
            return self.fallback(run_id, items, &resolved, issues, unresolved_codes, FallbackReason::NoClusters, None);
        }
        if resolved.order.len() > cfg.max_clusters {
            warn!(run_id = %run_id, clusters = resolved.order.len(), max = cfg.max_clusters, "换色组数量超限");
            issues.push(EngineIssue::TooManyClusters {
                count: resolved.order.len(),
                max: cfg.max_clusters,
            });
            return self.fallback(run_id, items, &resolved, issues, unresolved_codes, FallbackReason::TooManyClusters, None);
        }

        // 2) 成本矩阵
        let matrix = CostMatrixBuilder::new(cfg).build(
            &resolved,
            &items,
            request.rules,
            &request.priority_codes,
        );

        // 3) 路径求解
        let (start_name, start_source) = effective_start(explicit_start, first_code, &items, &resolved);
        let start_idx = start_name.as_deref().and_then(|name| matrix.index_of(name));
        let solver = HeldKarpSolver::new(cfg.top_n, cfg.max_clusters);

        let mut outcome = solver.solve(&matrix, start_idx);
        if outcome.tours.is_empty() && start_idx.is_some() && start_source != StartSource::Explicit {
            warn!(
                run_id = %run_id,
                start = ?start_name,
                source = ?start_source,
                "推断起点无可行路径，改为自由起点重新求解"
            );
            issues.append(&mut outcome.issues);
            outcome = solver.solve(&matrix, None);
        }
        issues.extend(outcome.issues.iter().cloned());

        let Some(best) = outcome.best().cloned() else {
            let shown_start = match start_source {
                StartSource::Explicit => start_name,
                _ => None,
            };
            return self.fallback(run_id, items, &resolved, issues, unresolved_codes, FallbackReason::NoFeasiblePath, shown_start);
        };
        let best_names = matrix.names_of(&best.order);
        let forced_start = match start_source {
            StartSource::Explicit if start_idx.is_some() => start_name.clone(),
            _ => None,
        };

        // 4) 组内排序
        let sequenced = ColorSequencer::new(&cfg.type_weights).sequence(&best_names, &items, first_code);
        issues.extend(sequenced.issues.iter().cloned());

        let cost = if sequenced.tour == best_names {
            TourCost::Finite(best.cost)
        } else {
            let moved = matrix
                .tour_cost_by_names(&sequenced.tour)
                .unwrap_or(TourCost::Infeasible);
            if !moved.is_feasible() {
                warn!(run_id = %run_id, tour = ?sequenced.tour, "首色前移后的路径包含被禁止的转换");
            }
            moved
        };

        let alternatives: Vec<RankedTour> = outcome
            .tours
            .iter()
            .map(|tour| RankedTour {
                clusters: matrix.names_of(&tour.order),
                cost: tour.cost,
            })
            .collect();

        let message = describe_success(
            &sequenced.tour,
            cost,
            &alternatives,
            forced_start.as_deref(),
            first_code.filter(|_| sequenced.first_item_applied),
            &request.priority_codes,
            &unresolved_codes,
        );

        info!(
            run_id = %run_id,
            tour = ?sequenced.tour,
            cost = %cost,
            alternatives = alternatives.len(),
            "颜色排序完成"
        );

        OptimizationResult {
            run_id,
            ordered_items: sequenced.items,
            cluster_sequence: sequenced.tour,
            cost,
            alternatives,
            unresolved_codes,
            fallback: false,
            warnings: issues.iter().map(|i| i.to_string()).collect(),
            message,
            generated_at: Utc::now(),
        }
    }

    /// 降级: 按换色组顺序分组（组内保持到达顺序），未解析项置后
    #[allow(clippy::too_many_arguments)]
    fn fallback(
        &self,
        run_id: String,
        items: Vec<ColorItem>,
        resolved: &ResolvedClusters,
        issues: Vec<EngineIssue>,
        unresolved_codes: Vec<String>,
        reason: FallbackReason,
        start: Option<String>,
    ) -> OptimizationResult {
        let mut order: Vec<usize> = Vec::with_capacity(items.len());
        for cluster in &resolved.order {
            if let Some(indices) = resolved.members.get(cluster) {
                order.extend(indices.iter().copied());
            }
        }
        order.extend(resolved.unresolved.iter().copied());

        let message = match reason {
            FallbackReason::NoClusters => t("sequencing.fallback_no_clusters"),
            FallbackReason::TooManyClusters => t_with_args(
                "sequencing.fallback_too_many",
                &[
                    ("count", &resolved.order.len().to_string()),
                    ("max", &self.config.max_clusters.to_string()),
                ],
            ),
            FallbackReason::NoFeasiblePath => match &start {
                Some(s) => t_with_args("sequencing.fallback_no_path_from", &[("cluster", s)]),
                None => t("sequencing.fallback_no_path"),
            },
        };

        warn!(run_id = %run_id, reason = ?reason, items = items.len(), "降级为按换色组分组");

        OptimizationResult {
            run_id,
            ordered_items: order.into_iter().map(|i| items[i].clone()).collect(),
            cluster_sequence: Vec::new(),
            cost: TourCost::Infeasible,
            alternatives: Vec::new(),
            unresolved_codes,
            fallback: true,
            warnings: issues.iter().map(|i| i.to_string()).collect(),
            message,
            generated_at: Utc::now(),
        }
    }
}

/// 起点推断: 显式起点 > 首色所在换色组 > (优先级, 名称) 最小的换色组
fn effective_start(
    explicit: Option<&str>,
    first_code: Option<&str>,
    items: &[ColorItem],
    resolved: &ResolvedClusters,
) -> (Option<String>, StartSource) {
    if let Some(start) = explicit {
        return (Some(start.to_string()), StartSource::Explicit);
    }
    if let Some(code) = first_code {
        let cluster = items
            .iter()
            .find(|it| it.code.trim() == code)
            .and_then(|it| it.cluster.clone());
        if cluster.is_some() {
            return (cluster, StartSource::FirstItem);
        }
    }
    (
        resolved.lowest_priority_cluster().map(str::to_string),
        StartSource::LowestPriority,
    )
}

/// 成功时的诊断摘要
fn describe_success(
    tour: &[String],
    cost: TourCost,
    alternatives: &[RankedTour],
    forced_start: Option<&str>,
    first_code: Option<&str>,
    priority_codes: &[String],
    unresolved_codes: &[String],
) -> String {
    let mut lines = vec![t_with_args(
        "sequencing.optimized",
        &[("tour", &tour.join(" -> ")), ("cost", &cost.to_string())],
    )];

    if alternatives.len() > 1 {
        lines.push(t("sequencing.alternatives_header"));
        for (rank, alt) in alternatives.iter().enumerate() {
            lines.push(t_with_args(
                "sequencing.alternative",
                &[
                    ("rank", &(rank + 1).to_string()),
                    ("tour", &alt.clusters.join(" -> ")),
                    ("cost", &alt.cost.to_string()),
                ],
            ));
        }
    }

    if let Some(start) = forced_start {
        lines.push(t_with_args("sequencing.forced_start", &[("cluster", start)]));
    }
    if let Some(code) = first_code {
        lines.push(t_with_args("sequencing.first_item", &[("code", code)]));
    }
    if !priority_codes.is_empty() {
        lines.push(t_with_args(
            "sequencing.priority_codes",
            &[("codes", &priority_codes.join(", "))],
        ));
    }
    if !unresolved_codes.is_empty() {
        lines.push(t_with_args(
            "sequencing.unresolved",
            &[
                ("count", &unresolved_codes.len().to_string()),
                ("codes", &unresolved_codes.join(", ")),
            ],
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests;
