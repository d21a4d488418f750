// ==========================================
// 喷涂线颜色排序系统 - 排序 API
// ==========================================
// 职责: 请求校验 → 加载成本模型/成员映射/转换规则 → 调用引擎 → 返回结果
// 接口:
// - optimize: 完整优化（可选强制起点、首色、优先补货代码）
// - optimize_locked: 锁定项约束下的重新优化
// - optimize_cluster_locked: 换色组锁定后重新优化
// - apply_cluster_order: 按换色组顺序重排（不求解）
// - reorder: 按位置排列重排（拖拽）
// 红线: 引擎诊断随结果返回；只有请求非法或存储失败才返回 Err
// ==========================================

use crate::api::dto::{
    ClusterLockRequest, ClusterOrderRequest, ColorItemDto, LockedOptimizeRequest,
    OptimizeRequest, ReorderRequest, ReorderResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::config::cost_config_trait::CostModelReader;
use crate::config::cost_model::CostModelConfig;
use crate::domain::cluster::{ClusterMembership, TransitionRuleSet};
use crate::domain::item::ColorItem;
use crate::domain::result::OptimizationResult;
use crate::engine::manual_ops::{apply_cluster_order, apply_manual_order};
use crate::engine::orchestrator::{SequenceOrchestrator, SequenceRequest};
use crate::engine::reoptimizer::ConstrainedReoptimizer;
use crate::i18n::t_with_args;
use crate::repository::cluster_repo::ClusterMembershipRepository;
use crate::repository::transition_rule_repo::TransitionRuleRepository;
use std::sync::Arc;
use tracing::info;

/// 单次调用所需的全部只读上下文
struct SequencingContext {
    config: CostModelConfig,
    membership: ClusterMembership,
    rules: TransitionRuleSet,
}

// ==========================================
// SequencingApi
// ==========================================
pub struct SequencingApi {
    cluster_repo: Arc<ClusterMembershipRepository>,
    rule_repo: Arc<TransitionRuleRepository>,
    cost_reader: Arc<dyn CostModelReader>,
}

impl SequencingApi {
    pub fn new(
        cluster_repo: Arc<ClusterMembershipRepository>,
        rule_repo: Arc<TransitionRuleRepository>,
        cost_reader: Arc<dyn CostModelReader>,
    ) -> Self {
        Self {
            cluster_repo,
            rule_repo,
            cost_reader,
        }
    }

    /// 完整优化
    ///
    /// # 参数
    /// - request: 颜色项 + 可选强制起点 / 首色 / 优先补货代码
    ///
    /// # 返回
    /// - Ok(OptimizationResult): 含候选路径与诊断（空输入、无可行路径也走这里）
    /// - Err(ApiError::InvalidInput): 颜色项代码为空或类型未知
    pub async fn optimize(&self, request: &OptimizeRequest) -> ApiResult<OptimizationResult> {
        let items = convert_items(&request.items)?;
        let ctx = self.load_context().await?;

        let mut seq_request = SequenceRequest::new(&ctx.membership, &ctx.rules)
            .with_priority_codes(clean_codes(request.priority_codes.as_deref()));
        seq_request.start_cluster = non_blank(request.start_cluster.as_deref());
        seq_request.first_item = non_blank(request.first_item.as_deref());

        let orchestrator = SequenceOrchestrator::new(ctx.config);
        let result = orchestrator.optimize(items, &seq_request);

        info!(
            run_id = %result.run_id,
            items = result.ordered_items.len(),
            cost = %result.cost,
            fallback = result.fallback,
            "优化请求完成"
        );
        Ok(result)
    }

    /// 锁定项约束下的重新优化
    pub async fn optimize_locked(
        &self,
        request: &LockedOptimizeRequest,
    ) -> ApiResult<OptimizationResult> {
        let items = convert_items(&request.items)?;
        let ctx = self.load_context().await?;

        let seq_request = SequenceRequest::new(&ctx.membership, &ctx.rules)
            .with_priority_codes(clean_codes(request.priority_codes.as_deref()));

        let orchestrator = SequenceOrchestrator::new(ctx.config);
        let result = ConstrainedReoptimizer::new(&orchestrator).reoptimize(items, &seq_request);

        info!(
            run_id = %result.run_id,
            locked = result.ordered_items.iter().filter(|i| i.locked).count(),
            cost = %result.cost,
            "锁定重排请求完成"
        );
        Ok(result)
    }

    /// 换色组锁定后重新优化
    pub async fn optimize_cluster_locked(
        &self,
        request: &ClusterLockRequest,
    ) -> ApiResult<OptimizationResult> {
        let items = convert_items(&request.items)?;
        let ctx = self.load_context().await?;

        let seq_request = SequenceRequest::new(&ctx.membership, &ctx.rules)
            .with_priority_codes(clean_codes(request.priority_codes.as_deref()));

        let orchestrator = SequenceOrchestrator::new(ctx.config);
        let result = ConstrainedReoptimizer::new(&orchestrator).reoptimize_with_cluster_locks(
            items,
            &request.cluster_locks,
            &seq_request,
        );

        info!(
            run_id = %result.run_id,
            locked_clusters = request.cluster_locks.values().filter(|v| **v).count(),
            cost = %result.cost,
            "换色组锁定重排请求完成"
        );
        Ok(result)
    }

    /// 按换色组顺序重排
    pub async fn apply_cluster_order(
        &self,
        request: &ClusterOrderRequest,
    ) -> ApiResult<ReorderResponse> {
        let mut items = convert_items(&request.items)?;
        let membership = self.cluster_repo.load_membership()?;

        for item in items.iter_mut() {
            if let Some(cluster) = membership.cluster_of(&item.code) {
                item.cluster = Some(cluster.to_string());
            }
        }

        let ordered = apply_cluster_order(items, &request.cluster_order);
        let message = t_with_args(
            "manual.cluster_order_applied",
            &[("order", &request.cluster_order.join(" → "))],
        );
        Ok(ReorderResponse {
            ordered_items: ordered,
            message,
        })
    }

    /// 按位置排列重排
    ///
    /// # 返回
    /// - Err(ApiError::ManualOrderRejected): 位置数量不符、越界或重复
    pub fn reorder(&self, request: &ReorderRequest) -> ApiResult<ReorderResponse> {
        let items = convert_items(&request.items)?;
        let ordered = apply_manual_order(&items, &request.new_positions)?;
        let message = t_with_args(
            "manual.reordered",
            &[("count", &ordered.len().to_string())],
        );
        Ok(ReorderResponse {
            ordered_items: ordered,
            message,
        })
    }

    async fn load_context(&self) -> ApiResult<SequencingContext> {
        let config = self
            .cost_reader
            .load_cost_model()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let membership = self.cluster_repo.load_membership()?;
        let rules = self.rule_repo.load_rules()?;

        tracing::debug!(
            clusters = membership.len(),
            rules = rules.len(),
            top_n = config.top_n,
            "排序上下文已加载"
        );
        Ok(SequencingContext {
            config,
            membership,
            rules,
        })
    }
}

/// DTO → 领域对象；任一项非法即拒绝整个请求
fn convert_items(dtos: &[ColorItemDto]) -> ApiResult<Vec<ColorItem>> {
    dtos.iter()
        .enumerate()
        .map(|(idx, dto)| {
            dto.to_item()
                .map_err(|msg| ApiError::InvalidInput(format!("第 {} 项: {}", idx + 1, msg)))
        })
        .collect()
}

fn clean_codes(codes: Option<&[String]>) -> Vec<String> {
    codes
        .unwrap_or_default()
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
