// ==========================================
// 喷涂线颜色排序系统 - 换色组与转换规则维护 API
// ==========================================
// 职责: 换色组成员 / 转换规则的查询与增删改
// 红线: 源换色组创建后不可修改（只能删除重建）
// ==========================================

use crate::api::dto::{ClusterMemberInfo, TransitionRuleInfo};
use crate::api::error::{ApiError, ApiResult};
use crate::config::cost_model::MAX_INFINITE_COST;
use crate::domain::types::ItemType;
use crate::repository::cluster_repo::{ClusterMemberRow, ClusterMembershipRepository};
use crate::repository::transition_rule_repo::{
    parse_required_type, TransitionRuleRepository, TransitionRuleRow,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

impl From<ClusterMemberRow> for ClusterMemberInfo {
    fn from(row: ClusterMemberRow) -> Self {
        Self {
            id: row.id,
            cluster: row.cluster,
            item_code: row.item_code,
        }
    }
}

impl From<TransitionRuleRow> for TransitionRuleInfo {
    fn from(row: TransitionRuleRow) -> Self {
        Self {
            id: Some(row.id),
            source_cluster: row.source_cluster,
            target_cluster: row.target_cluster,
            weight: row.weight,
            required_codes: row.required_codes,
            required_type: row.required_type.map(|t| t.code().to_string()),
        }
    }
}

// ==========================================
// RuleApi
// ==========================================
pub struct RuleApi {
    cluster_repo: Arc<ClusterMembershipRepository>,
    rule_repo: Arc<TransitionRuleRepository>,
}

impl RuleApi {
    pub fn new(
        cluster_repo: Arc<ClusterMembershipRepository>,
        rule_repo: Arc<TransitionRuleRepository>,
    ) -> Self {
        Self {
            cluster_repo,
            rule_repo,
        }
    }

    // ===== 换色组成员 =====

    /// 按换色组分组列出成员
    pub fn list_clusters(&self) -> ApiResult<BTreeMap<String, Vec<ClusterMemberInfo>>> {
        Ok(self
            .cluster_repo
            .list_grouped()?
            .into_iter()
            .map(|(cluster, rows)| (cluster, rows.into_iter().map(Into::into).collect()))
            .collect())
    }

    pub fn cluster_names(&self) -> ApiResult<Vec<String>> {
        Ok(self.cluster_repo.cluster_names()?)
    }

    /// 新增成员
    ///
    /// # 返回
    /// - Err(BusinessRuleViolation): 代码已属于某个换色组
    pub fn add_member(&self, cluster: &str, item_code: &str) -> ApiResult<i64> {
        require_non_blank("cluster", cluster)?;
        require_non_blank("item_code", item_code)?;

        let id = self.cluster_repo.add(cluster, item_code)?;
        info!(id, cluster = cluster.trim(), code = item_code.trim(), "换色组成员已新增");
        Ok(id)
    }

    pub fn update_member(&self, id: i64, item_code: &str) -> ApiResult<()> {
        require_non_blank("item_code", item_code)?;
        self.cluster_repo.update_code(id, item_code)?;
        info!(id, code = item_code.trim(), "换色组成员已修改");
        Ok(())
    }

    pub fn delete_member(&self, id: i64) -> ApiResult<()> {
        self.cluster_repo.delete(id)?;
        info!(id, "换色组成员已删除");
        Ok(())
    }

    // ===== 转换规则 =====

    /// 按源换色组分组列出规则
    pub fn list_rules(&self) -> ApiResult<BTreeMap<String, Vec<TransitionRuleInfo>>> {
        Ok(self
            .rule_repo
            .list_grouped()?
            .into_iter()
            .map(|(source, rows)| (source, rows.into_iter().map(Into::into).collect()))
            .collect())
    }

    pub fn source_clusters(&self) -> ApiResult<Vec<String>> {
        Ok(self.rule_repo.source_clusters()?)
    }

    /// 新增规则
    ///
    /// # 返回
    /// - Err(InvalidInput): 组名为空、权重越界、类型代码未知
    /// - Err(BusinessRuleViolation): (源组, 目标组) 已存在
    pub fn add_rule(&self, rule: &TransitionRuleInfo) -> ApiResult<i64> {
        require_non_blank("source_cluster", &rule.source_cluster)?;
        require_non_blank("target_cluster", &rule.target_cluster)?;
        let required_type = required_type_of(rule)?;

        let id = self.rule_repo.add(
            &rule.source_cluster,
            &rule.target_cluster,
            rule.weight,
            &rule.required_codes,
            required_type,
        )?;
        info!(
            id,
            source = rule.source_cluster.trim(),
            target = rule.target_cluster.trim(),
            weight = rule.weight,
            "转换规则已新增"
        );
        Ok(id)
    }

    /// 修改规则（source_cluster 忽略）
    pub fn update_rule(&self, id: i64, rule: &TransitionRuleInfo) -> ApiResult<()> {
        require_non_blank("target_cluster", &rule.target_cluster)?;
        let required_type = required_type_of(rule)?;

        if let Some(existing) = self.rule_repo.find_by_id(id)? {
            if !rule.source_cluster.trim().is_empty()
                && existing.source_cluster != rule.source_cluster.trim()
            {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "源换色组不可修改: {} → {}",
                    existing.source_cluster,
                    rule.source_cluster.trim()
                )));
            }
        }

        self.rule_repo.update(
            id,
            &rule.target_cluster,
            rule.weight,
            &rule.required_codes,
            required_type,
        )?;
        info!(id, target = rule.target_cluster.trim(), weight = rule.weight, "转换规则已修改");
        Ok(())
    }

    pub fn delete_rule(&self, id: i64) -> ApiResult<()> {
        self.rule_repo.delete(id)?;
        info!(id, "转换规则已删除");
        Ok(())
    }
}

fn require_non_blank(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

fn required_type_of(rule: &TransitionRuleInfo) -> ApiResult<Option<ItemType>> {
    if !(0..=MAX_INFINITE_COST).contains(&rule.weight) {
        return Err(ApiError::InvalidInput(format!(
            "转换权重必须位于 [0, {}]: {}",
            MAX_INFINITE_COST, rule.weight
        )));
    }
    Ok(parse_required_type(rule.required_type.as_deref())?)
}
