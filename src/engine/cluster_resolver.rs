// ==========================================
// 喷涂线颜色排序系统 - 换色组解析
// ==========================================
// 职责: 颜色项 → 换色组；统计当日出现的换色组及其序列优先级
// 输入: 颜色项列表 + 换色组成员映射 + 可选强制起点
// 输出: 按 (优先级, 名称) 排好的换色组顺序 + 未解析项
// 红线: 未解析项保留在列表中（cluster = None）并报出，不得丢弃
// ==========================================

use crate::domain::cluster::ClusterMembership;
use crate::domain::item::ColorItem;
use crate::engine::error::EngineIssue;
use std::collections::{BTreeMap, HashMap};

// ==========================================
// ResolvedClusters - 解析结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ResolvedClusters {
    /// 参与求解的换色组，按 (优先级, 名称) 升序
    pub order: Vec<String>,

    /// 换色组 → 序列优先级（组内最小序列值）
    pub priorities: HashMap<String, i64>,

    /// 换色组 → 组内颜色项下标（按到达顺序）
    pub members: BTreeMap<String, Vec<usize>>,

    /// 未解析颜色项下标（按到达顺序）
    pub unresolved: Vec<usize>,

    pub issues: Vec<EngineIssue>,
}

impl ResolvedClusters {
    pub fn priority_of(&self, cluster: &str) -> Option<i64> {
        self.priorities.get(cluster).copied()
    }

    /// 未解析的产品代码（去重，保持到达顺序）
    pub fn unresolved_codes(&self, items: &[ColorItem]) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for &idx in &self.unresolved {
            let code = &items[idx].code;
            if !codes.contains(code) {
                codes.push(code.clone());
            }
        }
        codes
    }

    /// (优先级, 名称) 最小的换色组
    pub fn lowest_priority_cluster(&self) -> Option<&str> {
        self.order.first().map(|s| s.as_str())
    }
}

// ==========================================
// ClusterResolver
// ==========================================
pub struct ClusterResolver {
    empty_cluster_priority: i64,
}

impl ClusterResolver {
    /// # 参数
    /// - empty_cluster_priority: 当日无颜色项的换色组使用的优先级
    pub fn new(empty_cluster_priority: i64) -> Self {
        Self {
            empty_cluster_priority,
        }
    }

    /// 解析换色组，并把结果写回颜色项的 cluster 字段
    ///
    /// # 参数
    /// - items: 当日颜色项（就地补充 cluster）
    /// - membership: 换色组成员映射
    /// - forced_start: 强制起点（即使当日无颜色项也加入工作集）
    pub fn resolve(
        &self,
        items: &mut [ColorItem],
        membership: &ClusterMembership,
        forced_start: Option<&str>,
    ) -> ResolvedClusters {
        let mut resolved = ResolvedClusters::default();

        for (idx, item) in items.iter_mut().enumerate() {
            match membership.cluster_of(&item.code) {
                Some(cluster) => {
                    item.cluster = Some(cluster.to_string());
                    resolved
                        .members
                        .entry(cluster.to_string())
                        .or_default()
                        .push(idx);
                }
                None => {
                    item.cluster = None;
                    resolved.unresolved.push(idx);
                }
            }
        }

        for code in resolved.unresolved_codes(items) {
            tracing::warn!(code = %code, "颜色项无法解析换色组");
            resolved.issues.push(EngineIssue::UnresolvedItem { code });
        }

        if let Some(start) = forced_start {
            resolved.members.entry(start.to_string()).or_default();
        }

        for (cluster, indices) in &resolved.members {
            let priority = indices
                .iter()
                .map(|&i| i64::from(items[i].effective_sequence()))
                .min()
                .unwrap_or(self.empty_cluster_priority);
            resolved.priorities.insert(cluster.clone(), priority);
        }

        let mut order: Vec<String> = resolved.members.keys().cloned().collect();
        order.sort_by(|a, b| {
            let pa = resolved.priorities.get(a).copied().unwrap_or(self.empty_cluster_priority);
            let pb = resolved.priorities.get(b).copied().unwrap_or(self.empty_cluster_priority);
            pa.cmp(&pb).then_with(|| a.cmp(b))
        });
        resolved.order = order;

        tracing::debug!(
            clusters = resolved.order.len(),
            unresolved = resolved.unresolved.len(),
            order = ?resolved.order,
            "换色组解析完成"
        );

        resolved
    }
}
