// ==========================================
// 喷涂线颜色排序系统 - 换色组与转换规则
// ==========================================
// ClusterMembership: 换色组 → 成员产品代码（每个代码至多属于一个组）
// TransitionRuleSet: (源组, 目标组) → {基础权重, 目标必需代码, 目标必需类型}
// 缺省规则: 使用配置的默认权重，无约束
// ==========================================

use crate::domain::types::ItemType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ==========================================
// ClusterMembership - 换色组成员映射
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ClusterMembership {
    clusters: BTreeMap<String, BTreeSet<String>>,
    code_index: HashMap<String, String>,
}

impl ClusterMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记成员
    ///
    /// # 返回
    /// - Ok(()): 登记成功（重复登记同一组视为幂等）
    /// - Err(String): 该代码已属于另一个组（违反"至多一个组"约束）
    pub fn insert(&mut self, cluster: &str, code: &str) -> Result<(), String> {
        let code = code.trim();
        if let Some(existing) = self.code_index.get(code) {
            if existing != cluster {
                return Err(existing.clone());
            }
            return Ok(());
        }
        self.clusters
            .entry(cluster.to_string())
            .or_default()
            .insert(code.to_string());
        self.code_index.insert(code.to_string(), cluster.to_string());
        Ok(())
    }

    /// 从 (组, 代码) 序列构建
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut membership = Self::new();
        for (cluster, code) in pairs {
            membership.insert(cluster, code).map_err(|existing| {
                format!(
                    "代码 {} 同时属于换色组 {} 与 {}",
                    code.trim(),
                    existing,
                    cluster
                )
            })?;
        }
        Ok(membership)
    }

    /// 查找产品代码所属换色组
    pub fn cluster_of(&self, code: &str) -> Option<&str> {
        self.code_index.get(code.trim()).map(|s| s.as_str())
    }

    pub fn members(&self, cluster: &str) -> Option<&BTreeSet<String>> {
        self.clusters.get(cluster)
    }

    pub fn cluster_names(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }
}

// ==========================================
// TransitionRule - 换色转换规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    /// 基础权重（≥0）
    pub weight: i64,

    /// 目标组内至少需要出现其一的产品代码（空 = 不约束）
    #[serde(default)]
    pub required_codes: BTreeSet<String>,

    /// 目标组内至少需要出现的颜色类型
    #[serde(default)]
    pub required_type: Option<ItemType>,
}

impl TransitionRule {
    pub fn with_weight(weight: i64) -> Self {
        Self {
            weight,
            required_codes: BTreeSet::new(),
            required_type: None,
        }
    }

    pub fn require_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn require_type(mut self, item_type: ItemType) -> Self {
        self.required_type = Some(item_type);
        self
    }
}

// ==========================================
// TransitionRuleSet - 规则集合
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct TransitionRuleSet {
    rules: HashMap<(String, String), TransitionRule>,
}

impl TransitionRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: &str, target: &str, rule: TransitionRule) {
        self.rules
            .insert((source.to_string(), target.to_string()), rule);
    }

    pub fn get(&self, source: &str, target: &str) -> Option<&TransitionRule> {
        self.rules.get(&(source.to_string(), target.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
