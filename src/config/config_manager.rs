// ==========================================
// 喷涂线颜色排序系统 - 配置管理器
// ==========================================
// 职责: 成本模型参数的加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::cost_config_trait::CostModelReader;
use crate::config::cost_model::CostModelConfig;
use crate::db::{ensure_schema, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

type BoxError = Box<dyn Error + Send + Sync>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, BoxError> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, BoxError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            ensure_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, BoxError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global 配置（UPSERT）
    ///
    /// # 参数
    /// - key: 配置键（必须是 config_keys 中的已知键）
    /// - value: 配置值（写入前按目标类型校验）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), BoxError> {
        let value = value.trim();
        validate_value(key, value)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, BoxError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取数值配置；不存在或格式错误时使用默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, BoxError>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(raw) => raw,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

/// 写入前的键/值校验
fn validate_value(key: &str, value: &str) -> Result<(), BoxError> {
    if !config_keys::ALL.contains(&key) {
        return Err(format!("未知配置键: {}", key).into());
    }
    let parsed = match key {
        config_keys::TOP_N | config_keys::MAX_CLUSTERS => value.parse::<usize>().is_ok(),
        _ => value.parse::<i64>().is_ok(),
    };
    if !parsed {
        return Err(format!("配置值格式错误: {} = {}", key, value).into());
    }
    Ok(())
}

// ==========================================
// CostModelReader Trait 实现
// ==========================================
#[async_trait]
impl CostModelReader for ConfigManager {
    async fn load_cost_model(&self) -> Result<CostModelConfig, BoxError> {
        let d = CostModelConfig::default();
        let w = &d.type_weights;

        let mut config = CostModelConfig {
            priority_restock_bonus: self
                .get_parsed_or_default(config_keys::PRIORITY_RESTOCK_BONUS, d.priority_restock_bonus)?,
            urgent_restock_bonus: self
                .get_parsed_or_default(config_keys::URGENT_RESTOCK_BONUS, d.urgent_restock_bonus)?,
            non_urgent_restock_bonus: self.get_parsed_or_default(
                config_keys::NON_URGENT_RESTOCK_BONUS,
                d.non_urgent_restock_bonus,
            )?,
            sequence_priority_bonus: self
                .get_parsed_or_default(config_keys::SEQUENCE_PRIORITY_BONUS, d.sequence_priority_bonus)?,
            sequence_priority_penalty: self.get_parsed_or_default(
                config_keys::SEQUENCE_PRIORITY_PENALTY,
                d.sequence_priority_penalty,
            )?,
            sequence_priority_threshold: self.get_parsed_or_default(
                config_keys::SEQUENCE_PRIORITY_THRESHOLD,
                d.sequence_priority_threshold,
            )?,
            unsatisfied_fixed_penalty: self.get_parsed_or_default(
                config_keys::UNSATISFIED_FIXED_PENALTY,
                d.unsatisfied_fixed_penalty,
            )?,
            default_transition_weight: self.get_parsed_or_default(
                config_keys::DEFAULT_TRANSITION_WEIGHT,
                d.default_transition_weight,
            )?,
            same_cluster_cost: self
                .get_parsed_or_default(config_keys::SAME_CLUSTER_COST, d.same_cluster_cost)?,
            infinite_cost: self.get_parsed_or_default(config_keys::INFINITE_COST, d.infinite_cost)?,
            top_n: self.get_parsed_or_default(config_keys::TOP_N, d.top_n)?,
            empty_cluster_priority: self
                .get_parsed_or_default(config_keys::EMPTY_CLUSTER_PRIORITY, d.empty_cluster_priority)?,
            max_clusters: self.get_parsed_or_default(config_keys::MAX_CLUSTERS, d.max_clusters)?,
            ..CostModelConfig::default()
        };

        config.type_weights.urgent_restock =
            self.get_parsed_or_default(config_keys::WEIGHT_URGENT_RESTOCK, w.urgent_restock)?;
        config.type_weights.non_urgent_restock = self
            .get_parsed_or_default(config_keys::WEIGHT_NON_URGENT_RESTOCK, w.non_urgent_restock)?;
        config.type_weights.fixed = self.get_parsed_or_default(config_keys::WEIGHT_FIXED, w.fixed)?;
        config.type_weights.kit = self.get_parsed_or_default(config_keys::WEIGHT_KIT, w.kit)?;
        config.type_weights.aesthetic =
            self.get_parsed_or_default(config_keys::WEIGHT_AESTHETIC, w.aesthetic)?;
        config.type_weights.other = self.get_parsed_or_default(config_keys::WEIGHT_OTHER, w.other)?;

        if let Err(problems) = config.validate() {
            tracing::warn!(problems = ?problems, "成本模型配置不一致，回退默认值");
            return Ok(CostModelConfig::default());
        }

        Ok(config)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 类型权重
    pub const WEIGHT_URGENT_RESTOCK: &str = "type_weight_r";
    pub const WEIGHT_NON_URGENT_RESTOCK: &str = "type_weight_re";
    pub const WEIGHT_FIXED: &str = "type_weight_f";
    pub const WEIGHT_KIT: &str = "type_weight_k";
    pub const WEIGHT_AESTHETIC: &str = "type_weight_e";
    pub const WEIGHT_OTHER: &str = "type_weight_other";

    // 补货奖励
    pub const PRIORITY_RESTOCK_BONUS: &str = "priority_restock_bonus";
    pub const URGENT_RESTOCK_BONUS: &str = "urgent_restock_bonus";
    pub const NON_URGENT_RESTOCK_BONUS: &str = "non_urgent_restock_bonus";

    // 序列优先级
    pub const SEQUENCE_PRIORITY_BONUS: &str = "sequence_priority_bonus";
    pub const SEQUENCE_PRIORITY_PENALTY: &str = "sequence_priority_penalty";
    pub const SEQUENCE_PRIORITY_THRESHOLD: &str = "sequence_priority_threshold";

    // 转换成本
    pub const UNSATISFIED_FIXED_PENALTY: &str = "unsatisfied_fixed_penalty";
    pub const DEFAULT_TRANSITION_WEIGHT: &str = "default_transition_weight";
    pub const SAME_CLUSTER_COST: &str = "same_cluster_cost";
    pub const INFINITE_COST: &str = "infinite_cost";

    // 求解器
    pub const TOP_N: &str = "top_n";
    pub const EMPTY_CLUSTER_PRIORITY: &str = "empty_cluster_priority";
    pub const MAX_CLUSTERS: &str = "max_clusters";

    pub const ALL: &[&str] = &[
        WEIGHT_URGENT_RESTOCK,
        WEIGHT_NON_URGENT_RESTOCK,
        WEIGHT_FIXED,
        WEIGHT_KIT,
        WEIGHT_AESTHETIC,
        WEIGHT_OTHER,
        PRIORITY_RESTOCK_BONUS,
        URGENT_RESTOCK_BONUS,
        NON_URGENT_RESTOCK_BONUS,
        SEQUENCE_PRIORITY_BONUS,
        SEQUENCE_PRIORITY_PENALTY,
        SEQUENCE_PRIORITY_THRESHOLD,
        UNSATISFIED_FIXED_PENALTY,
        DEFAULT_TRANSITION_WEIGHT,
        SAME_CLUSTER_COST,
        INFINITE_COST,
        TOP_N,
        EMPTY_CLUSTER_PRIORITY,
        MAX_CLUSTERS,
    ];
}
