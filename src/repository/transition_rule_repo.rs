// ==========================================
// 喷涂线颜色排序系统 - 换色转换规则仓储
// ==========================================
// 表: transition_rule(source_cluster, target_cluster, weight,
//                     required_codes JSON, required_type)
// 加载规则:
// - required_codes 中的字面量 VIETATO 丢弃
// - 非法 JSON 视为空列表（记录告警）
// - required_type 去引号、大写；ALLOW_E / 空 = 不约束
// - 未知类型代码报 FieldValueError，不静默兜底
// ==========================================

use crate::config::cost_model::MAX_INFINITE_COST;
use crate::db::{configure_sqlite_connection, ensure_schema};
use crate::domain::cluster::{TransitionRule, TransitionRuleSet};
use crate::domain::types::ItemType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 历史数据中表示"禁止"的占位代码
const FORBIDDEN_MARKER: &str = "VIETATO";
/// 历史数据中表示"允许外观色/无约束"的类型占位
const ALLOW_ANY_TYPE: &str = "ALLOW_E";

/// transition_rule 表的一行（已规范化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRuleRow {
    pub id: i64,
    pub source_cluster: String,
    pub target_cluster: String,
    pub weight: i64,
    pub required_codes: Vec<String>,
    pub required_type: Option<ItemType>,
}

impl TransitionRuleRow {
    pub fn to_rule(&self) -> TransitionRule {
        let rule = TransitionRule::with_weight(self.weight)
            .require_codes(self.required_codes.iter().cloned());
        match self.required_type {
            Some(t) => rule.require_type(t),
            None => rule,
        }
    }
}

/// 未规范化的原始行
struct RawRuleRow {
    id: i64,
    source_cluster: String,
    target_cluster: String,
    weight: i64,
    required_codes: String,
    required_type: Option<String>,
}

// ==========================================
// TransitionRuleRepository
// ==========================================
pub struct TransitionRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TransitionRuleRepository {
    /// 创建新的仓储实例（建表幂等）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = Connection::open(db_path)?;
        configure_sqlite_connection(&conn)?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 加载规则集合
    pub fn load_rules(&self) -> RepositoryResult<TransitionRuleSet> {
        let mut rules = TransitionRuleSet::new();
        for row in self.list_all()? {
            rules.insert(&row.source_cluster, &row.target_cluster, row.to_rule());
        }
        tracing::debug!(rules = rules.len(), "换色转换规则已加载");
        Ok(rules)
    }

    /// 查询所有规则（按源组、目标组排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<TransitionRuleRow>> {
        let raw_rows = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                r#"
                SELECT id, source_cluster, target_cluster, weight, required_codes, required_type
                FROM transition_rule
                ORDER BY source_cluster, target_cluster
                "#,
            )?;
            let rows = stmt
                .query_map([], map_raw_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        raw_rows.into_iter().map(normalize_row).collect()
    }

    /// 按源换色组分组
    pub fn list_grouped(&self) -> RepositoryResult<BTreeMap<String, Vec<TransitionRuleRow>>> {
        let mut grouped: BTreeMap<String, Vec<TransitionRuleRow>> = BTreeMap::new();
        for row in self.list_all()? {
            grouped.entry(row.source_cluster.clone()).or_default().push(row);
        }
        Ok(grouped)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<TransitionRuleRow>> {
        let raw = {
            let conn = self.get_conn()?;
            conn.query_row(
                r#"
                SELECT id, source_cluster, target_cluster, weight, required_codes, required_type
                FROM transition_rule
                WHERE id = ?1
                "#,
                params![id],
                map_raw_row,
            )
            .optional()?
        };
        raw.map(normalize_row).transpose()
    }

    /// 新增规则
    ///
    /// # 参数
    /// - weight: 基础权重（≥0）
    /// - required_codes: 目标组必需代码（可空）
    /// - required_type: 目标组必需类型（None = 不约束）
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): (源组, 目标组) 已存在
    pub fn add(
        &self,
        source_cluster: &str,
        target_cluster: &str,
        weight: i64,
        required_codes: &[String],
        required_type: Option<ItemType>,
    ) -> RepositoryResult<i64> {
        validate_weight(weight)?;
        let codes_json = serde_json::to_string(&clean_codes(required_codes))?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO transition_rule
                (source_cluster, target_cluster, weight, required_codes, required_type)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                source_cluster.trim(),
                target_cluster.trim(),
                weight,
                codes_json,
                required_type.map(|t| t.code()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 修改规则（源组不可修改）
    pub fn update(
        &self,
        id: i64,
        target_cluster: &str,
        weight: i64,
        required_codes: &[String],
        required_type: Option<ItemType>,
    ) -> RepositoryResult<()> {
        validate_weight(weight)?;
        let codes_json = serde_json::to_string(&clean_codes(required_codes))?;

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE transition_rule
            SET target_cluster = ?1, weight = ?2, required_codes = ?3, required_type = ?4
            WHERE id = ?5
            "#,
            params![
                target_cluster.trim(),
                weight,
                codes_json,
                required_type.map(|t| t.code()),
                id,
            ],
        )?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM transition_rule WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// 所有源换色组名称（去重、升序）
    pub fn source_clusters(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT source_cluster FROM transition_rule ORDER BY source_cluster",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

fn map_raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRuleRow> {
    Ok(RawRuleRow {
        id: row.get(0)?,
        source_cluster: row.get(1)?,
        target_cluster: row.get(2)?,
        weight: row.get(3)?,
        required_codes: row.get(4)?,
        required_type: row.get(5)?,
    })
}

fn normalize_row(raw: RawRuleRow) -> RepositoryResult<TransitionRuleRow> {
    let required_codes = parse_required_codes(raw.id, &raw.required_codes);
    let required_type = parse_required_type(raw.required_type.as_deref())?;
    Ok(TransitionRuleRow {
        id: raw.id,
        source_cluster: raw.source_cluster,
        target_cluster: raw.target_cluster,
        weight: raw.weight,
        required_codes,
        required_type,
    })
}

/// 解析 required_codes JSON 列
fn parse_required_codes(id: i64, raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(codes) => clean_codes(&codes),
        Err(e) => {
            tracing::warn!(rule_id = id, raw = raw, error = %e, "required_codes 不是合法 JSON 列表，按空处理");
            Vec::new()
        }
    }
}

/// 解析 required_type 列
///
/// # 返回
/// - Ok(None): 空值或 ALLOW_E
/// - Ok(Some(t)): 已知类型
/// - Err(FieldValueError): 未知类型代码
pub(crate) fn parse_required_type(raw: Option<&str>) -> RepositoryResult<Option<ItemType>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let cleaned = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim().to_uppercase();
    if cleaned.is_empty() || cleaned == ALLOW_ANY_TYPE {
        return Ok(None);
    }
    ItemType::from_code(&cleaned)
        .map(Some)
        .map_err(|code| RepositoryError::FieldValueError {
            field: "required_type".to_string(),
            message: format!("未知颜色类型: {}", code),
        })
}

/// 去空白、去空串、去 VIETATO
fn clean_codes(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(FORBIDDEN_MARKER))
        .map(str::to_string)
        .collect()
}

fn validate_weight(weight: i64) -> RepositoryResult<()> {
    if !(0..=MAX_INFINITE_COST).contains(&weight) {
        return Err(RepositoryError::ValidationError(format!(
            "转换权重必须位于 [0, {}]: {}",
            MAX_INFINITE_COST, weight
        )));
    }
    Ok(())
}

fn not_found(id: i64) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "transition_rule".to_string(),
        id: id.to_string(),
    }
}
