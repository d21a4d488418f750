// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、规则种子数据、请求构造、内存成本模型 Mock
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use color_sequence_aps::api::{ColorItemDto, RuleApi, SequenceValue, SequencingApi};
use color_sequence_aps::config::{CostModelConfig, CostModelReader};
use color_sequence_aps::db::{ensure_schema, open_sqlite_connection};
use color_sequence_aps::repository::{ClusterMembershipRepository, TransitionRuleRepository};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 插入换色组成员
pub fn insert_members(conn: &Connection, members: &[(&str, &str)]) -> Result<(), Box<dyn Error>> {
    for (cluster, code) in members {
        conn.execute(
            "INSERT INTO cluster_member (cluster, item_code) VALUES (?1, ?2)",
            params![cluster, code],
        )?;
    }
    Ok(())
}

/// 插入转换规则（required_codes 为 JSON 文本，按原样写入）
pub fn insert_rule(
    conn: &Connection,
    source: &str,
    target: &str,
    weight: i64,
    required_codes_json: &str,
    required_type: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"
        INSERT INTO transition_rule
            (source_cluster, target_cluster, weight, required_codes, required_type)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![source, target, weight, required_codes_json, required_type],
    )?;
    Ok(())
}

/// 标准两组/三组测试数据: A{A1,A2} B{B1,B2} C{C1}
pub fn seed_standard_members(conn: &Connection) -> Result<(), Box<dyn Error>> {
    insert_members(
        conn,
        &[("A", "A1"), ("A", "A2"), ("B", "B1"), ("B", "B2"), ("C", "C1")],
    )
}

/// 内存成本模型 Mock
pub struct MockCostReader {
    pub config: CostModelConfig,
}

impl MockCostReader {
    pub fn with_defaults() -> Self {
        Self {
            config: CostModelConfig::default(),
        }
    }
}

#[async_trait]
impl CostModelReader for MockCostReader {
    async fn load_cost_model(&self) -> Result<CostModelConfig, Box<dyn Error + Send + Sync>> {
        Ok(self.config.clone())
    }
}

/// 基于同一连接构建排序 API 与规则 API
pub fn build_apis(db_path: &str, config: CostModelConfig) -> (SequencingApi, RuleApi) {
    let conn = Arc::new(Mutex::new(
        open_sqlite_connection(db_path).expect("Failed to open db"),
    ));
    let cluster_repo = Arc::new(ClusterMembershipRepository::from_connection(conn.clone()));
    let rule_repo = Arc::new(TransitionRuleRepository::from_connection(conn));
    let reader = Arc::new(MockCostReader { config });

    (
        SequencingApi::new(cluster_repo.clone(), rule_repo.clone(), reader),
        RuleApi::new(cluster_repo, rule_repo),
    )
}

/// 构造颜色项 DTO
pub fn dto(code: &str, item_type: &str, sequence: Option<i64>) -> ColorItemDto {
    ColorItemDto {
        code: code.to_string(),
        item_type: item_type.to_string(),
        sequence: sequence.map(SequenceValue::Number),
        sequence_type: None,
        locked: false,
        position: None,
    }
}

/// 构造锁定的颜色项 DTO
pub fn locked_dto(code: &str, item_type: &str, sequence: Option<i64>) -> ColorItemDto {
    ColorItemDto {
        locked: true,
        ..dto(code, item_type, sequence)
    }
}
