// ==========================================
// 喷涂线颜色排序系统 - 换色组成员仓储
// ==========================================
// 表: cluster_member(cluster, item_code UNIQUE)
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema};
use crate::domain::cluster::ClusterMembership;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// cluster_member 表的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterMemberRow {
    pub id: i64,
    pub cluster: String,
    pub item_code: String,
}

// ==========================================
// ClusterMembershipRepository
// ==========================================
pub struct ClusterMembershipRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClusterMembershipRepository {
    /// 创建新的仓储实例（建表幂等）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = Connection::open(db_path)?;
        configure_sqlite_connection(&conn)?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 加载完整成员映射
    pub fn load_membership(&self) -> RepositoryResult<ClusterMembership> {
        let rows = self.list_all()?;
        let mut membership = ClusterMembership::new();
        for row in rows {
            membership
                .insert(&row.cluster, &row.item_code)
                .map_err(|existing| {
                    RepositoryError::BusinessRuleViolation(format!(
                        "代码 {} 同时属于换色组 {} 与 {}",
                        row.item_code, existing, row.cluster
                    ))
                })?;
        }
        tracing::debug!(clusters = membership.len(), "换色组成员已加载");
        Ok(membership)
    }

    /// 查询所有成员（按 cluster, item_code 排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<ClusterMemberRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, cluster, item_code FROM cluster_member ORDER BY cluster, item_code",
        )?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 按换色组分组
    pub fn list_grouped(&self) -> RepositoryResult<BTreeMap<String, Vec<ClusterMemberRow>>> {
        let mut grouped: BTreeMap<String, Vec<ClusterMemberRow>> = BTreeMap::new();
        for row in self.list_all()? {
            grouped.entry(row.cluster.clone()).or_default().push(row);
        }
        Ok(grouped)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ClusterMemberRow>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT id, cluster, item_code FROM cluster_member WHERE id = ?1",
                params![id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// 新增成员
    ///
    /// # 返回
    /// - Ok(i64): 新行 id
    /// - Err(UniqueConstraintViolation): 代码已属于某个换色组
    pub fn add(&self, cluster: &str, item_code: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO cluster_member (cluster, item_code) VALUES (?1, ?2)",
            params![cluster.trim(), item_code.trim()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 修改成员代码（换色组不可在此修改）
    pub fn update_code(&self, id: i64, item_code: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE cluster_member SET item_code = ?1 WHERE id = ?2",
            params![item_code.trim(), id],
        )?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM cluster_member WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// 所有换色组名称（去重、升序）
    pub fn cluster_names(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT cluster FROM cluster_member ORDER BY cluster")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClusterMemberRow> {
    Ok(ClusterMemberRow {
        id: row.get(0)?,
        cluster: row.get(1)?,
        item_code: row.get(2)?,
    })
}

fn not_found(id: i64) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "cluster_member".to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ClusterMembershipRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ClusterMembershipRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_add_list_and_load_membership() {
        let repo = setup();
        repo.add("BLU", "RAL5019").unwrap();
        repo.add("BLU", "RAL5015").unwrap();
        repo.add("NERI", " RAL9005 ").unwrap();

        let grouped = repo.list_grouped().unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["BLU"].len(), 2);

        let membership = repo.load_membership().unwrap();
        assert_eq!(membership.cluster_of("RAL9005"), Some("NERI"));
        assert_eq!(repo.cluster_names().unwrap(), vec!["BLU", "NERI"]);
    }

    #[test]
    fn test_duplicate_code_is_rejected() {
        let repo = setup();
        repo.add("BLU", "RAL5019").unwrap();
        let err = repo.add("NERI", "RAL5019").unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_update_and_delete() {
        let repo = setup();
        let id = repo.add("BLU", "RAL5019").unwrap();

        repo.update_code(id, "RAL5017").unwrap();
        let row = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(row.item_code, "RAL5017");
        assert_eq!(row.cluster, "BLU");

        repo.delete(id).unwrap();
        assert!(repo.find_by_id(id).unwrap().is_none());
        assert!(matches!(
            repo.delete(id),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
