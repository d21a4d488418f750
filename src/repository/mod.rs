// ==========================================
// 喷涂线颜色排序系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 换色组成员与转换规则的持久化，屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod cluster_repo;
pub mod error;
pub mod transition_rule_repo;

// 重导出核心仓储
pub use cluster_repo::{ClusterMemberRow, ClusterMembershipRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use transition_rule_repo::{TransitionRuleRepository, TransitionRuleRow};
