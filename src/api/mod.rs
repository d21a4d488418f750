// ==========================================
// 喷涂线颜色排序系统 - API 层
// ==========================================
// 职责: 与传输无关的业务接口，供 CLI / 上层服务调用
// ==========================================

pub mod dto;
pub mod error;
pub mod rule_api;
pub mod sequencing_api;

// 重导出核心类型
pub use dto::{
    ClusterLockRequest, ClusterMemberInfo, ClusterOrderRequest, ColorItemDto,
    LockedOptimizeRequest, OptimizeRequest, ReorderRequest, ReorderResponse, SequenceValue,
    TransitionRuleInfo,
};
pub use error::{ApiError, ApiResult};
pub use rule_api::RuleApi;
pub use sequencing_api::SequencingApi;
