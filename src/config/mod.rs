// ==========================================
// 喷涂线颜色排序系统 - 配置层
// ==========================================
// 职责: 成本模型参数管理（默认值 + config_kv 覆写）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod cost_config_trait;
pub mod cost_model;

pub use config_manager::{config_keys, ConfigManager};
pub use cost_config_trait::CostModelReader;
pub use cost_model::{CostModelConfig, TypeWeights, MAX_CLUSTERS_CEILING, MAX_INFINITE_COST};
