// ==========================================
// 喷涂线颜色排序系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 每日颜色清单 → 换色组路径最优化 → 扁平生产序列
// 数据流: 颜色项 → 换色组解析 → 成本矩阵 → 精确 DP 求解 → 组内排序
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 换色组成员 / 转换规则
pub mod repository;

// 引擎层 - 排序核心
pub mod engine;

// 导入层 - 当日颜色清单
pub mod importer;

// 配置层 - 成本模型
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ClusterMembership, ColorItem, ItemType, OptimizationResult, RankedTour, SequenceClass,
    TourCost, TransitionRule, TransitionRuleSet,
};

// 配置
pub use config::{ConfigManager, CostModelConfig, CostModelReader};

// 引擎
pub use engine::{
    ConstrainedReoptimizer, CostMatrix, CostMatrixBuilder, HeldKarpSolver, SequenceOrchestrator,
    SequenceRequest,
};

// API
pub use api::{RuleApi, SequencingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "喷涂线颜色排序系统";
