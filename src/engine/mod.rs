// ==========================================
// 喷涂线颜色排序系统 - 引擎层
// ==========================================
// 职责: 换色组解析、成本矩阵、最优路径、组内排序、锁定重排
// 红线: Engine 不拼 SQL、不做 I/O，所有异常以诊断形式进入结果
// ==========================================
// 数据流: 颜色项 → ClusterResolver → CostMatrixBuilder
//         → HeldKarpSolver → ColorSequencer → OptimizationResult
// ==========================================

pub mod cluster_resolver;
pub mod color_sequencer;
pub mod cost_matrix;
pub mod error;
pub mod manual_ops;
pub mod orchestrator;
pub mod path_solver;
pub mod reoptimizer;

// 重导出核心引擎
pub use cluster_resolver::{ClusterResolver, ResolvedClusters};
pub use color_sequencer::{ColorSequencer, SequencedItems};
pub use cost_matrix::{CostMatrix, CostMatrixBuilder};
pub use error::EngineIssue;
pub use manual_ops::{
    apply_cluster_order, apply_manual_order, assign_locked_positions, ManualOrderError,
};
pub use orchestrator::{SequenceOrchestrator, SequenceRequest};
pub use path_solver::{HeldKarpSolver, SolveOutcome, SolvedTour};
pub use reoptimizer::ConstrainedReoptimizer;
