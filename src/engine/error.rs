// ==========================================
// 喷涂线颜色排序系统 - 引擎异常分类
// ==========================================
// 红线: 引擎异常只作为结果中的诊断信息报出，流水线从不返回 Err
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineIssue {
    #[error("输入为空: 没有待排序的颜色项")]
    InputEmpty,

    #[error("颜色项无法解析换色组: {code}")]
    UnresolvedItem { code: String },

    #[error("无可行路径: {reason}")]
    NoFeasiblePath { reason: String },

    #[error("数量不一致({context}): 期望 {expected}, 实际 {actual}")]
    LengthMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("换色组数量超限: {count} > {max}")]
    TooManyClusters { count: usize, max: usize },
}
