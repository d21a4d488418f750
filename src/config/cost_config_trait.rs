// ==========================================
// 喷涂线颜色排序系统 - 成本模型读取 Trait
// ==========================================
// 职责: 定义 API 层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::cost_model::CostModelConfig;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// CostModelReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
// 测试: tests 中的内存 Mock
#[async_trait]
pub trait CostModelReader: Send + Sync {
    /// 读取完整成本模型
    ///
    /// # 返回
    /// - CostModelConfig: 缺失项按默认值补齐
    async fn load_cost_model(&self) -> Result<CostModelConfig, Box<dyn Error + Send + Sync>>;

    /// 获取候选路径数量
    ///
    /// # 默认值
    /// - 3
    async fn get_top_n(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.load_cost_model().await?.top_n)
    }
}
