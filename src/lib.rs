// ==========================================
// 试剂条码合成系统 - 核心库
// ==========================================
// 职责: 依据已知正确的锚点条码, 为新的批号/序列号/效期合成通过校验的条码
// 系统定位: 离线合成工具 (无网络, 无数据库)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 锚点、布局与请求
pub mod domain;

// 数据仓储层 - 生成历史
pub mod repository;

// 引擎层 - 校验、匹配、推断、合成
pub mod engine;

// 导入层 - 锚点文件
pub mod importer;

// 配置层 - 引擎配置
pub mod config;

// 项目目录 - 名称/瓶型/试剂映射
pub mod catalog;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CoefficientSource, Confidence, MatchTier};

// 领域实体
pub use domain::{
    AnchorSample, CalibrationGroup, Coefficients, GeneratedBarcode, GenerationInput,
    GenerationResponse, GenerationResult, GroupKey,
};

// 引擎
pub use engine::{BarcodeEngine, EngineError, ValidationMode, ValidationRunner};

// 配置
pub use config::EngineConfig;

// API
pub use api::{BarcodeApi, BarcodeRequest, BarcodeResponse, ValidationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "试剂条码合成系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
