// ==========================================
// 试剂条码合成系统 - 配置层
// ==========================================
// 职责: 引擎配置加载、环境变量覆写、系数覆盖表校验
// 存储: JSON 文件
// ==========================================

pub mod engine_config;

// 重导出核心配置
pub use engine_config::{
    config_keys, default_config_path, CoefficientOverride, ConfigError, ConfigResult,
    EngineConfig,
};
