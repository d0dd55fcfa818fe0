// ==========================================
// 试剂条码合成系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 引擎边界处统一转换为 GenerationResult::Failed
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("输入无效: {0}")]
    InvalidInput(String),

    #[error("锚点条码布局无效 (code={code}): {message}")]
    InvalidAnchorLayout { code: String, message: String },

    #[error("生成结果校验失败: code={code}, 目标校准值={target}")]
    SelfCheckFailed { code: String, target: u8 },

    #[error("引擎内部错误: {0}")]
    Internal(String),

    #[error("引擎配置无效: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
