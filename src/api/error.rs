// ==========================================
// 试剂条码合成系统 - API层错误类型
// ==========================================
// 职责: 将引擎/导入/仓储层错误转换为调用方可读的错误消息
// 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::AnchorImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("条码生成失败: {0}")]
    GenerationFailed(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("锚点导入失败: {0}")]
    ImportError(String),

    #[error("报告导出失败: {0}")]
    ExportFailed(String),

    #[error("历史存储错误: {0}")]
    StorageError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            EngineError::Config(e) => ApiError::ValidationError(e.to_string()),
            EngineError::Other(e) => ApiError::Other(e),
            other => ApiError::GenerationFailed(other.to_string()),
        }
    }
}

// ==========================================
// 从 AnchorImportError 转换
// ==========================================
impl From<AnchorImportError> for ApiError {
    fn from(err: AnchorImportError) -> Self {
        match err {
            AnchorImportError::FileNotFound(path) => {
                ApiError::NotFound(format!("文件{}不存在", path))
            }
            AnchorImportError::Other(e) => ApiError::Other(e),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::StorageError(format!("存储锁获取失败: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::ExportFailed(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_conversion() {
        let err: ApiError = EngineError::InvalidInput("请求不能为空".to_string()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = EngineError::Internal("boom".to_string()).into();
        assert!(matches!(err, ApiError::GenerationFailed(_)));
    }

    #[test]
    fn test_repository_error_conversion() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "HistoryEntry".to_string(),
            id: "42".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "资源未找到: HistoryEntry(id=42)不存在");
    }

    #[test]
    fn test_import_error_conversion() {
        let err: ApiError = AnchorImportError::MissingColumn("f".to_string()).into();
        assert!(matches!(err, ApiError::ImportError(_)));
    }
}
