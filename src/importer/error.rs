// ==========================================
// 试剂条码合成系统 - 锚点导入错误类型
// ==========================================
// 工具: thiserror 派生宏
// 锚点存储对外 fail-soft, 这些错误仅在显式导入/持久化时返回
// ==========================================

use thiserror::Error;

/// 锚点导入错误类型
#[derive(Error, Debug)]
pub enum AnchorImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .json/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件写入失败: {0}")]
    FileWriteError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("缺少必需列: {0}")]
    MissingColumn(String),

    #[error("锚点记录无效 (行 {row}): {message}")]
    InvalidRecord { row: usize, message: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for AnchorImportError {
    fn from(err: std::io::Error) -> Self {
        AnchorImportError::FileReadError(err.to_string())
    }
}

impl From<serde_json::Error> for AnchorImportError {
    fn from(err: serde_json::Error) -> Self {
        AnchorImportError::JsonParseError(err.to_string())
    }
}

impl From<csv::Error> for AnchorImportError {
    fn from(err: csv::Error) -> Self {
        AnchorImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type AnchorImportResult<T> = Result<T, AnchorImportError>;
