// ==========================================
// 试剂条码合成系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供命令行或外部服务调用
// ==========================================

pub mod barcode_api;
pub mod error;
pub mod validation_api;

// 重导出核心类型
pub use barcode_api::{BarcodeApi, BarcodeRequest, BarcodeResponse};
pub use error::{ApiError, ApiResult};
pub use validation_api::{export_report_csv, ValidationApi};
