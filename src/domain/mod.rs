// ==========================================
// 试剂条码合成系统 - 领域模型层
// ==========================================
// 职责: 定义锚点、字段布局、请求、校准分组、生成结果
// 红线: 不含 IO, 不含引擎逻辑
// ==========================================

pub mod anchor;
pub mod calibration;
pub mod layout;
pub mod outcome;
pub mod request;
pub mod types;

// 重导出核心类型
pub use anchor::{AnchorSample, RawAnchorRecord};
pub use calibration::{CalibrationGroup, Coefficients, GroupKey};
pub use outcome::{GeneratedBarcode, GenerationResponse, GenerationResult};
pub use request::{GenerationInput, GenerationRequest};
pub use types::{CoefficientSource, Confidence, MatchTier};
