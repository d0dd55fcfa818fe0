// ==========================================
// 试剂条码合成系统 - 引擎层
// ==========================================
// 职责: 校验计算、锚点匹配、系数推断、条码合成、回放验证
// 红线: 引擎不做 IO (锚点加载除外), 失败以值的形式返回
// ==========================================

pub mod barcode_engine;
pub mod checksum;
pub mod error;
pub mod fallback;
pub mod inference;
pub mod matcher;
pub mod overrides;
pub mod synthesizer;
pub mod validation;

// 重导出核心引擎
pub use barcode_engine::{BarcodeEngine, EngineOptions};
pub use checksum::{calibration_of, check_digit_for, is_self_consistent, weighted_sum};
pub use error::{EngineError, EngineResult};
pub use fallback::FallbackGenerator;
pub use inference::{CoefficientInference, InferenceConfig};
pub use matcher::{find_closest, AnchorMatcher, MatchQuery, MatchedAnchor, MatcherConfig};
pub use overrides::CoefficientOverrides;
pub use synthesizer::{SynthesizedCode, Synthesizer};
pub use validation::{
    SweepReport, ValidationCase, ValidationMode, ValidationOutcome, ValidationReport,
    ValidationRunner,
};
