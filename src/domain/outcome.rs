// ==========================================
// 试剂条码合成系统 - 生成结果
// ==========================================
// 要么是完整的 20 位条码, 要么是带原因的失败; 不返回部分结果
// ==========================================

use crate::domain::types::{CoefficientSource, Confidence, MatchTier};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 生成成功的条码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBarcode {
    /// 20 位条码
    pub code: String,
    pub confidence: Confidence,
    /// 合成时的目标校准值
    pub target_calibration: u8,
    /// 锚点匹配层级 (兜底生成时为 None)
    pub match_tier: Option<MatchTier>,
    /// 使用的锚点条码
    pub anchor_code: Option<String>,
    pub coefficient_source: Option<CoefficientSource>,
    /// 归一后的效期
    pub expiry: NaiveDate,
    /// 效期是否回退到今天
    pub expiry_defaulted: bool,
}

/// 生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Generated(GeneratedBarcode),
    Failed { reason: String },
}

impl GenerationResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        GenerationResult::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, GenerationResult::Generated(_))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            GenerationResult::Generated(b) => Some(b.code.as_str()),
            GenerationResult::Failed { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            GenerationResult::Generated(_) => None,
            GenerationResult::Failed { reason } => Some(reason.as_str()),
        }
    }

    pub fn barcode(&self) -> Option<&GeneratedBarcode> {
        match self {
            GenerationResult::Generated(b) => Some(b),
            GenerationResult::Failed { .. } => None,
        }
    }

    /// 转换为调用面响应 {ok, code} | {ok, reason}
    pub fn to_response(&self) -> GenerationResponse {
        match self {
            GenerationResult::Generated(b) => GenerationResponse {
                ok: true,
                code: Some(b.code.clone()),
                reason: None,
                confidence: Some(b.confidence),
            },
            GenerationResult::Failed { reason } => GenerationResponse {
                ok: false,
                code: None,
                reason: Some(reason.clone()),
                confidence: None,
            },
        }
    }
}

/// 调用面响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}
