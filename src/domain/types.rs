// ==========================================
// 试剂条码合成系统 - 领域类型定义
// ==========================================
// 职责: 匹配层级 / 置信度 / 系数来源等枚举
// 红线: 兜底生成的条码必须可区分 (低置信度)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 锚点匹配层级 (Match Tier)
// ==========================================
// 顺序: LotExact > BottleReagent > ItemOnly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    LotExact,      // 项目号 + 瓶型 + 试剂位 + 批号 全部一致
    BottleReagent, // 项目号 + 瓶型 + 试剂位 一致 (忽略批号)
    ItemOnly,      // 仅项目号一致
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTier::LotExact => write!(f, "LOT_EXACT"),
            MatchTier::BottleReagent => write!(f, "BOTTLE_REAGENT"),
            MatchTier::ItemOnly => write!(f, "ITEM_ONLY"),
        }
    }
}

// ==========================================
// 生成置信度 (Confidence)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Anchored, // 由锚点校准
    Fallback, // 无锚点, 固定规则兜底 (未经验证)
}

impl Confidence {
    pub fn is_low(&self) -> bool {
        matches!(self, Confidence::Fallback)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Anchored => write!(f, "ANCHORED"),
            Confidence::Fallback => write!(f, "FALLBACK"),
        }
    }
}

// ==========================================
// 系数来源 (Coefficient Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoefficientSource {
    Override, // 人工覆写表
    Inferred, // 成对投票推断
    Default,  // 样本不足, 使用默认系数
}

impl fmt::Display for CoefficientSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoefficientSource::Override => write!(f, "OVERRIDE"),
            CoefficientSource::Inferred => write!(f, "INFERRED"),
            CoefficientSource::Default => write!(f, "DEFAULT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_tier_order() {
        assert!(MatchTier::LotExact < MatchTier::BottleReagent);
        assert!(MatchTier::BottleReagent < MatchTier::ItemOnly);
    }

    #[test]
    fn test_display_matches_serde() {
        let json = serde_json::to_string(&MatchTier::BottleReagent).unwrap();
        assert_eq!(json, format!("\"{}\"", MatchTier::BottleReagent));
        let json = serde_json::to_string(&Confidence::Fallback).unwrap();
        assert_eq!(json, "\"FALLBACK\"");
        assert!(Confidence::Fallback.is_low());
        assert!(!Confidence::Anchored.is_low());
    }
}
