// ==========================================
// 试剂条码合成系统 - 校准分组与系数
// ==========================================
// 分组键: (项目号, 试剂角色)
// 系数均为 0~9 的模 10 整数
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 默认 P 位斜率 (个位, 十位, 百位, 千位)
pub const DEFAULT_P_SLOPES: [u8; 4] = [3, 0, 3, 0];

/// 校准系数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coefficients {
    /// 序列号各位 (个/十/百/千) 对 P 位的贡献
    pub p_slopes: [u8; 4],
    /// P 位变化 → 校准值变化
    pub k: u8,
    /// 序列号÷10 变化 → 校准值变化
    pub m: u8,
    /// 批号变化 → 校准值变化
    pub lot_slope: u8,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            p_slopes: DEFAULT_P_SLOPES,
            k: 1,
            m: 0,
            lot_slope: 0,
        }
    }
}

impl Coefficients {
    /// 所有系数是否都在 0~9 内
    pub fn is_valid(&self) -> bool {
        self.p_slopes.iter().all(|v| *v <= 9)
            && self.k <= 9
            && self.m <= 9
            && self.lot_slope <= 9
    }
}

/// 分组键
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub item_code: String,
    pub reagent_role: String,
}

impl GroupKey {
    pub fn new(item_code: &str, reagent_role: &str) -> Self {
        Self {
            item_code: item_code.to_string(),
            reagent_role: reagent_role.to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.item_code, self.reagent_role)
    }
}

/// 校准分组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationGroup {
    pub key: GroupKey,
    pub coefficients: Coefficients,
    /// 参与推断的有效锚点数 (长度 >= 20 且可解码)
    pub sample_count: usize,
}

impl CalibrationGroup {
    /// 样本不足时保持默认系数
    pub fn with_defaults(key: GroupKey, defaults: Coefficients, sample_count: usize) -> Self {
        Self {
            key,
            coefficients: defaults,
            sample_count,
        }
    }

    pub fn is_inferred(&self) -> bool {
        self.sample_count >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_coefficients() {
        let c = Coefficients::default();
        assert_eq!(c.p_slopes, [3, 0, 3, 0]);
        assert_eq!((c.k, c.m, c.lot_slope), (1, 0, 0));
        assert!(c.is_valid());
    }

    #[test]
    fn test_invalid_coefficients() {
        let c = Coefficients {
            k: 10,
            ..Coefficients::default()
        };
        assert!(!c.is_valid());
    }

    #[test]
    fn test_group_key_order_and_display() {
        let a = GroupKey::new("010", "R1");
        let b = GroupKey::new("010", "R2");
        let c = GroupKey::new("002", "R1");
        assert!(c < a && a < b);
        assert_eq!(a.to_string(), "010/R1");
    }
}
