// ==========================================
// 试剂条码合成系统 - 系数推断引擎
// ==========================================
// 按 (项目号, 试剂角色) 分组, 对组内锚点两两投票:
// 1) P 位斜率: p0·Δ个位 + p2·Δ百位 ≡ ΔP (mod 10)
// 2) 校准斜率: k·ΔP + m·Δ(序列号÷10) + l·Δ批号 ≡ Δ校准值 (mod 10)
// 有效锚点不足 2 个时保持默认系数
// ==========================================
// 红线: 纯函数, 仅依赖锚点集合
// ==========================================

use crate::domain::anchor::AnchorSample;
use crate::domain::calibration::{CalibrationGroup, Coefficients, GroupKey};
use crate::domain::layout::MIN_INFERENCE_LEN;
use crate::engine::checksum::calibration_of;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// P 位斜率投票平局时优先的 (个位, 百位) 系数
pub const PREFERRED_P_SLOPE_PAIR: (u8, u8) = (3, 0);
/// 批号斜率候选值 (0, +1, -1)
pub const LOT_SLOPE_CANDIDATES: [u8; 3] = [0, 1, 9];
/// 同批号样本对的投票权重
pub const SAME_LOT_WEIGHT: u32 = 5;

/// 参与推断的解码点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InferencePoint {
    p: i64,
    serial: i64,
    lot: i64,
    calibration: i64,
}

impl InferencePoint {
    fn decode(anchor: &AnchorSample) -> Option<Self> {
        Some(Self {
            p: i64::from(anchor.p_digit()?),
            serial: i64::from(anchor.serial_value()?),
            lot: anchor.lot_region()?.parse().ok()?,
            calibration: i64::from(calibration_of(&anchor.full_code)?),
        })
    }

    fn ones(&self) -> i64 {
        self.serial % 10
    }

    fn hundreds(&self) -> i64 {
        self.serial / 100 % 10
    }

    fn tens_and_above(&self) -> i64 {
        self.serial / 10
    }
}

/// 推断配置
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// 参与推断的最小条码长度
    pub min_inference_len: usize,
    /// 样本不足或无投票时使用的系数
    pub defaults: Coefficients,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            min_inference_len: MIN_INFERENCE_LEN,
            defaults: Coefficients::default(),
        }
    }
}

/// CoefficientInference - 系数推断引擎
#[derive(Debug, Clone, Default)]
pub struct CoefficientInference {
    config: InferenceConfig,
}

impl CoefficientInference {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// 为全部锚点构建校准分组
    ///
    /// # 参数
    /// - anchors: 锚点列表 (长度不足的锚点不参与分组)
    ///
    /// # 返回
    /// - 按分组键排序的分组表
    #[instrument(skip(self, anchors), fields(anchor_count = anchors.len()))]
    pub fn infer_all(&self, anchors: &[AnchorSample]) -> BTreeMap<GroupKey, CalibrationGroup> {
        let mut members: BTreeMap<GroupKey, Vec<&AnchorSample>> = BTreeMap::new();
        for anchor in anchors
            .iter()
            .filter(|a| a.len() >= self.config.min_inference_len)
        {
            members
                .entry(GroupKey::new(&anchor.item_code, &anchor.reagent_role))
                .or_default()
                .push(anchor);
        }

        let groups: BTreeMap<GroupKey, CalibrationGroup> = members
            .into_iter()
            .map(|(key, group)| {
                let inferred = self.infer_group(key.clone(), &group);
                (key, inferred)
            })
            .collect();

        debug!(group_count = groups.len(), "校准分组推断完成");
        groups
    }

    /// 推断单个分组的系数
    pub fn infer_group(&self, key: GroupKey, anchors: &[&AnchorSample]) -> CalibrationGroup {
        let points: Vec<InferencePoint> = anchors
            .iter()
            .filter(|a| a.len() >= self.config.min_inference_len)
            .filter_map(|a| InferencePoint::decode(a))
            .collect();

        let defaults = self.config.defaults;
        if points.len() < 2 {
            debug!(group = %key, valid = points.len(), "有效锚点不足, 使用默认系数");
            return CalibrationGroup::with_defaults(key, defaults, points.len());
        }

        let pairs: Vec<(InferencePoint, InferencePoint)> = points
            .iter()
            .enumerate()
            .flat_map(|(i, a)| points[i + 1..].iter().map(move |b| (*a, *b)))
            .collect();

        let p_slopes = vote_p_slopes(&pairs).unwrap_or(defaults.p_slopes);
        let (k, m, lot_slope) = vote_calibration_slopes(&pairs, &defaults)
            .unwrap_or((defaults.k, defaults.m, defaults.lot_slope));

        let coefficients = Coefficients {
            p_slopes,
            k,
            m,
            lot_slope,
        };
        debug!(
            group = %key,
            valid = points.len(),
            p_slopes = ?coefficients.p_slopes,
            k = coefficients.k,
            m = coefficients.m,
            lot_slope = coefficients.lot_slope,
            "分组系数推断完成"
        );

        CalibrationGroup {
            key,
            coefficients,
            sample_count: points.len(),
        }
    }
}

/// P 位斜率投票; 无任何投票时返回 None
fn vote_p_slopes(pairs: &[(InferencePoint, InferencePoint)]) -> Option<[u8; 4]> {
    let mut votes = [[0u32; 10]; 10];
    for (a, b) in pairs {
        let delta_p = (b.p - a.p).rem_euclid(10);
        let delta_ones = b.ones() - a.ones();
        let delta_hundreds = b.hundreds() - a.hundreds();
        for (p0, row) in votes.iter_mut().enumerate() {
            for (p2, count) in row.iter_mut().enumerate() {
                if (p0 as i64 * delta_ones + p2 as i64 * delta_hundreds - delta_p).rem_euclid(10)
                    == 0
                {
                    *count += 1;
                }
            }
        }
    }

    let (pref0, pref2) = PREFERRED_P_SLOPE_PAIR;
    let mut best = (pref0, pref2);
    let mut best_votes = votes[usize::from(pref0)][usize::from(pref2)];
    for (p0, row) in votes.iter().enumerate() {
        for (p2, count) in row.iter().enumerate() {
            if *count > best_votes {
                best = (p0 as u8, p2 as u8);
                best_votes = *count;
            }
        }
    }

    if best_votes == 0 {
        return None;
    }
    Some([best.0, 0, best.1, 0])
}

/// 校准斜率投票; 平局保持默认系数, 无任何投票时返回 None
fn vote_calibration_slopes(
    pairs: &[(InferencePoint, InferencePoint)],
    defaults: &Coefficients,
) -> Option<(u8, u8, u8)> {
    let mut votes = [[[0u32; LOT_SLOPE_CANDIDATES.len()]; 10]; 10];
    for (a, b) in pairs {
        let delta_p = b.p - a.p;
        let delta_tens = b.tens_and_above() - a.tens_and_above();
        let delta_lot = b.lot - a.lot;
        let delta_cal = (b.calibration - a.calibration).rem_euclid(10);
        let weight = if delta_lot == 0 { SAME_LOT_WEIGHT } else { 1 };

        for (k, plane) in votes.iter_mut().enumerate() {
            for (m, row) in plane.iter_mut().enumerate() {
                for (li, count) in row.iter_mut().enumerate() {
                    let l = i64::from(LOT_SLOPE_CANDIDATES[li]);
                    let lhs = k as i64 * delta_p + m as i64 * delta_tens + l * delta_lot;
                    if (lhs - delta_cal).rem_euclid(10) == 0 {
                        *count += weight;
                    }
                }
            }
        }
    }

    let mut best = (defaults.k, defaults.m, defaults.lot_slope);
    let mut best_votes = LOT_SLOPE_CANDIDATES
        .iter()
        .position(|l| *l == defaults.lot_slope)
        .filter(|_| defaults.k <= 9 && defaults.m <= 9)
        .map(|li| votes[usize::from(defaults.k)][usize::from(defaults.m)][li])
        .unwrap_or(0);

    for (k, plane) in votes.iter().enumerate() {
        for (m, row) in plane.iter().enumerate() {
            for (li, count) in row.iter().enumerate() {
                if *count > best_votes {
                    best = (k as u8, m as u8, LOT_SLOPE_CANDIDATES[li]);
                    best_votes = *count;
                }
            }
        }
    }

    if best_votes == 0 {
        return None;
    }
    Some(best)
}
