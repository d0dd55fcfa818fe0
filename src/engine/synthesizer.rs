// ==========================================
// 试剂条码合成系统 - 条码合成器
// ==========================================
// 输入: 清洗后的请求 + 匹配锚点 + 分组系数
// 输出: 20 位条码, 且 weightedSum(code[0..19]) + code[19] ≡ 目标校准值 (mod 10)
// ==========================================
// 步骤:
// 1. 前缀取锚点前 5 位 (锚点过短时用请求自身前缀)
// 2. 新 P 位 = 锚点 P 位 + Σ pSlopes[d]·(请求序列号第 d 位 - 锚点序列号第 d 位)
// 3. 目标校准值 = 锚点校准值 + k·ΔP + m·Δ(序列号÷10) + lotSlope·Δ批号
// 4. 校验位使 payload 的校准值等于目标值
// ==========================================

use crate::domain::anchor::AnchorSample;
use crate::domain::calibration::Coefficients;
use crate::domain::layout::{self, digit_value, is_digit_string, CODE_LEN, PREFIX_LEN};
use crate::domain::request::GenerationRequest;
use crate::engine::checksum::{calibration_of, check_digit_for};
use crate::engine::error::{EngineError, EngineResult};

/// 合成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedCode {
    pub code: String,
    pub target_calibration: u8,
    pub p_digit: u8,
}

/// 锚点上参与合成的字段
#[derive(Debug, Clone, PartialEq, Eq)]
struct AnchorFields {
    prefix: Option<String>,
    p_digit: u8,
    lot: i64,
    serial_digits: String,
    calibration: u8,
}

impl AnchorFields {
    fn extract(anchor: &AnchorSample) -> EngineResult<Self> {
        if !is_digit_string(&anchor.full_code) {
            return Err(EngineError::InvalidAnchorLayout {
                code: anchor.full_code.clone(),
                message: "条码为空或包含非数字字符".to_string(),
            });
        }
        let calibration =
            calibration_of(&anchor.full_code).ok_or_else(|| EngineError::InvalidAnchorLayout {
                code: anchor.full_code.clone(),
                message: "无法计算校准值".to_string(),
            })?;

        // 无 P 区或无批号区时按 0 处理
        let decoded = layout::decode(&anchor.full_code);
        let p_digit = decoded.as_ref().and_then(|d| d.p_digit).unwrap_or(0);
        let lot = decoded
            .as_ref()
            .and_then(|d| d.lot)
            .map(i64::from)
            .unwrap_or(0);

        Ok(Self {
            prefix: anchor.full_code.get(..PREFIX_LEN).map(str::to_string),
            p_digit,
            lot,
            serial_digits: anchor.serial_digits(),
            calibration,
        })
    }
}

/// Synthesizer - 条码合成器
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesizer;

impl Synthesizer {
    pub fn new() -> Self {
        Self
    }

    /// 基于锚点合成条码
    ///
    /// # 参数
    /// - request: 清洗后的请求
    /// - anchor: 匹配到的锚点
    /// - coefficients: 锚点所在分组的系数
    ///
    /// # 返回
    /// - SynthesizedCode: 条码与目标校准值
    pub fn synthesize(
        &self,
        request: &GenerationRequest,
        anchor: &AnchorSample,
        coefficients: &Coefficients,
    ) -> EngineResult<SynthesizedCode> {
        let fields = AnchorFields::extract(anchor)?;
        let prefix = fields.prefix.clone().unwrap_or_else(|| request.prefix());

        let new_p = next_p_digit(
            fields.p_digit,
            &request.serial,
            &fields.serial_digits,
            &coefficients.p_slopes,
        );

        let request_serial = i64::from(request.serial_value());
        let anchor_serial: i64 = fields.serial_digits.parse().unwrap_or(0);
        let delta_p = i64::from(new_p) - i64::from(fields.p_digit);
        let delta_tens = request_serial / 10 - anchor_serial / 10;
        let delta_lot = i64::from(request.lot_value()) - fields.lot;

        let target = (i64::from(fields.calibration)
            + i64::from(coefficients.k) * delta_p
            + i64::from(coefficients.m) * delta_tens
            + i64::from(coefficients.lot_slope) * delta_lot)
            .rem_euclid(10) as u8;

        let payload = assemble_payload(
            &prefix,
            &request.expiry_digits(),
            new_p,
            &request.lot,
            &request.serial,
        );
        let check = check_digit_for(&payload, target);

        Ok(SynthesizedCode {
            code: finalize_code(&payload, check),
            target_calibration: target,
            p_digit: new_p,
        })
    }
}

/// 按序列号逐位差值推算新的 P 位
///
/// d = 0..4 依次为个位、十位、百位、千位
pub fn next_p_digit(anchor_p: u8, request_serial: &str, anchor_serial: &str, p_slopes: &[u8; 4]) -> u8 {
    let req = request_serial.as_bytes();
    let anc = anchor_serial.as_bytes();
    let adjustment: i64 = (0..p_slopes.len())
        .map(|d| {
            let rd = place_digit(req, d);
            let ad = place_digit(anc, d);
            (i64::from(p_slopes[d]) * (rd - ad).rem_euclid(10)) % 10
        })
        .sum();
    (i64::from(anchor_p) + adjustment).rem_euclid(10) as u8
}

/// 从右数第 place 位 (缺失视为 0)
fn place_digit(digits: &[u8], place: usize) -> i64 {
    digits
        .len()
        .checked_sub(place + 1)
        .and_then(|idx| digits.get(idx).copied())
        .and_then(digit_value)
        .map(i64::from)
        .unwrap_or(0)
}

/// 拼接 19 位 payload: 前缀 ∥ 效期 ∥ P 位 ∥ 批号 ∥ 序列号
pub fn assemble_payload(prefix: &str, expiry: &str, p_digit: u8, lot: &str, serial: &str) -> String {
    format!("{}{}{}{}{}", prefix, expiry, p_digit, lot, serial)
}

/// payload ∥ 校验位, 左补零或截取最右 20 位
pub fn finalize_code(payload: &str, check: u8) -> String {
    let full = format!("{}{}", payload, check);
    if full.len() >= CODE_LEN {
        full[full.len() - CODE_LEN..].to_string()
    } else {
        format!("{:0>width$}", full, width = CODE_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::GenerationInput;
    use crate::engine::checksum::is_self_consistent;
    use chrono::NaiveDate;

    fn request(ic: &str, bc: &str, rc: &str, lot: &str, serial: &str, exp: &str) -> GenerationRequest {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        GenerationRequest::from_input(&GenerationInput::new(ic, bc, rc, lot, serial, exp), today)
    }

    #[test]
    fn test_next_p_digit() {
        // 默认斜率: 个位 +1 -> P +3
        assert_eq!(next_p_digit(9, "8932", "8931", &[3, 0, 3, 0]), 2);
        assert_eq!(next_p_digit(9, "8931", "8931", &[3, 0, 3, 0]), 9);
        // 个位 1 -> 0: (0-1) mod 10 = 9, 3*9 mod 10 = 7
        assert_eq!(next_p_digit(0, "8930", "8931", &[3, 0, 3, 0]), 7);
    }

    #[test]
    fn test_same_serial_reproduces_anchor() {
        let anchor = AnchorSample::new("010", "R1", "8931", "01021240930900989311");
        let req = request("010", "2", "1", "009", "8931", "09/30/2024");
        let out = Synthesizer::new()
            .synthesize(&req, &anchor, &Coefficients::default())
            .unwrap();
        assert_eq!(out.code, "01021240930900989311");
        assert_eq!(out.target_calibration, 8);
    }

    #[test]
    fn test_synthesized_code_is_self_consistent() {
        let anchor = AnchorSample::new("010", "R1", "8931", "01021240930900989311");
        let req = request("010", "2", "1", "009", "8932", "09/30/2024");
        let out = Synthesizer::new()
            .synthesize(&req, &anchor, &Coefficients::default())
            .unwrap();
        assert_eq!(out.code.len(), 20);
        assert!(out.code.starts_with("01021240930"));
        assert_eq!(&out.code[12..19], "0098932");
        assert!(is_self_consistent(&out.code, out.target_calibration));
    }

    #[test]
    fn test_rejects_non_digit_anchor() {
        let anchor = AnchorSample::new("010", "R1", "8931", "0102X240930900989311");
        let req = request("010", "2", "1", "009", "8932", "09/30/2024");
        let err = Synthesizer::new()
            .synthesize(&req, &anchor, &Coefficients::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAnchorLayout { .. }));
    }

    #[test]
    fn test_finalize_code_pads_and_truncates() {
        assert_eq!(finalize_code("123", 4), "00000000000000001234");
        assert_eq!(finalize_code("0123456789012345678901", 9), "34567890123456789019");
    }
}
