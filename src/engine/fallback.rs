// ==========================================
// 试剂条码合成系统 - 兜底生成器
// ==========================================
// 仅在项目号没有任何锚点时使用, 结果标记为低置信度
// P 位 = (序列号末位 × 3 + 5) mod 10, 目标校准值固定为 0
// ==========================================

use crate::domain::request::GenerationRequest;
use crate::engine::checksum::check_digit_for;
use crate::engine::synthesizer::{assemble_payload, finalize_code, SynthesizedCode};

/// 兜底生成的目标校准值
pub const FALLBACK_TARGET: u8 = 0;

/// FallbackGenerator - 无锚点兜底生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 使用请求自身前缀生成结构合法的条码
    pub fn generate(&self, request: &GenerationRequest) -> SynthesizedCode {
        let p_digit = fallback_p_digit(request.last_serial_digit());
        let payload = assemble_payload(
            &request.prefix(),
            &request.expiry_digits(),
            p_digit,
            &request.lot,
            &request.serial,
        );
        let check = check_digit_for(&payload, FALLBACK_TARGET);

        SynthesizedCode {
            code: finalize_code(&payload, check),
            target_calibration: FALLBACK_TARGET,
            p_digit,
        }
    }
}

pub fn fallback_p_digit(last_serial_digit: u8) -> u8 {
    ((u32::from(last_serial_digit) * 3 + 5) % 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::GenerationInput;
    use crate::engine::checksum::is_self_consistent;
    use chrono::NaiveDate;

    #[test]
    fn test_fallback_p_digit() {
        assert_eq!(fallback_p_digit(0), 5);
        assert_eq!(fallback_p_digit(2), 1);
        assert_eq!(fallback_p_digit(9), 2);
    }

    #[test]
    fn test_fallback_code() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let input = GenerationInput::new("999", "1", "1", "5", "0042", "2025-03-10");
        let req = GenerationRequest::from_input(&input, today);
        let out = FallbackGenerator::new().generate(&req);

        assert_eq!(out.code.len(), 20);
        assert!(out.code.starts_with("99911250331"));
        assert_eq!(out.p_digit, 1);
        assert_eq!(&out.code[11..19], "10050042");
        assert!(is_self_consistent(&out.code, 0));
    }
}
