// ==========================================
// 试剂条码合成系统 - 加权校验
// ==========================================
// 从右向左, 偶数偏移权重 3, 奇数偏移权重 1
// 校准值 = (末位 + 加权和(除末位外)) mod 10
// ==========================================

use crate::domain::layout::digit_value;

/// 加权和 (非数字字符不计入)
pub fn weighted_sum(digits: &str) -> u32 {
    digits
        .bytes()
        .rev()
        .enumerate()
        .filter_map(|(offset, b)| {
            let weight = if offset % 2 == 0 { 3 } else { 1 };
            digit_value(b).map(|d| u32::from(d) * weight)
        })
        .sum()
}

/// 整条条码的校准值
///
/// 空串返回 None
pub fn calibration_of(code: &str) -> Option<u8> {
    let check = digit_value(*code.as_bytes().last()?)?;
    let body = code.get(..code.len() - 1)?;
    Some(((u32::from(check) + weighted_sum(body)) % 10) as u8)
}

/// 使 payload + 校验位 的校准值等于 target 的校验位
pub fn check_digit_for(payload: &str, target: u8) -> u8 {
    let ws = (weighted_sum(payload) % 10) as i32;
    (i32::from(target) - ws).rem_euclid(10) as u8
}

/// 条码的校准值是否等于 target
pub fn is_self_consistent(code: &str, target: u8) -> bool {
    calibration_of(code) == Some(target % 10)
}
