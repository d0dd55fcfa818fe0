// ==========================================
// 试剂条码合成系统 - 条码字段布局
// ==========================================
// 标准 20 位: 项目号(3) 瓶型(1) 试剂位(1) 效期yyMMdd(6) P位(1) 批号(3) 序列号(4) 校验位(1)
// 通用长度 L: 11 + midLen + 4 + 1, mid 区 = P 区 (midLen-3, 最小 0) + 批号区 (3)
// ==========================================

use std::ops::Range;

/// 标准条码长度
pub const CODE_LEN: usize = 20;
/// 前缀长度 (项目号 + 瓶型 + 试剂位)
pub const PREFIX_LEN: usize = 5;

pub const ITEM_CODE_RANGE: Range<usize> = 0..3;
pub const BOTTLE_POS: usize = 3;
pub const REAGENT_POS: usize = 4;
pub const EXPIRY_RANGE: Range<usize> = 5..11;
pub const MID_START: usize = 11;
pub const P_DIGIT_POS: usize = 11;
/// 固定位置批号区 (匹配与推断使用)
pub const LOT_RANGE: Range<usize> = 12..15;

pub const LOT_LEN: usize = 3;
pub const SERIAL_LEN: usize = 4;
/// 序列号 + 校验位
pub const TAIL_LEN: usize = SERIAL_LEN + 1;

/// 参与批号匹配的最小长度
pub const MIN_MATCH_LEN: usize = 15;
/// 参与系数推断的最小长度
pub const MIN_INFERENCE_LEN: usize = 20;

/// 单个字符转数字
pub fn digit_value(ch: u8) -> Option<u8> {
    if ch.is_ascii_digit() {
        Some(ch - b'0')
    } else {
        None
    }
}

/// 取指定位置的数字
pub fn digit_at(code: &str, pos: usize) -> Option<u8> {
    code.as_bytes().get(pos).copied().and_then(digit_value)
}

/// 是否为非空纯数字串
pub fn is_digit_string(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// 固定位置批号区 [12,15)
pub fn fixed_lot_region(code: &str) -> Option<&str> {
    code.get(LOT_RANGE).filter(|s| is_digit_string(s))
}

/// 按通用布局解码后的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLayout {
    /// mid 区长度
    pub mid_len: usize,
    /// P 位 (P 区为空时为 None)
    pub p_digit: Option<u8>,
    /// 批号数值 (批号区为空时为 None)
    pub lot: Option<u32>,
    /// 序列号 (条码内 4 位)
    pub serial: String,
    pub check_digit: u8,
}

/// 按通用布局解码 (要求长度 >= 16 且全部为数字)
pub fn decode(code: &str) -> Option<DecodedLayout> {
    if !is_digit_string(code) || code.len() < MID_START + TAIL_LEN {
        return None;
    }

    let total = code.len();
    let mid_len = total - MID_START - TAIL_LEN;
    let p_len = mid_len.saturating_sub(LOT_LEN);
    let lot_region = &code[MID_START + p_len..MID_START + mid_len];

    let p_digit = if p_len > 0 {
        digit_at(code, P_DIGIT_POS)
    } else {
        None
    };
    let lot = if lot_region.is_empty() {
        None
    } else {
        lot_region.parse::<u32>().ok()
    };

    Some(DecodedLayout {
        mid_len,
        p_digit,
        lot,
        serial: code[total - TAIL_LEN..total - 1].to_string(),
        check_digit: digit_at(code, total - 1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_canonical_code() {
        let d = decode("01021240930900989311").unwrap();
        assert_eq!(d.mid_len, 4);
        assert_eq!(d.p_digit, Some(9));
        assert_eq!(d.lot, Some(9));
        assert_eq!(d.serial, "8931");
        assert_eq!(d.check_digit, 1);
    }

    #[test]
    fn test_decode_short_code_has_no_p_region() {
        // 19 位: mid 区只有批号
        let d = decode("0592126063000801585").unwrap();
        assert_eq!(d.mid_len, 3);
        assert_eq!(d.p_digit, None);
        assert_eq!(d.lot, Some(8));
        assert_eq!(d.serial, "0158");
        assert_eq!(d.check_digit, 5);
    }

    #[test]
    fn test_decode_rejects_short_or_non_digit() {
        assert!(decode("010212409309").is_none());
        assert!(decode("0102124093090098931X").is_none());
    }

    #[test]
    fn test_fixed_lot_region() {
        assert_eq!(fixed_lot_region("01021240930900989311"), Some("009"));
        assert_eq!(fixed_lot_region("01021"), None);
    }

    #[test]
    fn test_digit_at() {
        assert_eq!(digit_at("0102", 2), Some(0));
        assert_eq!(digit_at("0102", 3), Some(2));
        assert_eq!(digit_at("0102", 4), None);
        assert_eq!(digit_at("01a2", 2), None);
    }
}
