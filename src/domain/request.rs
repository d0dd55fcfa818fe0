// ==========================================
// 试剂条码合成系统 - 生成请求
// ==========================================
// GenerationInput: 调用方原始输入 (全部可选, 不做校验)
// GenerationRequest: 清洗后的请求视图
// ==========================================
// 清洗规则:
// - 项目号: 仅保留数字, 左补零到 3 位, 取前 3 位
// - 瓶型/试剂位: 第一个数字字符, 缺省为 1
// - 批号: 最右 3 位数字, 左补零
// - 序列号: 最右 4 位数字, 左补零
// - 效期: 解析失败回退到今天, 统一归一到当月最后一天
// ==========================================

use crate::domain::layout::{LOT_LEN, SERIAL_LEN};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 效期支持的输入格式 (按顺序尝试)
///
/// 月/日 优先于 日/月: "09/12/2024" 解析为 9 月
pub const EXPIRY_FORMATS: [&str; 3] = ["%m/%d/%Y", "%d/%m/%Y", "%Y-%m-%d"];

const DEFAULT_ITEM_CODE: &str = "000";
const DEFAULT_SINGLE_CODE: char = '1';

/// 调用方原始输入
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationInput {
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default)]
    pub bottle_code: Option<String>,
    #[serde(default)]
    pub reagent_code: Option<String>,
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub exp_date: Option<String>,
}

impl GenerationInput {
    pub fn new(
        item_code: &str,
        bottle_code: &str,
        reagent_code: &str,
        lot_number: &str,
        serial_number: &str,
        exp_date: &str,
    ) -> Self {
        Self {
            item_code: Some(item_code.to_string()),
            bottle_code: Some(bottle_code.to_string()),
            reagent_code: Some(reagent_code.to_string()),
            lot_number: Some(lot_number.to_string()),
            serial_number: Some(serial_number.to_string()),
            exp_date: Some(exp_date.to_string()),
        }
    }

    /// 所有字段均为空 (等同于缺失请求)
    pub fn is_blank(&self) -> bool {
        [
            &self.item_code,
            &self.bottle_code,
            &self.reagent_code,
            &self.lot_number,
            &self.serial_number,
            &self.exp_date,
        ]
        .iter()
        .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// 清洗后的生成请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub item_code: String,
    pub bottle_code: char,
    pub reagent_code: char,
    /// 3 位批号
    pub lot: String,
    /// 4 位序列号
    pub serial: String,
    /// 已归一到月末的效期
    pub expiry: NaiveDate,
    /// 效期是否因无法解析而回退到今天
    pub expiry_defaulted: bool,
}

impl GenerationRequest {
    /// 从原始输入构建请求
    ///
    /// # 参数
    /// - input: 原始输入
    /// - today: 效期无法解析时的回退日期
    pub fn from_input(input: &GenerationInput, today: NaiveDate) -> Self {
        let item_digits = input
            .item_code
            .as_deref()
            .map(only_digits)
            .unwrap_or_else(|| DEFAULT_ITEM_CODE.to_string());
        let item_code: String = format!("{:0>3}", item_digits).chars().take(3).collect();

        let (expiry, expiry_defaulted) = match input.exp_date.as_deref().and_then(parse_expiry) {
            Some(date) => (date, false),
            None => (month_end(today), true),
        };

        Self {
            item_code,
            bottle_code: first_digit(input.bottle_code.as_deref()),
            reagent_code: first_digit(input.reagent_code.as_deref()),
            lot: rightmost_digits(input.lot_number.as_deref().unwrap_or("0"), LOT_LEN),
            serial: rightmost_digits(input.serial_number.as_deref().unwrap_or("0"), SERIAL_LEN),
            expiry,
            expiry_defaulted,
        }
    }

    /// 请求自身的前缀 (项目号 + 瓶型 + 试剂位)
    pub fn prefix(&self) -> String {
        format!("{}{}{}", self.item_code, self.bottle_code, self.reagent_code)
    }

    /// 效期 yyMMdd
    pub fn expiry_digits(&self) -> String {
        self.expiry.format("%y%m%d").to_string()
    }

    pub fn serial_value(&self) -> u32 {
        self.serial.parse().unwrap_or(0)
    }

    pub fn lot_value(&self) -> u32 {
        self.lot.parse().unwrap_or(0)
    }

    /// 序列号末位
    pub fn last_serial_digit(&self) -> u8 {
        self.serial
            .bytes()
            .last()
            .and_then(crate::domain::layout::digit_value)
            .unwrap_or(0)
    }
}

/// 仅保留数字字符
pub fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 仅保留数字, 左补零到 width, 取最右 width 位
pub fn rightmost_digits(value: &str, width: usize) -> String {
    let digits = only_digits(value);
    let padded = format!("{:0>width$}", digits, width = width);
    padded[padded.len() - width..].to_string()
}

fn first_digit(value: Option<&str>) -> char {
    value
        .and_then(|v| v.chars().find(|c| c.is_ascii_digit()))
        .unwrap_or(DEFAULT_SINGLE_CODE)
}

/// 解析效期并归一到月末
pub fn parse_expiry(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    EXPIRY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(month_end)
}

/// 当月最后一天
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}
