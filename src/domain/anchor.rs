// ==========================================
// 试剂条码合成系统 - 锚点样本
// ==========================================
// 锚点: 已观测、已知正确的条码, 加载后不可变
// 持久化格式: { ic, rt, s, f } (项目号, 试剂角色, 序列号, 完整条码)
// ==========================================

use crate::domain::layout::{self, digit_at, is_digit_string};
use serde::{Deserialize, Serialize};

/// 锚点样本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSample {
    /// 项目号 (3 位)
    pub item_code: String,
    /// 试剂角色 (R1/R2), 仅用于分组
    pub reagent_role: String,
    /// 记录的序列号 (可能少于 4 位有效数字)
    pub serial: String,
    /// 完整条码 (纯数字)
    pub full_code: String,
}

/// 持久化锚点记录 (字段名与锚点文件保持一致)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnchorRecord {
    #[serde(default, alias = "item_code")]
    pub ic: String,
    #[serde(default = "default_reagent_role", alias = "reagent_role")]
    pub rt: String,
    #[serde(default, alias = "serial")]
    pub s: String,
    #[serde(alias = "full_code")]
    pub f: String,
}

fn default_reagent_role() -> String {
    "R1".to_string()
}

impl AnchorSample {
    pub fn new(item_code: &str, reagent_role: &str, serial: &str, full_code: &str) -> Self {
        Self {
            item_code: item_code.to_string(),
            reagent_role: reagent_role.to_string(),
            serial: serial.to_string(),
            full_code: full_code.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.full_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full_code.is_empty()
    }

    /// 瓶型位
    pub fn bottle_digit(&self) -> Option<u8> {
        digit_at(&self.full_code, layout::BOTTLE_POS)
    }

    /// 试剂位
    pub fn reagent_digit(&self) -> Option<u8> {
        digit_at(&self.full_code, layout::REAGENT_POS)
    }

    /// P 位 (固定位置 11)
    pub fn p_digit(&self) -> Option<u8> {
        digit_at(&self.full_code, layout::P_DIGIT_POS)
    }

    /// 固定位置批号 [12,15)
    pub fn lot_region(&self) -> Option<&str> {
        layout::fixed_lot_region(&self.full_code)
    }

    /// 序列号数值
    ///
    /// 非纯数字或为空的序列号返回 None (匹配时视为距离最远)
    pub fn serial_value(&self) -> Option<u32> {
        let trimmed = self.serial.trim();
        if !is_digit_string(trimmed) {
            return None;
        }
        trimmed.parse::<u32>().ok()
    }

    /// 序列号 4 位数字形式 (仅保留数字, 左补零, 取最右 4 位)
    pub fn serial_digits(&self) -> String {
        crate::domain::request::rightmost_digits(&self.serial, layout::SERIAL_LEN)
    }

    /// 是否可参与系数推断
    pub fn is_inference_ready(&self) -> bool {
        self.len() >= layout::MIN_INFERENCE_LEN
    }
}

impl From<AnchorSample> for RawAnchorRecord {
    fn from(sample: AnchorSample) -> Self {
        Self {
            ic: sample.item_code,
            rt: sample.reagent_role,
            s: sample.serial,
            f: sample.full_code,
        }
    }
}
