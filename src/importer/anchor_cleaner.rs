// ==========================================
// 试剂条码合成系统 - 锚点记录清洗
// ==========================================
// 职责: TRIM / UPPER / 缺省值补齐 / 条码合法性校验
// 规则:
// - 完整条码必须为纯数字且至少 5 位
// - 项目号为空时取条码前 3 位
// - 试剂角色为空时缺省 R1
// ==========================================

use crate::domain::anchor::{AnchorSample, RawAnchorRecord};
use crate::domain::layout::{is_digit_string, ITEM_CODE_RANGE, PREFIX_LEN};
use crate::importer::error::{AnchorImportError, AnchorImportResult};

const DEFAULT_REAGENT_ROLE: &str = "R1";

pub struct AnchorCleaner;

impl AnchorCleaner {
    /// 清洗单条记录
    ///
    /// # 参数
    /// - row: 行号 (从 1 开始, 用于错误定位)
    /// - raw: 原始记录
    pub fn clean(&self, row: usize, raw: &RawAnchorRecord) -> AnchorImportResult<AnchorSample> {
        let full_code = raw.f.trim();
        if !is_digit_string(full_code) {
            return Err(AnchorImportError::InvalidRecord {
                row,
                message: format!("完整条码必须为纯数字: '{}'", raw.f),
            });
        }
        if full_code.len() < PREFIX_LEN {
            return Err(AnchorImportError::InvalidRecord {
                row,
                message: format!("完整条码长度不足 {} 位: '{}'", PREFIX_LEN, full_code),
            });
        }

        let item_code = match raw.ic.trim() {
            "" => full_code[ITEM_CODE_RANGE].to_string(),
            ic => ic.to_string(),
        };
        let reagent_role = match raw.rt.trim() {
            "" => DEFAULT_REAGENT_ROLE.to_string(),
            rt => rt.to_uppercase(),
        };

        Ok(AnchorSample::new(
            &item_code,
            &reagent_role,
            raw.s.trim(),
            full_code,
        ))
    }
}
