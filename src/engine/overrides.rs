// ==========================================
// 试剂条码合成系统 - 系数覆盖表
// ==========================================
// 项目号 -> 系数, 优先于推断结果
// 查找顺序: 覆盖表 -> 推断分组 -> 默认系数
// ==========================================

use crate::domain::calibration::{CalibrationGroup, Coefficients, GroupKey};
use crate::domain::types::CoefficientSource;
use std::collections::BTreeMap;

/// 系数覆盖表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoefficientOverrides {
    entries: BTreeMap<String, Coefficients>,
}

impl CoefficientOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置项目号的覆盖系数, 返回被替换的旧值
    pub fn insert(&mut self, item_code: &str, coefficients: Coefficients) -> Option<Coefficients> {
        self.entries.insert(item_code.to_string(), coefficients)
    }

    pub fn get(&self, item_code: &str) -> Option<&Coefficients> {
        self.entries.get(item_code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Coefficients)> {
        self.entries.iter()
    }

    /// 解析分组实际使用的系数
    ///
    /// # 参数
    /// - key: 匹配锚点所在的分组键
    /// - groups: 推断得到的分组表
    /// - defaults: 分组缺失时的系数
    ///
    /// # 返回
    /// - (系数, 来源)
    pub fn resolve(
        &self,
        key: &GroupKey,
        groups: &BTreeMap<GroupKey, CalibrationGroup>,
        defaults: Coefficients,
    ) -> (Coefficients, CoefficientSource) {
        if let Some(coefficients) = self.entries.get(&key.item_code) {
            return (*coefficients, CoefficientSource::Override);
        }
        match groups.get(key) {
            Some(group) if group.is_inferred() => (group.coefficients, CoefficientSource::Inferred),
            Some(group) => (group.coefficients, CoefficientSource::Default),
            None => (defaults, CoefficientSource::Default),
        }
    }
}

impl FromIterator<(String, Coefficients)> for CoefficientOverrides {
    fn from_iter<T: IntoIterator<Item = (String, Coefficients)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
