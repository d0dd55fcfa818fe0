// ==========================================
// 试剂条码合成系统 - 锚点存储
// ==========================================
// 职责: 加载持久化锚点 + 合并内置种子 + 按完整条码去重
// 红线: load() 对外 fail-soft, 读取/解析失败整体回退到内置种子
// ==========================================

use crate::domain::anchor::{AnchorSample, RawAnchorRecord};
use crate::importer::anchor_cleaner::AnchorCleaner;
use crate::importer::anchor_source_trait::AnchorSource;
use crate::importer::error::{AnchorImportError, AnchorImportResult};
use crate::importer::seed::builtin_anchors;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

// ==========================================
// JSON 锚点来源
// ==========================================
pub struct JsonAnchorSource;

impl AnchorSource for JsonAnchorSource {
    fn read_records(&self, path: &Path) -> AnchorImportResult<Vec<RawAnchorRecord>> {
        if !path.exists() {
            return Err(AnchorImportError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let records: Vec<RawAnchorRecord> = serde_json::from_str(&content)?;
        Ok(records)
    }
}

// ==========================================
// AnchorStore - 锚点存储
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorStore {
    samples: Vec<AnchorSample>,
}

impl AnchorStore {
    /// 加载锚点 (不会失败)
    ///
    /// # 参数
    /// - path: 持久化锚点文件路径
    ///
    /// # 返回
    /// - 持久化锚点 + 内置种子 (去重后); 文件缺失或损坏时仅含内置种子
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> Self {
        let mut store = match Self::try_load_persisted(path) {
            Ok(samples) => Self::from_samples(samples),
            Err(e) => {
                warn!(error = %e, "锚点文件不可用, 回退到内置种子");
                return Self::builtin();
            }
        };
        let persisted = store.len();
        let added = store.merge(builtin_anchors());
        info!(persisted, seed_added = added, total = store.len(), "锚点加载完成");
        store
    }

    /// 读取持久化锚点; 单条无效记录跳过并告警
    pub fn try_load_persisted(path: &Path) -> AnchorImportResult<Vec<AnchorSample>> {
        let records = JsonAnchorSource.read_records(path)?;
        Ok(clean_records(&records))
    }

    /// 仅含内置种子
    pub fn builtin() -> Self {
        Self::from_samples(builtin_anchors())
    }

    /// 从样本构建 (保持顺序, 按完整条码去重)
    pub fn from_samples(samples: Vec<AnchorSample>) -> Self {
        let mut store = Self::default();
        store.merge(samples);
        store
    }

    /// 合并样本, 跳过完整条码已存在的样本
    ///
    /// # 返回
    /// - 实际新增的样本数
    pub fn merge(&mut self, samples: Vec<AnchorSample>) -> usize {
        let mut seen: HashSet<String> = self.samples.iter().map(|a| a.full_code.clone()).collect();
        let before = self.samples.len();
        for sample in samples {
            if seen.insert(sample.full_code.clone()) {
                self.samples.push(sample);
            }
        }
        self.samples.len() - before
    }

    pub fn samples(&self) -> &[AnchorSample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<AnchorSample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn contains(&self, full_code: &str) -> bool {
        self.samples.iter().any(|a| a.full_code == full_code)
    }

    /// 写出持久化锚点文件 ({ic, rt, s, f} 列表)
    pub fn save_json(&self, path: &Path) -> AnchorImportResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AnchorImportError::FileWriteError(e.to_string()))?;
        }
        let records: Vec<RawAnchorRecord> = self.samples.iter().cloned().map(Into::into).collect();
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(path, json).map_err(|e| AnchorImportError::FileWriteError(e.to_string()))?;
        info!(path = %path.display(), count = records.len(), "锚点文件已写出");
        Ok(())
    }
}

/// 清洗原始记录, 跳过无效记录
pub(crate) fn clean_records(records: &[RawAnchorRecord]) -> Vec<AnchorSample> {
    let cleaner = AnchorCleaner;
    records
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| match cleaner.clean(idx + 1, raw) {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!(error = %e, "跳过无效锚点记录");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_seed() {
        let store = AnchorStore::load(Path::new("/nonexistent/dir/anchors.json"));
        assert_eq!(store.len(), 15);
        assert_eq!(store, AnchorStore::builtin());
    }

    #[test]
    fn test_merge_dedupes_by_full_code() {
        let mut store = AnchorStore::from_samples(vec![
            AnchorSample::new("010", "R1", "8931", "01021240930900989311"),
            AnchorSample::new("010", "R1", "8931", "01021240930900989311"),
        ]);
        assert_eq!(store.len(), 1);
        let added = store.merge(builtin_anchors());
        assert_eq!(added, 14);
        assert_eq!(store.samples()[0].serial, "8931");
        assert!(store.contains("01012251130701301175"));
    }
}
