// ==========================================
// 试剂条码合成系统 - 锚点来源接口
// ==========================================
// 职责: 从外部文件读取原始锚点记录 (不做清洗)
// 实现: JsonAnchorSource / CsvAnchorImporter
// ==========================================

use crate::domain::anchor::RawAnchorRecord;
use crate::importer::error::AnchorImportResult;
use std::path::Path;

// ==========================================
// AnchorSource Trait
// ==========================================
pub trait AnchorSource: Send + Sync {
    /// 读取原始锚点记录
    ///
    /// # 参数
    /// - path: 文件路径
    ///
    /// # 返回
    /// - Ok(Vec<RawAnchorRecord>): 按文件顺序的记录
    /// - Err: 文件不存在、读取或解析失败
    fn read_records(&self, path: &Path) -> AnchorImportResult<Vec<RawAnchorRecord>>;
}
