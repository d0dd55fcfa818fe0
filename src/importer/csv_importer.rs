// ==========================================
// 试剂条码合成系统 - CSV 锚点导入器
// ==========================================
// 支持表头: ic,rt,s,f 或 item_code,reagent_role,serial,full_code (大小写不敏感)
// 完全空白的行跳过; 仅 f 列必需
// ==========================================

use crate::domain::anchor::{AnchorSample, RawAnchorRecord};
use crate::importer::anchor_source_trait::AnchorSource;
use crate::importer::anchor_store::clean_records;
use crate::importer::error::{AnchorImportError, AnchorImportResult};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::info;

const COLUMN_ALIASES: [(&str, &[&str]); 4] = [
    ("ic", &["ic", "item_code", "itemcode"]),
    ("rt", &["rt", "reagent_role", "reagent", "role"]),
    ("s", &["s", "serial", "serial_number"]),
    ("f", &["f", "full_code", "fullcode", "code", "barcode"]),
];

// ==========================================
// CsvAnchorImporter
// ==========================================
pub struct CsvAnchorImporter;

impl CsvAnchorImporter {
    /// 读取并清洗 CSV 锚点
    pub fn import(&self, path: &Path) -> AnchorImportResult<Vec<AnchorSample>> {
        let records = self.read_records(path)?;
        let samples = clean_records(&records);
        info!(
            path = %path.display(),
            rows = records.len(),
            accepted = samples.len(),
            "CSV 锚点导入完成"
        );
        Ok(samples)
    }
}

impl AnchorSource for CsvAnchorImporter {
    fn read_records(&self, path: &Path) -> AnchorImportResult<Vec<RawAnchorRecord>> {
        if !path.exists() {
            return Err(AnchorImportError::FileNotFound(path.display().to_string()));
        }
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(AnchorImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let column = |key: &str| -> Option<usize> {
            let aliases = COLUMN_ALIASES.iter().find(|(k, _)| *k == key)?.1;
            headers.iter().position(|h| aliases.contains(&h.as_str()))
        };

        let f_col = column("f").ok_or_else(|| AnchorImportError::MissingColumn("f".to_string()))?;
        let ic_col = column("ic");
        let rt_col = column("rt");
        let s_col = column("s");

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            if row.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            let cell = |col: Option<usize>| -> String {
                col.and_then(|c| row.get(c))
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default()
            };
            records.push(RawAnchorRecord {
                ic: cell(ic_col),
                rt: cell(rt_col),
                s: cell(s_col),
                f: cell(Some(f_col)),
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_import_long_headers() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Item_Code,Reagent_Role,Serial,Full_Code").unwrap();
        writeln!(file, "010,R2,9439,01012240930100994395").unwrap();
        writeln!(file, ",,,").unwrap();
        writeln!(file, "010,R1,xx,NOT-A-CODE").unwrap();
        file.flush().unwrap();

        let samples = CsvAnchorImporter.import(file.path()).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].reagent_role, "R2");
        assert_eq!(samples[0].serial, "9439");
    }

    #[test]
    fn test_missing_code_column() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "ic,rt,s").unwrap();
        writeln!(file, "010,R1,1").unwrap();
        file.flush().unwrap();

        let err = CsvAnchorImporter.import(file.path()).unwrap_err();
        assert!(matches!(err, AnchorImportError::MissingColumn(_)));
    }

    #[test]
    fn test_rejects_other_extensions() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = CsvAnchorImporter.import(file.path()).unwrap_err();
        assert!(matches!(err, AnchorImportError::UnsupportedFormat(_)));
    }
}
