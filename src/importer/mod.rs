// ==========================================
// 试剂条码合成系统 - 锚点导入层
// ==========================================
// 职责: 锚点文件读取、清洗、去重、持久化
// 支持: JSON (持久化格式), CSV (表格导出)
// ==========================================

// 模块声明
pub mod anchor_cleaner;
pub mod anchor_source_trait;
pub mod anchor_store;
pub mod csv_importer;
pub mod error;
pub mod seed;

// 重导出核心类型
pub use anchor_cleaner::AnchorCleaner;
pub use anchor_store::{AnchorStore, JsonAnchorSource};
pub use csv_importer::CsvAnchorImporter;
pub use error::{AnchorImportError, AnchorImportResult};
pub use seed::builtin_anchors;

// 重导出 Trait 接口
pub use anchor_source_trait::AnchorSource;
