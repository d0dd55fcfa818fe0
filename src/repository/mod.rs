// ==========================================
// 试剂条码合成系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 生成历史的存取与统计
// ==========================================

pub mod error;
pub mod history_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use history_repo::{GenerationHistoryRepository, HistoryEntry, HistoryStats, NewHistoryEntry};
