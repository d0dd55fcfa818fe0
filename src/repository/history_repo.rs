// ==========================================
// 试剂条码合成系统 - 生成历史仓储
// ==========================================
// 存储: 进程内有界列表, 超出容量时淘汰最旧记录
// 红线: 引擎不直接写入, 仅调用面在生成成功后记录
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// 待记录的生成结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub code: String,
    pub chemical: String,
    pub item_code: String,
    pub bottle_code: String,
    pub reagent_code: String,
    pub lot_number: String,
    pub serial_number: String,
    pub expiry: Option<NaiveDate>,
}

/// 历史记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub code: String,
    pub chemical: String,
    pub item_code: String,
    pub bottle_code: String,
    pub reagent_code: String,
    pub lot_number: String,
    pub serial_number: String,
    pub expiry: Option<NaiveDate>,
    pub generated_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// 展示文本: 项目 瓶型 试剂 - 条码
    pub fn display_text(&self) -> String {
        format!(
            "{} {} {} - {}",
            self.chemical, self.bottle_code, self.reagent_code, self.code
        )
    }
}

/// 历史统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_generated: usize,
    pub chemicals_count: usize,
    /// 最近 24 小时内的记录数
    pub recent_count: usize,
}

// ==========================================
// GenerationHistoryRepository - 生成历史仓储
// ==========================================
pub struct GenerationHistoryRepository {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl GenerationHistoryRepository {
    /// # 参数
    /// - capacity: 最多保留的记录数 (0 视为 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn get_entries(&self) -> RepositoryResult<MutexGuard<'_, VecDeque<HistoryEntry>>> {
        self.entries
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 记录一次成功生成
    ///
    /// # 返回
    /// - Ok(id): 新记录 ID
    pub fn record(&self, entry: NewHistoryEntry) -> RepositoryResult<Uuid> {
        self.record_at(entry, Utc::now())
    }

    pub fn record_at(&self, entry: NewHistoryEntry, generated_at: DateTime<Utc>) -> RepositoryResult<Uuid> {
        if entry.code.trim().is_empty() {
            return Err(RepositoryError::ValidationError("条码不能为空".to_string()));
        }

        let id = Uuid::new_v4();
        let mut entries = self.get_entries()?;
        entries.push_back(HistoryEntry {
            id,
            code: entry.code,
            chemical: entry.chemical,
            item_code: entry.item_code,
            bottle_code: entry.bottle_code,
            reagent_code: entry.reagent_code,
            lot_number: entry.lot_number,
            serial_number: entry.serial_number,
            expiry: entry.expiry,
            generated_at,
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        Ok(id)
    }

    /// 清空历史
    pub fn clear(&self) -> RepositoryResult<()> {
        self.get_entries()?.clear();
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 全部历史 (最新在前)
    pub fn list(&self) -> RepositoryResult<Vec<HistoryEntry>> {
        let entries = self.get_entries()?;
        Ok(newest_first(entries.iter()))
    }

    /// 按项目名称筛选 (忽略大小写的子串匹配, 最新在前)
    pub fn list_by_chemical(&self, chemical: &str) -> RepositoryResult<Vec<HistoryEntry>> {
        let needle = chemical.to_lowercase();
        let entries = self.get_entries()?;
        Ok(newest_first(
            entries
                .iter()
                .filter(|e| e.chemical.to_lowercase().contains(&needle)),
        ))
    }

    pub fn find_by_id(&self, id: Uuid) -> RepositoryResult<HistoryEntry> {
        self.get_entries()?
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "HistoryEntry".to_string(),
                id: id.to_string(),
            })
    }

    pub fn stats(&self) -> RepositoryResult<HistoryStats> {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> RepositoryResult<HistoryStats> {
        let entries = self.get_entries()?;
        let since = now - Duration::hours(24);
        let chemicals: HashSet<&str> = entries.iter().map(|e| e.chemical.as_str()).collect();
        Ok(HistoryStats {
            total_generated: entries.len(),
            chemicals_count: chemicals.len(),
            recent_count: entries.iter().filter(|e| e.generated_at > since).count(),
        })
    }
}

fn newest_first<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> Vec<HistoryEntry> {
    let mut list: Vec<HistoryEntry> = entries.cloned().collect();
    // 稳定排序: 同一时间戳时后插入的在前
    list.reverse();
    list.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
    list
}
