// ==========================================
// 试剂条码合成系统 - 回放验证 API
// ==========================================
// 职责: 运行回放验证 / 自洽性扫描, 导出 CSV 报告
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::engine::{BarcodeEngine, SweepReport, ValidationMode, ValidationReport, ValidationRunner};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// CSV 报告行
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    item_code: &'a str,
    reagent_role: &'a str,
    serial: &'a str,
    expected: &'a str,
    actual: &'a str,
    passed: bool,
    match_tier: String,
    reason: &'a str,
}

// ==========================================
// ValidationApi - 回放验证 API
// ==========================================
pub struct ValidationApi {
    engine: Arc<BarcodeEngine>,
}

impl ValidationApi {
    pub fn new(engine: Arc<BarcodeEngine>) -> Self {
        Self { engine }
    }

    /// 以引擎锚点回放
    pub fn run(&self, mode: ValidationMode, today: NaiveDate) -> ValidationReport {
        ValidationRunner::new(&self.engine, today).run(mode)
    }

    /// 序列号扫描自洽性检查
    pub fn sweep(&self, step: usize, today: NaiveDate) -> SweepReport {
        ValidationRunner::new(&self.engine, today).sweep_self_consistency(step)
    }
}

/// 导出回放报告
///
/// # 参数
/// - report: 回放报告
/// - writer: 输出目标
///
/// # 返回
/// - Ok(rows): 写出的数据行数 (不含表头)
pub fn export_report_csv<W: Write>(report: &ValidationReport, writer: W) -> ApiResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for outcome in &report.outcomes {
        csv_writer.serialize(ReportRow {
            item_code: &outcome.item_code,
            reagent_role: &outcome.reagent_role,
            serial: &outcome.serial,
            expected: &outcome.expected,
            actual: outcome.actual.as_deref().unwrap_or(""),
            passed: outcome.passed,
            match_tier: outcome
                .match_tier
                .map(|t| t.to_string())
                .unwrap_or_default(),
            reason: outcome.reason.as_deref().unwrap_or(""),
        })?;
    }
    csv_writer
        .flush()
        .map_err(|e| ApiError::ExportFailed(e.to_string()))?;
    Ok(report.outcomes.len())
}
