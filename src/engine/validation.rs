// ==========================================
// 试剂条码合成系统 - 回放验证
// ==========================================
// 职责: 用已知正确的条码回放引擎, 统计精确命中率
// 模式: IN_SAMPLE (原样语料) / LEAVE_ONE_OUT (回放前移除自身)
// 每个用例的输入从条码自身解出 (项目号/瓶型/试剂位/批号/效期) + 记录的序列号
// ==========================================

use crate::domain::anchor::AnchorSample;
use crate::domain::layout::{self, CODE_LEN};
use crate::domain::request::GenerationInput;
use crate::domain::types::MatchTier;
use crate::engine::barcode_engine::BarcodeEngine;
use crate::engine::checksum::is_self_consistent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

/// 验证模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationMode {
    InSample,
    LeaveOneOut,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::InSample => write!(f, "IN_SAMPLE"),
            ValidationMode::LeaveOneOut => write!(f, "LEAVE_ONE_OUT"),
        }
    }
}

/// 回放用例
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCase {
    pub reagent_role: String,
    pub input: GenerationInput,
    pub expected: String,
}

impl ValidationCase {
    /// 从锚点构造用例; 非标准长度或无法解码时返回 None
    pub fn from_anchor(anchor: &AnchorSample) -> Option<Self> {
        let code = anchor.full_code.as_str();
        if code.len() != CODE_LEN {
            return None;
        }
        let decoded = layout::decode(code)?;
        let expiry = NaiveDate::parse_from_str(
            &format!("20{}", code.get(layout::EXPIRY_RANGE)?),
            "%Y%m%d",
        )
        .ok()?;

        let input = GenerationInput::new(
            code.get(layout::ITEM_CODE_RANGE)?,
            code.get(layout::BOTTLE_POS..layout::BOTTLE_POS + 1)?,
            code.get(layout::REAGENT_POS..layout::REAGENT_POS + 1)?,
            &format!("{:03}", decoded.lot?),
            &anchor.serial,
            &expiry.format("%Y-%m-%d").to_string(),
        );

        Some(Self {
            reagent_role: anchor.reagent_role.clone(),
            input,
            expected: anchor.full_code.clone(),
        })
    }
}

/// 单个用例的回放结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub item_code: String,
    pub reagent_role: String,
    pub serial: String,
    pub expected: String,
    pub actual: Option<String>,
    pub passed: bool,
    pub match_tier: Option<MatchTier>,
    pub reason: Option<String>,
}

/// 回放报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub mode: ValidationMode,
    pub outcomes: Vec<ValidationOutcome>,
    pub total: usize,
    pub passed: usize,
}

impl ValidationReport {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

/// 自洽性扫描报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub checked: usize,
    /// 长度不为 20 或校准值不一致的条码
    pub failures: Vec<String>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// ValidationRunner - 回放验证器
pub struct ValidationRunner<'a> {
    engine: &'a BarcodeEngine,
    today: NaiveDate,
}

impl<'a> ValidationRunner<'a> {
    /// # 参数
    /// - engine: 被验证的引擎
    /// - today: 生成时的回放日期 (保证结果可复现)
    pub fn new(engine: &'a BarcodeEngine, today: NaiveDate) -> Self {
        Self { engine, today }
    }

    /// 以引擎自身锚点为用例回放
    pub fn run(&self, mode: ValidationMode) -> ValidationReport {
        let cases: Vec<ValidationCase> = self
            .engine
            .anchors()
            .iter()
            .filter_map(ValidationCase::from_anchor)
            .collect();
        self.run_cases(&cases, mode)
    }

    /// 回放指定用例
    #[instrument(skip(self, cases), fields(case_count = cases.len(), mode = %mode))]
    pub fn run_cases(&self, cases: &[ValidationCase], mode: ValidationMode) -> ValidationReport {
        let outcomes: Vec<ValidationOutcome> = cases
            .iter()
            .map(|case| match mode {
                ValidationMode::InSample => self.replay(self.engine, case),
                ValidationMode::LeaveOneOut => {
                    let reduced = self.engine.without_anchor(&case.expected);
                    self.replay(&reduced, case)
                }
            })
            .collect();

        let passed = outcomes.iter().filter(|o| o.passed).count();
        let report = ValidationReport {
            mode,
            total: outcomes.len(),
            passed,
            outcomes,
        };
        info!(
            total = report.total,
            passed = report.passed,
            pass_rate = report.pass_rate(),
            "回放验证完成"
        );
        report
    }

    fn replay(&self, engine: &BarcodeEngine, case: &ValidationCase) -> ValidationOutcome {
        let result = engine.generate_at(Some(&case.input), self.today);
        let actual = result.code().map(str::to_string);
        let passed = actual.as_deref() == Some(case.expected.as_str());
        ValidationOutcome {
            item_code: case.input.item_code.clone().unwrap_or_default(),
            reagent_role: case.reagent_role.clone(),
            serial: case.input.serial_number.clone().unwrap_or_default(),
            expected: case.expected.clone(),
            actual,
            passed,
            match_tier: result.barcode().and_then(|b| b.match_tier),
            reason: result.reason().map(str::to_string),
        }
    }

    /// 对每个分组的首个锚点做序列号扫描, 检查长度与自洽性
    ///
    /// # 参数
    /// - step: 序列号步长 (0 视为 1)
    #[instrument(skip(self))]
    pub fn sweep_self_consistency(&self, step: usize) -> SweepReport {
        let mut report = SweepReport::default();
        for key in self.engine.calibration_groups().keys() {
            let template = self.engine.anchors().iter().find(|a| {
                a.item_code == key.item_code && a.reagent_role == key.reagent_role
            });
            let Some(case) = template.and_then(ValidationCase::from_anchor) else {
                continue;
            };

            for serial in (0..10_000u32).step_by(step.max(1)) {
                let mut input = case.input.clone();
                input.serial_number = Some(format!("{:04}", serial));
                report.checked += 1;

                let result = self.engine.generate_at(Some(&input), self.today);
                let consistent = result.barcode().map_or(false, |b| {
                    b.code.len() == CODE_LEN && is_self_consistent(&b.code, b.target_calibration)
                });
                if !consistent {
                    let label = result
                        .code()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{}/{:04}", key, serial));
                    warn!(group = %key, serial, "自洽性检查失败");
                    report.failures.push(label);
                }
            }
        }
        report
    }
}
