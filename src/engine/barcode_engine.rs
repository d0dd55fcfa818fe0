// ==========================================
// 试剂条码合成系统 - 条码引擎
// ==========================================
// 职责: 编排 请求清洗 -> 锚点匹配 -> 系数解析 -> 合成/兜底
// 锚点在构造时注入, 校准分组首次使用时推断并缓存 (OnceLock)
// 红线: 引擎边界只返回 GenerationResult, 不向调用方抛出 panic
// ==========================================

use crate::config::EngineConfig;
use crate::domain::anchor::AnchorSample;
use crate::domain::calibration::{CalibrationGroup, Coefficients, GroupKey};
use crate::domain::layout::{CODE_LEN, MIN_INFERENCE_LEN, MIN_MATCH_LEN};
use crate::domain::outcome::{GeneratedBarcode, GenerationResult};
use crate::domain::request::{GenerationInput, GenerationRequest};
use crate::domain::types::Confidence;
use crate::engine::checksum::is_self_consistent;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::fallback::FallbackGenerator;
use crate::engine::inference::{CoefficientInference, InferenceConfig};
use crate::engine::matcher::{AnchorMatcher, MatchQuery, MatcherConfig};
use crate::engine::overrides::CoefficientOverrides;
use crate::engine::synthesizer::Synthesizer;
use crate::importer::AnchorStore;
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use tracing::{debug, error, info, instrument};

/// 引擎参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub min_match_len: usize,
    pub min_inference_len: usize,
    pub default_coefficients: Coefficients,
    pub overrides: CoefficientOverrides,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_match_len: MIN_MATCH_LEN,
            min_inference_len: MIN_INFERENCE_LEN,
            default_coefficients: Coefficients::default(),
            overrides: CoefficientOverrides::new(),
        }
    }
}

// ==========================================
// BarcodeEngine - 条码引擎
// ==========================================
pub struct BarcodeEngine {
    anchors: Vec<AnchorSample>,
    options: EngineOptions,
    matcher: AnchorMatcher,
    inference: CoefficientInference,
    groups: OnceLock<BTreeMap<GroupKey, CalibrationGroup>>,
}

impl BarcodeEngine {
    /// 以默认参数创建引擎
    pub fn new(anchors: Vec<AnchorSample>) -> Self {
        Self::with_options(anchors, EngineOptions::default())
    }

    /// 创建引擎
    ///
    /// # 参数
    /// - anchors: 锚点列表 (加载顺序即匹配平局时的优先顺序)
    /// - options: 引擎参数
    pub fn with_options(anchors: Vec<AnchorSample>, options: EngineOptions) -> Self {
        let matcher = AnchorMatcher::new(MatcherConfig {
            min_match_len: options.min_match_len,
        });
        let inference = CoefficientInference::new(InferenceConfig {
            min_inference_len: options.min_inference_len,
            defaults: options.default_coefficients,
        });
        Self {
            anchors,
            options,
            matcher,
            inference,
            groups: OnceLock::new(),
        }
    }

    /// 按配置加载锚点并创建引擎
    ///
    /// 锚点加载失败时回退到内置种子, 仅配置无效时返回错误
    #[instrument(skip(config), fields(anchor_path = %config.resolved_anchor_path().display()))]
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let options = config.engine_options()?;
        let store = AnchorStore::load(&config.resolved_anchor_path());
        info!(
            anchor_count = store.len(),
            override_count = options.overrides.len(),
            "条码引擎初始化完成"
        );
        Ok(Self::with_options(store.into_samples(), options))
    }

    pub fn anchors(&self) -> &[AnchorSample] {
        &self.anchors
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// 校准分组 (首次调用时推断)
    pub fn calibration_groups(&self) -> &BTreeMap<GroupKey, CalibrationGroup> {
        self.groups
            .get_or_init(|| self.inference.infer_all(&self.anchors))
    }

    pub fn calibration_group(&self, item_code: &str, reagent_role: &str) -> Option<&CalibrationGroup> {
        self.calibration_groups()
            .get(&GroupKey::new(item_code, reagent_role))
    }

    /// 去掉指定条码后的新引擎 (参数不变)
    pub fn without_anchor(&self, full_code: &str) -> BarcodeEngine {
        let anchors = self
            .anchors
            .iter()
            .filter(|a| a.full_code != full_code)
            .cloned()
            .collect();
        BarcodeEngine::with_options(anchors, self.options.clone())
    }

    /// 生成条码 (效期回退日期取本地今天)
    pub fn generate(&self, input: Option<&GenerationInput>) -> GenerationResult {
        self.generate_at(input, Local::now().date_naive())
    }

    /// 按调用面参数生成条码
    pub fn generate_from_parts(
        &self,
        item_code: &str,
        bottle_code: &str,
        reagent_code: &str,
        lot: &str,
        serial: &str,
        expiry: &str,
    ) -> GenerationResult {
        let input = GenerationInput::new(item_code, bottle_code, reagent_code, lot, serial, expiry);
        self.generate(Some(&input))
    }

    /// 生成条码
    ///
    /// # 参数
    /// - input: 调用方输入 (None 或全部为空时直接失败)
    /// - today: 效期无法解析时的回退日期
    ///
    /// # 返回
    /// - GenerationResult: 成功或带原因的失败, 内部错误与 panic 均转换为失败
    #[instrument(skip(self, input), fields(today = %today))]
    pub fn generate_at(&self, input: Option<&GenerationInput>, today: NaiveDate) -> GenerationResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_generate(input, today)));
        match outcome {
            Ok(Ok(barcode)) => GenerationResult::Generated(barcode),
            Ok(Err(err)) => {
                error!(error = %err, "条码生成失败");
                GenerationResult::failed(err.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "条码生成过程中发生异常");
                GenerationResult::failed(format!("引擎内部错误: {}", message))
            }
        }
    }

    fn try_generate(
        &self,
        input: Option<&GenerationInput>,
        today: NaiveDate,
    ) -> EngineResult<GeneratedBarcode> {
        let input = match input {
            Some(input) if !input.is_blank() => input,
            _ => return Err(EngineError::InvalidInput("请求不能为空".to_string())),
        };

        let request = GenerationRequest::from_input(input, today);
        if request.expiry_defaulted {
            debug!(exp_date = ?input.exp_date, "效期无法解析, 回退到当月最后一天");
        }

        let query = MatchQuery::from(&request);
        let Some(matched) = self.matcher.find_closest(&self.anchors, &query) else {
            info!(item_code = %request.item_code, "项目号无锚点, 使用兜底生成");
            let out = FallbackGenerator::new().generate(&request);
            let code = self.verify(out.code, out.target_calibration)?;
            return Ok(GeneratedBarcode {
                code,
                confidence: Confidence::Fallback,
                target_calibration: out.target_calibration,
                match_tier: None,
                anchor_code: None,
                coefficient_source: None,
                expiry: request.expiry,
                expiry_defaulted: request.expiry_defaulted,
            });
        };

        let key = GroupKey::new(&matched.anchor.item_code, &matched.anchor.reagent_role);
        let (coefficients, source) = self.options.overrides.resolve(
            &key,
            self.calibration_groups(),
            self.options.default_coefficients,
        );
        debug!(
            tier = %matched.tier,
            anchor = %matched.anchor.full_code,
            distance = matched.distance,
            group = %key,
            source = %source,
            "锚点匹配完成"
        );

        let out = Synthesizer::new().synthesize(&request, matched.anchor, &coefficients)?;
        let code = self.verify(out.code, out.target_calibration)?;
        Ok(GeneratedBarcode {
            code,
            confidence: Confidence::Anchored,
            target_calibration: out.target_calibration,
            match_tier: Some(matched.tier),
            anchor_code: Some(matched.anchor.full_code.clone()),
            coefficient_source: Some(source),
            expiry: request.expiry,
            expiry_defaulted: request.expiry_defaulted,
        })
    }

    /// 长度与校准值自检
    fn verify(&self, code: String, target: u8) -> EngineResult<String> {
        if code.len() != CODE_LEN || !is_self_consistent(&code, target) {
            return Err(EngineError::SelfCheckFailed { code, target });
        }
        Ok(code)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知异常".to_string()
    }
}
