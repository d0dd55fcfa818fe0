// ==========================================
// 试剂条码合成系统 - 条码生成 API
// ==========================================
// 职责: 项目名称归一、瓶型/试剂标签映射、调用引擎、记录历史
// 流程: 请求 -> 目录解析 -> BarcodeEngine::generate -> 历史记录 -> 响应
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::catalog::{CatalogDefinitions, ChemicalCatalog};
use crate::config::EngineConfig;
use crate::domain::calibration::CalibrationGroup;
use crate::domain::outcome::GenerationResult;
use crate::domain::request::GenerationInput;
use crate::domain::types::{Confidence, MatchTier};
use crate::engine::BarcodeEngine;
use crate::repository::{GenerationHistoryRepository, HistoryEntry, HistoryStats, NewHistoryEntry};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const UNSET_ITEM_CODE: &str = "000";

/// 生成请求 (所有字段可选, 不做校验)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeRequest {
    /// 项目名称或别名
    #[serde(default)]
    pub chem: Option<String>,
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default)]
    pub bottle_code: Option<String>,
    #[serde(default)]
    pub reagent_code: Option<String>,
    /// 瓶型标签 (如 "40ml"), bottle_code 缺省时使用
    #[serde(default)]
    pub bottle_type: Option<String>,
    /// 试剂标签 (如 "R2"), reagent_code 缺省时使用
    #[serde(default)]
    pub rgt_type: Option<String>,
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub exp_date: Option<String>,
}

/// 生成响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeResponse {
    pub code: String,
    pub confidence: Confidence,
    pub match_tier: Option<MatchTier>,
    /// 归一后的项目名称
    pub chemical: String,
    /// 条码实际使用的项目号/瓶型/试剂位
    pub gen_item_code: String,
    pub gen_bottle_code: String,
    pub gen_reagent_code: String,
    pub lot_number: String,
    /// 条码内 4 位序列号
    pub serial_number: String,
    pub expiry: NaiveDate,
    pub history_id: Uuid,
    pub generated_at: DateTime<Utc>,
}

// ==========================================
// BarcodeApi - 条码生成 API
// ==========================================
pub struct BarcodeApi {
    engine: Arc<BarcodeEngine>,
    catalog: ChemicalCatalog,
    history: Arc<GenerationHistoryRepository>,
}

impl BarcodeApi {
    pub fn new(
        engine: Arc<BarcodeEngine>,
        catalog: ChemicalCatalog,
        history: Arc<GenerationHistoryRepository>,
    ) -> Self {
        Self {
            engine,
            catalog,
            history,
        }
    }

    /// 按配置构建引擎、目录与历史仓储
    pub fn from_config(config: &EngineConfig) -> ApiResult<Self> {
        let engine = BarcodeEngine::from_config(config)?;
        Ok(Self::new(
            Arc::new(engine),
            ChemicalCatalog::builtin(),
            Arc::new(GenerationHistoryRepository::new(config.history_capacity)),
        ))
    }

    pub fn engine(&self) -> &Arc<BarcodeEngine> {
        &self.engine
    }

    /// 生成条码
    pub fn generate(&self, request: Option<BarcodeRequest>) -> ApiResult<BarcodeResponse> {
        self.generate_at(request, Local::now().date_naive())
    }

    /// 生成条码
    ///
    /// # 参数
    /// - request: 调用方请求 (None 直接返回 InvalidInput)
    /// - today: 效期无法解析时的回退日期
    ///
    /// # 返回
    /// - Ok(BarcodeResponse): 生成成功并已记录历史
    /// - Err(ApiError::GenerationFailed): 引擎返回失败
    #[instrument(skip(self, request), fields(today = %today))]
    pub fn generate_at(
        &self,
        request: Option<BarcodeRequest>,
        today: NaiveDate,
    ) -> ApiResult<BarcodeResponse> {
        let request = request.ok_or_else(|| ApiError::InvalidInput("请求不能为空".to_string()))?;
        let (chemical, input) = self.resolve_input(&request);

        let barcode = match self.engine.generate_at(Some(&input), today) {
            GenerationResult::Generated(barcode) => barcode,
            GenerationResult::Failed { reason } => {
                warn!(reason = %reason, "条码生成失败");
                return Err(ApiError::GenerationFailed(reason));
            }
        };

        let serial = barcode.code.get(15..19).unwrap_or_default().to_string();
        let entry = NewHistoryEntry {
            code: barcode.code.clone(),
            chemical: chemical.clone(),
            item_code: input.item_code.clone().unwrap_or_default(),
            bottle_code: input.bottle_code.clone().unwrap_or_default(),
            reagent_code: input.reagent_code.clone().unwrap_or_default(),
            lot_number: request.lot_number.clone().unwrap_or_default(),
            serial_number: serial.clone(),
            expiry: Some(barcode.expiry),
        };
        let generated_at = Utc::now();
        let history_id = self.history.record_at(entry, generated_at)?;

        info!(
            code = %barcode.code,
            chemical = %chemical,
            confidence = %barcode.confidence,
            "条码生成成功"
        );

        Ok(BarcodeResponse {
            gen_item_code: barcode.code.get(0..3).unwrap_or_default().to_string(),
            gen_bottle_code: barcode.code.get(3..4).unwrap_or_default().to_string(),
            gen_reagent_code: barcode.code.get(4..5).unwrap_or_default().to_string(),
            code: barcode.code,
            confidence: barcode.confidence,
            match_tier: barcode.match_tier,
            chemical,
            lot_number: request.lot_number.unwrap_or_default(),
            serial_number: serial,
            expiry: barcode.expiry,
            history_id,
            generated_at,
        })
    }

    /// 项目名称归一 + 标签映射
    ///
    /// 项目号为空或为 "000" 时使用目录中的默认项目号
    fn resolve_input(&self, request: &BarcodeRequest) -> (String, GenerationInput) {
        let mut chemical = request.chem.clone().unwrap_or_default();
        let mut item_code = non_blank(&request.item_code);

        if let Some(item) = request
            .chem
            .as_deref()
            .and_then(|name| self.catalog.find_by_any_name(name))
        {
            chemical = item.name.clone();
            if item_code.as_deref().map_or(true, |c| c.trim() == UNSET_ITEM_CODE) {
                item_code = Some(item.default_code.clone());
            }
        }

        let bottle_code = non_blank(&request.bottle_code).or_else(|| {
            non_blank(&request.bottle_type).map(|label| self.catalog.bottle_code_for(&label))
        });
        let reagent_code = non_blank(&request.reagent_code).or_else(|| {
            non_blank(&request.rgt_type).map(|label| self.catalog.reagent_code_for(&label))
        });

        let input = GenerationInput {
            item_code,
            bottle_code,
            reagent_code,
            lot_number: request.lot_number.clone(),
            serial_number: request.serial_number.clone(),
            exp_date: request.exp_date.clone(),
        };
        (chemical, input)
    }

    /// 目录定义
    pub fn definitions(&self) -> CatalogDefinitions {
        self.catalog.definitions()
    }

    /// 当前推断的校准分组
    pub fn calibration_groups(&self) -> Vec<CalibrationGroup> {
        self.engine.calibration_groups().values().cloned().collect()
    }

    // ==========================================
    // 历史查询
    // ==========================================

    pub fn history(&self) -> ApiResult<Vec<HistoryEntry>> {
        Ok(self.history.list()?)
    }

    pub fn history_by_chemical(&self, chemical: &str) -> ApiResult<Vec<HistoryEntry>> {
        Ok(self.history.list_by_chemical(chemical)?)
    }

    pub fn history_stats(&self) -> ApiResult<HistoryStats> {
        Ok(self.history.stats()?)
    }

    pub fn clear_history(&self) -> ApiResult<()> {
        Ok(self.history.clear()?)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
