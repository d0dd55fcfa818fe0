// ==========================================
// 试剂条码合成系统 - 引擎配置
// ==========================================
// 存储: JSON 文件, 所有字段可缺省
// 覆写: 环境变量 > 配置文件 > 默认值
// ==========================================

use crate::domain::calibration::Coefficients;
use crate::domain::layout::{MIN_INFERENCE_LEN, MIN_MATCH_LEN};
use crate::engine::barcode_engine::EngineOptions;
use crate::engine::overrides::CoefficientOverrides;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// 配置键与环境变量
pub mod config_keys {
    // 环境变量
    pub const ENV_CONFIG_PATH: &str = "REAGENT_BARCODE_CONFIG";
    pub const ENV_ANCHOR_PATH: &str = "REAGENT_BARCODE_ANCHORS";

    // 配置文件字段
    pub const ANCHOR_PATH: &str = "anchor_path";
    pub const HISTORY_CAPACITY: &str = "history_capacity";
    pub const DEFAULT_COEFFICIENTS: &str = "default_coefficients";
    pub const COEFFICIENT_OVERRIDES: &str = "coefficient_overrides";
    pub const MIN_MATCH_LEN: &str = "min_match_len";
    pub const MIN_INFERENCE_LEN: &str = "min_inference_len";
}

/// 默认锚点文件 (相对工作目录)
pub const DEFAULT_ANCHOR_PATH: &str = "data/barcode_anchors.json";
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    #[error("配置值无效 (key: {key}): {message}")]
    InvalidValue { key: String, message: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 单个项目号的系数覆盖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoefficientOverride {
    pub item_code: String,
    pub p_slopes: [u8; 4],
    pub k: u8,
    pub m: u8,
    #[serde(default)]
    pub lot_slope: u8,
}

impl CoefficientOverride {
    pub fn coefficients(&self) -> Coefficients {
        Coefficients {
            p_slopes: self.p_slopes,
            k: self.k,
            m: self.m,
            lot_slope: self.lot_slope,
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 持久化锚点文件路径
    #[serde(default = "default_anchor_path")]
    pub anchor_path: PathBuf,

    /// 生成历史保留条数
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// 样本不足时的系数
    #[serde(default)]
    pub default_coefficients: Coefficients,

    /// 项目号系数覆盖表
    #[serde(default)]
    pub coefficient_overrides: Vec<CoefficientOverride>,

    #[serde(default = "default_min_match_len")]
    pub min_match_len: usize,

    #[serde(default = "default_min_inference_len")]
    pub min_inference_len: usize,
}

fn default_anchor_path() -> PathBuf {
    PathBuf::from(DEFAULT_ANCHOR_PATH)
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_min_match_len() -> usize {
    MIN_MATCH_LEN
}

fn default_min_inference_len() -> usize {
    MIN_INFERENCE_LEN
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            anchor_path: default_anchor_path(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_coefficients: Coefficients::default(),
            coefficient_overrides: Vec::new(),
            min_match_len: MIN_MATCH_LEN,
            min_inference_len: MIN_INFERENCE_LEN,
        }
    }
}

impl EngineConfig {
    /// 从 JSON 文件加载并校验
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 加载失败时记录告警并使用默认配置
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "已加载引擎配置");
                config
            }
            Err(e) => {
                warn!(error = %e, "引擎配置不可用, 使用默认配置");
                Self::default()
            }
        }
    }

    /// 按环境变量 / 默认配置路径解析配置
    ///
    /// 顺序: REAGENT_BARCODE_CONFIG -> default_config_path() (存在时) -> 默认值
    pub fn resolve() -> Self {
        if let Some(path) = env_path(config_keys::ENV_CONFIG_PATH) {
            return Self::load_or_default(&path);
        }
        let path = default_config_path();
        if path.exists() {
            return Self::load_or_default(&path);
        }
        Self::default()
    }

    /// 实际使用的锚点路径 (REAGENT_BARCODE_ANCHORS 优先)
    pub fn resolved_anchor_path(&self) -> PathBuf {
        env_path(config_keys::ENV_ANCHOR_PATH).unwrap_or_else(|| self.anchor_path.clone())
    }

    /// 校验系数范围与长度阈值
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.default_coefficients.is_valid() {
            return Err(ConfigError::InvalidValue {
                key: config_keys::DEFAULT_COEFFICIENTS.to_string(),
                message: "系数必须在 0~9 之间".to_string(),
            });
        }
        for entry in &self.coefficient_overrides {
            if entry.item_code.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: config_keys::COEFFICIENT_OVERRIDES.to_string(),
                    message: "item_code 不能为空".to_string(),
                });
            }
            if !entry.coefficients().is_valid() {
                return Err(ConfigError::InvalidValue {
                    key: config_keys::COEFFICIENT_OVERRIDES.to_string(),
                    message: format!("项目号 {} 的系数必须在 0~9 之间", entry.item_code),
                });
            }
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: config_keys::HISTORY_CAPACITY.to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 转换为引擎参数
    pub fn engine_options(&self) -> ConfigResult<EngineOptions> {
        self.validate()?;
        let overrides: CoefficientOverrides = self
            .coefficient_overrides
            .iter()
            .map(|o| (o.item_code.trim().to_string(), o.coefficients()))
            .collect();
        Ok(EngineOptions {
            min_match_len: self.min_match_len,
            min_inference_len: self.min_inference_len,
            default_coefficients: self.default_coefficients,
            overrides,
        })
    }
}

/// 默认配置文件路径
///
/// 用户配置目录下的 reagent-barcode/config.json, 无法获取时使用当前目录
pub fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("reagent-barcode").join("config.json"),
        None => PathBuf::from("./reagent_barcode_config.json"),
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.anchor_path, PathBuf::from("data/barcode_anchors.json"));
        assert_eq!(config.history_capacity, 100);
    }

    #[test]
    fn test_load_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"coefficient_overrides":[{{"item_code":"034","p_slopes":[0,0,3,0],"k":1,"m":6,"lot_slope":9}}]}}"#
        )
        .unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        let options = config.engine_options().unwrap();
        let c = options.overrides.get("034").unwrap();
        assert_eq!(c.p_slopes, [0, 0, 3, 0]);
        assert_eq!((c.k, c.m, c.lot_slope), (1, 6, 9));
    }

    #[test]
    fn test_rejects_out_of_range_override() {
        let config = EngineConfig {
            coefficient_overrides: vec![CoefficientOverride {
                item_code: "010".to_string(),
                p_slopes: [3, 0, 12, 0],
                k: 1,
                m: 0,
                lot_slope: 0,
            }],
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::ParseError(_))
        ));
        assert_eq!(EngineConfig::load_or_default(file.path()), EngineConfig::default());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("config.json") || path.ends_with("reagent_barcode_config.json"));
    }
}
