// ==========================================
// 试剂条码合成系统 - 化学项目目录
// ==========================================
// 职责: 项目名称/别名 -> 标准名称 + 默认项目号, 瓶型/试剂标签 -> 单字符代码
// 引擎只消费项目号, 目录仅供调用面使用
// ==========================================

use serde::{Deserialize, Serialize};

/// 化学项目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalItem {
    pub name: String,
    pub default_code: String,
    /// 大写别名
    pub aliases: Vec<String>,
}

impl ChemicalItem {
    pub fn new(name: &str, default_code: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            default_code: default_code.to_string(),
            aliases: aliases.iter().map(|a| a.to_uppercase()).collect(),
        }
    }
}

/// 瓶型选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottleOption {
    pub name: String,
    pub code: String,
}

/// 试剂选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReagentOption {
    pub name: String,
    pub code: String,
}

/// 目录定义 (供前端下拉使用)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefinitions {
    pub chemicals: Vec<ChemicalItem>,
    pub bottles: Vec<BottleOption>,
    pub reagents: Vec<ReagentOption>,
}

const CHEMICALS: [(&str, &str, &[&str]); 25] = [
    ("ALAT", "015", &["ALT"]),
    ("AMYLASE", "017", &["AMYL"]),
    ("ASAT", "016", &["AST"]),
    ("CALCIUM ARSENAZO", "059", &["CA", "CA ARS"]),
    ("CHOLESTEROL", "002", &["CHOL"]),
    ("CREA ENZ", "071", &["CREA", "CREATININE"]),
    ("GGT", "022", &[]),
    ("GLUCOSE", "001", &["GLUC"]),
    ("GTT", "024", &[]),
    ("HbA1c DIRECT", "031", &["HBA1C"]),
    ("HDL DIRECT", "025", &["HDL"]),
    ("LDL DIRECT", "026", &["LDL"]),
    ("MAGNESIUM", "012", &["MG"]),
    ("PHOSPHORUS", "013", &["PHOS"]),
    ("RF", "031", &[]),
    ("TRIGLYCERIDES", "003", &["TG"]),
    ("TOTAL IgE", "034", &["IgE"]),
    ("UA II GEN", "009", &["UA", "URIC ACID"]),
    ("UREA II GEN", "010", &["UREA"]),
    ("CK", "019", &[]),
    ("CRP ULTRA", "027", &["CRP"]),
    ("BILIRUBIN DIRECT", "007", &["BIL D"]),
    ("ALP", "018", &[]),
    ("ALBUMIN", "004", &["ALB"]),
    ("TOTAL BILIRUBIN", "006", &[]),
];

const BOTTLES: [(&str, &str); 4] = [("20ml", "1"), ("40ml", "2"), ("60ml", "3"), ("Standard", "1")];

const REAGENTS: [(&str, &str); 2] = [("R1", "1"), ("R2", "2")];

const DEFAULT_CODE: &str = "1";

// ==========================================
// ChemicalCatalog - 化学项目目录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChemicalCatalog {
    chemicals: Vec<ChemicalItem>,
    bottles: Vec<BottleOption>,
    reagents: Vec<ReagentOption>,
}

impl Default for ChemicalCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChemicalCatalog {
    /// 内置目录
    pub fn builtin() -> Self {
        Self {
            chemicals: CHEMICALS
                .iter()
                .map(|(name, code, aliases)| ChemicalItem::new(name, code, aliases))
                .collect(),
            bottles: BOTTLES
                .iter()
                .map(|(name, code)| BottleOption {
                    name: name.to_string(),
                    code: code.to_string(),
                })
                .collect(),
            reagents: REAGENTS
                .iter()
                .map(|(name, code)| ReagentOption {
                    name: name.to_string(),
                    code: code.to_string(),
                })
                .collect(),
        }
    }

    pub fn chemicals(&self) -> &[ChemicalItem] {
        &self.chemicals
    }

    pub fn bottles(&self) -> &[BottleOption] {
        &self.bottles
    }

    pub fn reagents(&self) -> &[ReagentOption] {
        &self.reagents
    }

    pub fn definitions(&self) -> CatalogDefinitions {
        CatalogDefinitions {
            chemicals: self.chemicals.clone(),
            bottles: self.bottles.clone(),
            reagents: self.reagents.clone(),
        }
    }

    /// 按名称或别名查找项目
    ///
    /// 依次检查每个项目: 名称完全一致 (忽略大小写) 或任一别名出现在大写查询串中
    pub fn find_by_any_name(&self, name: &str) -> Option<&ChemicalItem> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        let upper = trimmed.to_uppercase();
        self.chemicals.iter().find(|c| {
            c.name.eq_ignore_ascii_case(trimmed) || c.aliases.iter().any(|a| upper.contains(a.as_str()))
        })
    }

    /// 瓶型标签 -> 代码 ("40ml" -> 2, "60ml" -> 3, 其余 -> 1)
    pub fn bottle_code_for(&self, label: &str) -> String {
        let trimmed = label.trim();
        if let Some(option) = self.bottles.iter().find(|b| b.name.eq_ignore_ascii_case(trimmed)) {
            return option.code.clone();
        }
        if trimmed.contains("40") {
            "2".to_string()
        } else if trimmed.contains("60") {
            "3".to_string()
        } else {
            DEFAULT_CODE.to_string()
        }
    }

    /// 试剂标签 -> 代码 ("R2" -> 2, 其余 -> 1)
    pub fn reagent_code_for(&self, label: &str) -> String {
        let trimmed = label.trim();
        if let Some(option) = self.reagents.iter().find(|r| r.name.eq_ignore_ascii_case(trimmed)) {
            return option.code.clone();
        }
        if trimmed.contains('2') {
            "2".to_string()
        } else {
            DEFAULT_CODE.to_string()
        }
    }
}
