// ==========================================
// 试剂条码合成系统 - 命令行入口
// ==========================================
// 子命令: generate / validate / groups / import-anchors / definitions
// 配置: REAGENT_BARCODE_CONFIG 或默认配置路径
// ==========================================

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use reagent_barcode::api::{export_report_csv, BarcodeApi, BarcodeRequest, ValidationApi};
use reagent_barcode::config::EngineConfig;
use reagent_barcode::engine::ValidationMode;
use reagent_barcode::importer::{AnchorStore, CsvAnchorImporter};
use reagent_barcode::logging;

#[derive(Parser)]
#[command(name = "reagent-barcode", version, about = "试剂瓶条码合成工具")]
struct Cli {
    /// 输出 JSON 结构化日志
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 合成一个条码
    Generate(GenerateArgs),
    /// 以锚点回放验证引擎
    Validate(ValidateArgs),
    /// 列出推断的校准分组
    Groups,
    /// 导入 CSV 锚点并写入 JSON 锚点文件
    ImportAnchors(ImportAnchorsArgs),
    /// 列出项目/瓶型/试剂目录
    Definitions,
}

#[derive(Parser)]
struct GenerateArgs {
    /// 项目名称或别名 (如 UREA)
    #[arg(long)]
    chem: Option<String>,
    /// 3 位项目号
    #[arg(long)]
    item_code: Option<String>,
    /// 瓶型码或瓶型标签 (如 2 或 40ml)
    #[arg(long)]
    bottle: Option<String>,
    /// 试剂码或试剂标签 (如 1 或 R1)
    #[arg(long)]
    reagent: Option<String>,
    /// 批号
    #[arg(long)]
    lot: Option<String>,
    /// 序列号
    #[arg(long)]
    serial: Option<String>,
    /// 效期 (MM/dd/yyyy, dd/MM/yyyy 或 yyyy-MM-dd)
    #[arg(long)]
    exp: Option<String>,
}

#[derive(Parser)]
struct ValidateArgs {
    /// 逐个剔除锚点后回放
    #[arg(long)]
    leave_one_out: bool,
    /// 报告 CSV 输出路径
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
    /// 额外运行序列号自洽性扫描 (步长)
    #[arg(long, value_name = "STEP")]
    sweep: Option<usize>,
}

#[derive(Parser)]
struct ImportAnchorsArgs {
    /// CSV 锚点文件
    #[arg(value_name = "CSV")]
    csv: PathBuf,
    /// JSON 锚点文件 (已存在时合并)
    #[arg(value_name = "JSON")]
    json: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{}", reagent_barcode::APP_NAME);
    tracing::info!("系统版本: {}", reagent_barcode::VERSION);
    tracing::info!("==================================================");

    let config = EngineConfig::resolve();
    tracing::info!("使用锚点文件: {}", config.resolved_anchor_path().display());

    match cli.command {
        Commands::Generate(args) => run_generate(&config, args),
        Commands::Validate(args) => run_validate(&config, args),
        Commands::Groups => run_groups(&config),
        Commands::ImportAnchors(args) => run_import(args),
        Commands::Definitions => run_definitions(&config),
    }
}

fn run_generate(config: &EngineConfig, args: GenerateArgs) -> Result<()> {
    let api = BarcodeApi::from_config(config).context("初始化条码 API 失败")?;
    let (bottle_code, bottle_type) = split_code_or_label(args.bottle);
    let (reagent_code, rgt_type) = split_code_or_label(args.reagent);
    let request = BarcodeRequest {
        chem: args.chem,
        item_code: args.item_code,
        bottle_code,
        reagent_code,
        bottle_type,
        rgt_type,
        lot_number: args.lot,
        serial_number: args.serial,
        exp_date: args.exp,
    };

    let response = api.generate(Some(request))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_validate(config: &EngineConfig, args: ValidateArgs) -> Result<()> {
    let api = BarcodeApi::from_config(config).context("初始化条码 API 失败")?;
    let validation = ValidationApi::new(Arc::clone(api.engine()));
    let mode = if args.leave_one_out {
        ValidationMode::LeaveOneOut
    } else {
        ValidationMode::InSample
    };
    let today = Local::now().date_naive();

    let report = validation.run(mode, today);
    println!(
        "{}: {}/{} 通过 ({:.1}%)",
        report.mode,
        report.passed,
        report.total,
        report.pass_rate() * 100.0
    );
    for failure in report.failures() {
        println!(
            "  [失败] {}/{} 序列号 {}: 期望 {} 实际 {}",
            failure.item_code,
            failure.reagent_role,
            failure.serial,
            failure.expected,
            failure
                .actual
                .as_deref()
                .or(failure.reason.as_deref())
                .unwrap_or("-")
        );
    }

    if let Some(path) = args.csv {
        let file = File::create(&path)
            .with_context(|| format!("无法创建报告文件: {}", path.display()))?;
        let rows = export_report_csv(&report, file)?;
        println!("报告已写入 {} ({} 行)", path.display(), rows);
    }

    if let Some(step) = args.sweep {
        let sweep = validation.sweep(step, today);
        println!("自洽性扫描: 检查 {} 个条码, 失败 {} 个", sweep.checked, sweep.failures.len());
        if !sweep.is_clean() {
            bail!("自洽性扫描发现不一致条码: {:?}", sweep.failures);
        }
    }
    Ok(())
}

fn run_groups(config: &EngineConfig) -> Result<()> {
    let api = BarcodeApi::from_config(config).context("初始化条码 API 失败")?;
    println!("{}", serde_json::to_string_pretty(&api.calibration_groups())?);
    Ok(())
}

fn run_import(args: ImportAnchorsArgs) -> Result<()> {
    let imported = CsvAnchorImporter
        .import(&args.csv)
        .with_context(|| format!("导入锚点失败: {}", args.csv.display()))?;
    let mut store = AnchorStore::load(&args.json);
    let before = store.len();
    let added = store.merge(imported);
    store
        .save_json(&args.json)
        .with_context(|| format!("写入锚点文件失败: {}", args.json.display()))?;
    println!(
        "锚点导入完成: 原有 {} 条, 新增 {} 条, 写入 {}",
        before,
        added,
        args.json.display()
    );
    Ok(())
}

fn run_definitions(config: &EngineConfig) -> Result<()> {
    let api = BarcodeApi::from_config(config).context("初始化条码 API 失败")?;
    println!("{}", serde_json::to_string_pretty(&api.definitions())?);
    Ok(())
}

/// 单个数字视为代码, 其余视为标签
fn split_code_or_label(value: Option<String>) -> (Option<String>, Option<String>) {
    match value {
        Some(v) if v.len() == 1 && v.chars().all(|c| c.is_ascii_digit()) => (Some(v), None),
        Some(v) => (None, Some(v)),
        None => (None, None),
    }
}
