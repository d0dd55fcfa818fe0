// ==========================================
// 条码引擎集成测试
// ==========================================
// 职责: 验证 匹配 -> 系数解析 -> 合成/兜底 的完整数据流
// 数据: 内置种子锚点
// ==========================================


use chrono::NaiveDate;
use reagent_barcode::domain::{
    CoefficientSource, Coefficients, Confidence, GenerationInput, GenerationResult, MatchTier,
};
use reagent_barcode::engine::{
    calibration_of, is_self_consistent, BarcodeEngine, CoefficientOverrides, EngineOptions,
};
use reagent_barcode::importer::builtin_anchors;
use test_helpers::{seed_engine, today};

fn generate(engine: &BarcodeEngine, input: GenerationInput) -> GenerationResult {
    engine.generate_at(Some(&input), today())
}

// ==========================================
// 锚定生成
// ==========================================

#[test]
fn test_next_serial_in_same_lot() {
    let engine = seed_engine();
    let result = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "009", "8932", "09/30/2024"),
    );

    let barcode = result.barcode().expect("应生成条码");
    assert_eq!(barcode.code, "01021240930200989329");
    assert_eq!(barcode.confidence, Confidence::Anchored);
    assert_eq!(barcode.match_tier, Some(MatchTier::LotExact));
    assert_eq!(barcode.anchor_code.as_deref(), Some("01021240930900989311"));
    assert_eq!(barcode.coefficient_source, Some(CoefficientSource::Inferred));
    assert!(is_self_consistent(&barcode.code, barcode.target_calibration));
}

#[test]
fn test_anchor_serial_reproduces_anchor() {
    let engine = seed_engine();
    let result = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "009", "8931", "09/30/2024"),
    );
    assert_eq!(result.code(), Some("01021240930900989311"));
}

#[test]
fn test_new_lot_uses_bottle_reagent_tier() {
    let engine = seed_engine();
    let result = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "777", "1234", "2025-06-15"),
    );

    let barcode = result.barcode().unwrap();
    assert_eq!(barcode.code, "01021250630277712344");
    assert_eq!(barcode.match_tier, Some(MatchTier::BottleReagent));
    assert_eq!(barcode.anchor_code.as_deref(), Some("01021241130001005591"));
    assert_eq!(barcode.expiry, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
}

#[test]
fn test_unknown_bottle_uses_item_only_tier() {
    let engine = seed_engine();
    let result = generate(
        &engine,
        GenerationInput::new("010", "9", "9", "009", "8932", "09/30/2024"),
    );

    let barcode = result.barcode().unwrap();
    assert_eq!(barcode.match_tier, Some(MatchTier::ItemOnly));
    // 前缀取自锚点, 而非请求中的瓶型/试剂位
    assert_eq!(&barcode.code[..5], "01021");
    assert_eq!(barcode.code, "01021240930200989329");
}

#[test]
fn test_lot_and_serial_far_from_anchor() {
    let engine = seed_engine();
    let result = generate(
        &engine,
        GenerationInput::new("034", "2", "1", "530", "0001", "2025-05-31"),
    );

    let barcode = result.barcode().unwrap();
    assert_eq!(barcode.code, "03421250531553000010");
    assert_eq!(barcode.match_tier, Some(MatchTier::BottleReagent));
    assert_eq!(barcode.anchor_code.as_deref(), Some("03421240831305186967"));
}

// ==========================================
// 兜底生成
// ==========================================

#[test]
fn test_unknown_item_code_falls_back() {
    let engine = seed_engine();
    let result = generate(
        &engine,
        GenerationInput::new("999", "1", "1", "123", "4567", "2025-03-10"),
    );

    let barcode = result.barcode().unwrap();
    assert_eq!(barcode.code, "99911250331612345675");
    assert_eq!(barcode.confidence, Confidence::Fallback);
    assert!(barcode.confidence.is_low());
    assert_eq!(barcode.match_tier, None);
    assert_eq!(barcode.anchor_code, None);
    assert_eq!(calibration_of(&barcode.code), Some(0));
}

#[test]
fn test_empty_anchor_set_always_falls_back() {
    let engine = BarcodeEngine::new(Vec::new());
    let result = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "009", "8932", "09/30/2024"),
    );
    assert_eq!(
        result.barcode().map(|b| b.confidence),
        Some(Confidence::Fallback)
    );
}

// ==========================================
// 输入归一
// ==========================================

#[test]
fn test_expiry_formats_normalize_to_month_end() {
    let engine = seed_engine();

    // dd/MM/yyyy
    let result = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "009", "8932", "13/09/2024"),
    );
    assert_eq!(result.code(), Some("01021240930200989329"));

    // 闰年二月
    let result = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "009", "8932", "2024-02-10"),
    );
    assert_eq!(result.code(), Some("01021240229200989324"));
}

#[test]
fn test_unparseable_expiry_defaults_to_current_month_end() {
    let engine = seed_engine();
    let result = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "009", "8932", "soon"),
    );

    let barcode = result.barcode().unwrap();
    assert!(barcode.expiry_defaulted);
    assert_eq!(barcode.expiry, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
    assert_eq!(&barcode.code[5..11], "260131");
}

#[test]
fn test_dirty_lot_and_serial_are_normalized() {
    let engine = seed_engine();
    let clean = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "009", "8932", "09/30/2024"),
    );
    let dirty = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "LOT-1009", "SN 108932", "09/30/2024"),
    );
    assert_eq!(clean.code(), dirty.code());
}

#[test]
fn test_blank_input_fails_without_code() {
    let engine = seed_engine();
    let result = engine.generate_at(None, today());
    assert!(!result.is_ok());
    assert_eq!(result.code(), None);

    let response = result.to_response();
    assert!(!response.ok);
    assert!(response.reason.is_some());
}

// ==========================================
// 系数覆盖
// ==========================================

#[test]
fn test_override_takes_precedence_over_inferred() {
    let mut overrides = CoefficientOverrides::new();
    overrides.insert("010", Coefficients::default());
    let engine = BarcodeEngine::with_options(
        builtin_anchors(),
        EngineOptions {
            overrides,
            ..EngineOptions::default()
        },
    );

    let result = generate(
        &engine,
        GenerationInput::new("010", "2", "1", "009", "8932", "09/30/2024"),
    );
    let barcode = result.barcode().unwrap();
    assert_eq!(barcode.coefficient_source, Some(CoefficientSource::Override));
    assert_eq!(barcode.code, "01021240930200989328");
}

// ==========================================
// 确定性与自洽性
// ==========================================

#[test]
fn test_generation_is_deterministic() {
    let engine = seed_engine();
    let input = GenerationInput::new("034", "1", "2", "519", "9765", "05/31/2025");
    let first = engine.generate_at(Some(&input), today());
    let second = engine.generate_at(Some(&input), today());
    assert_eq!(first, second);
    assert_eq!(first.code(), Some("03412250531651997656"));
}

#[test]
fn test_serial_sweep_is_self_consistent() {
    let engine = seed_engine();
    for serial in (0..10_000u32).step_by(37) {
        let input = GenerationInput::new(
            "010",
            "2",
            "1",
            "009",
            &format!("{:04}", serial),
            "09/30/2024",
        );
        let result = engine.generate_at(Some(&input), today());
        let barcode = result.barcode().expect("应生成条码");
        assert_eq!(barcode.code.len(), 20);
        assert!(barcode.code.chars().all(|c| c.is_ascii_digit()));
        assert!(is_self_consistent(&barcode.code, barcode.target_calibration));
    }
}

#[test]
fn test_engine_shared_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let engine = Arc::new(seed_engine());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let input = GenerationInput::new(
                    "010",
                    "2",
                    "1",
                    "009",
                    &format!("89{:02}", 30 + i),
                    "09/30/2024",
                );
                engine.generate_at(Some(&input), today()).is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
