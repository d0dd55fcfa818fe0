// ==========================================
// BarcodeApi 集成测试
// ==========================================
// 场景: 项目名称归一 -> 引擎生成 -> 历史记录 -> 统计
// ==========================================


use reagent_barcode::api::{ApiError, BarcodeApi, BarcodeRequest};
use reagent_barcode::catalog::ChemicalCatalog;
use reagent_barcode::config::EngineConfig;
use reagent_barcode::domain::{Confidence, MatchTier};
use reagent_barcode::repository::GenerationHistoryRepository;
use std::sync::Arc;
use test_helpers::{corpus_path, seed_engine, today, write_temp_file};

fn create_api() -> BarcodeApi {
    BarcodeApi::new(
        Arc::new(seed_engine()),
        ChemicalCatalog::builtin(),
        Arc::new(GenerationHistoryRepository::new(50)),
    )
}

fn urea_request(serial: &str) -> BarcodeRequest {
    BarcodeRequest {
        chem: Some("urea".to_string()),
        item_code: Some("000".to_string()),
        bottle_type: Some("40ml".to_string()),
        rgt_type: Some("R1".to_string()),
        lot_number: Some("009".to_string()),
        serial_number: Some(serial.to_string()),
        exp_date: Some("09/30/2024".to_string()),
        ..BarcodeRequest::default()
    }
}

#[test]
fn test_generate_by_chemical_name() {
    let api = create_api();
    let response = api.generate_at(Some(urea_request("8932")), today()).unwrap();

    assert_eq!(response.code, "01021240930200989329");
    assert_eq!(response.chemical, "UREA II GEN");
    assert_eq!(response.confidence, Confidence::Anchored);
    assert_eq!(response.match_tier, Some(MatchTier::LotExact));
    assert_eq!(response.gen_item_code, "010");
    assert_eq!(response.gen_bottle_code, "2");
    assert_eq!(response.gen_reagent_code, "1");
    assert_eq!(response.serial_number, "8932");
    assert_eq!(response.lot_number, "009");
}

#[test]
fn test_history_records_successes_only() {
    let api = create_api();
    let first = api.generate_at(Some(urea_request("8932")), today()).unwrap();
    let second = api.generate_at(Some(urea_request("8933")), today()).unwrap();

    let err = api
        .generate_at(Some(BarcodeRequest::default()), today())
        .unwrap_err();
    assert!(matches!(err, ApiError::GenerationFailed(_)));

    let history = api.history().unwrap();
    assert_eq!(history.len(), 2);
    let ids: Vec<_> = history.iter().map(|h| h.id).collect();
    assert!(ids.contains(&first.history_id));
    assert!(ids.contains(&second.history_id));

    let urea = api.history_by_chemical("UREA").unwrap();
    assert_eq!(urea.len(), 2);
    assert!(api.history_by_chemical("GLUCOSE").unwrap().is_empty());

    let stats = api.history_stats().unwrap();
    assert_eq!(stats.total_generated, 2);
    assert_eq!(stats.chemicals_count, 1);
    assert_eq!(stats.recent_count, 2);

    api.clear_history().unwrap();
    assert!(api.history().unwrap().is_empty());
}

#[test]
fn test_unknown_chemical_uses_fallback() {
    let api = create_api();
    let request = BarcodeRequest {
        chem: Some("MYSTERY".to_string()),
        item_code: Some("999".to_string()),
        bottle_code: Some("1".to_string()),
        reagent_code: Some("1".to_string()),
        lot_number: Some("123".to_string()),
        serial_number: Some("4567".to_string()),
        exp_date: Some("2025-03-10".to_string()),
        ..BarcodeRequest::default()
    };

    let response = api.generate_at(Some(request), today()).unwrap();
    assert_eq!(response.code, "99911250331612345675");
    assert_eq!(response.confidence, Confidence::Fallback);
    assert_eq!(response.chemical, "MYSTERY");
}

#[test]
fn test_definitions_and_groups() {
    let api = create_api();
    let definitions = api.definitions();
    assert!(definitions.chemicals.iter().any(|c| c.name == "TOTAL IgE"));
    assert_eq!(definitions.bottles.len(), 4);
    assert_eq!(definitions.reagents.len(), 2);

    let groups = api.calibration_groups();
    assert_eq!(groups.len(), 4);
    assert!(groups.iter().all(|g| g.is_inferred()));
}

#[test]
fn test_from_config_with_corpus_file() {
    let config_json = format!(
        r#"{{ "anchor_path": {}, "history_capacity": 5 }}"#,
        serde_json::to_string(&corpus_path()).unwrap()
    );
    let file = write_temp_file(".json", &config_json);
    let config = EngineConfig::load(file.path()).unwrap();

    let api = BarcodeApi::from_config(&config).unwrap();
    assert_eq!(api.engine().anchors().len(), 114);
}

#[test]
fn test_response_serializes_for_callers() {
    let api = create_api();
    let response = api.generate_at(Some(urea_request("8932")), today()).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["code"], "01021240930200989329");
    assert_eq!(json["confidence"], "ANCHORED");
    assert_eq!(json["match_tier"], "LOT_EXACT");
}
