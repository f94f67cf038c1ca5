//! Exercises the dropdown/autocomplete strategy ladder against a scripted
//! fake driver: native selection, programmatic scan, type-and-pick, container
//! scan, text locator, and the unverified keyboard fallback.

mod common;

use serde_json::json;

use common::{descriptor, markers, Call, FakeDriver};
use formpilot::fill::dropdown::fill_dropdown;
use formpilot::models::{FieldKind, FillOutcome, FillStrategy};

fn country_select() -> formpilot::models::FieldDescriptor {
    let mut field = descriptor("country", "Country", FieldKind::Select);
    field.dropdown_like = true;
    field
}

// ============================================================================
// Stage 1/2: native selects
// ============================================================================

#[tokio::test]
async fn test_native_select_by_label_short_circuits_ladder() {
    let driver = FakeDriver::new()
        .with_select_options(&[("us", "United States"), ("ie", "Ireland")])
        .respond(markers::NATIVE_CONFIRM, json!(true));

    let attempt = fill_dropdown(&driver, &country_select(), "United States").await;

    assert_eq!(attempt.outcome, FillOutcome::Filled);
    assert_eq!(attempt.strategy, Some(FillStrategy::NativeSelect));

    // No typing, no keyboard navigation, no custom-widget scripts.
    assert!(driver.typed_texts().is_empty());
    assert!(!driver.pressed_keys().contains(&"ArrowDown".to_string()));
    assert!(driver
        .evaluated_scripts()
        .iter()
        .all(|s| !s.contains(markers::VISIBLE_OPTION_CLICK)));
    // Focus moves on afterwards.
    assert!(driver.pressed_keys().contains(&"Tab".to_string()));
}

#[tokio::test]
async fn test_refilling_same_value_is_idempotent() {
    let driver = FakeDriver::new()
        .with_select_options(&[("us", "United States")])
        .respond(markers::NATIVE_CONFIRM, json!(true));
    let field = country_select();

    let first = fill_dropdown(&driver, &field, "United States").await;
    let second = fill_dropdown(&driver, &field, "United States").await;

    assert_eq!(first.outcome, FillOutcome::Filled);
    assert_eq!(second.outcome, FillOutcome::Filled);
    assert_eq!(second.strategy, Some(FillStrategy::NativeSelect));

    // The second call must short-circuit in the native stages: stages 3-6
    // never run on either pass.
    assert!(driver.typed_texts().is_empty());
    assert!(!driver.pressed_keys().contains(&"ArrowDown".to_string()));
    for script in driver.evaluated_scripts() {
        assert!(!script.contains(markers::VISIBLE_OPTION_CLICK));
        assert!(!script.contains(markers::CONTAINER_SCAN));
        assert!(!script.contains(markers::TEXT_LOCATOR));
    }
}

#[tokio::test]
async fn test_native_falls_back_to_programmatic_option_scan() {
    // No option label equals the value, so select-by-label and select-by-value
    // fail and the loose-matching scan takes over.
    let driver = FakeDriver::new()
        .with_select_options(&[("bsc", "Bachelor's Degree or equivalent")])
        .respond(markers::OPTION_SCAN, json!(true));

    let attempt = fill_dropdown(&driver, &country_select(), "Bachelors").await;

    assert_eq!(attempt.outcome, FillOutcome::Filled);
    assert_eq!(attempt.strategy, Some(FillStrategy::OptionScan));
    let calls = driver.calls();
    assert!(calls.iter().any(|c| matches!(c, Call::SelectByLabel { .. })));
    assert!(calls.iter().any(|c| matches!(c, Call::SelectByValue { .. })));
}

// ============================================================================
// Stage 3-5: custom widgets
// ============================================================================

fn custom_widget() -> formpilot::models::FieldDescriptor {
    let mut field = descriptor("location", "Are you located in Ireland?", FieldKind::Text);
    field.dropdown_like = true;
    field
}

#[tokio::test]
async fn test_custom_widget_type_and_pick() {
    let driver = FakeDriver::new()
        .respond(markers::OPEN_PROBE, json!(true))
        .respond(markers::VISIBLE_OPTION_CLICK, json!(true))
        .respond(markers::VERIFICATION, json!({"success": true}));

    let attempt = fill_dropdown(&driver, &custom_widget(), "Ireland").await;

    assert_eq!(attempt.outcome, FillOutcome::Filled);
    assert_eq!(attempt.strategy, Some(FillStrategy::TypeAndPick));

    // The widget was cleared and the filter term typed into it.
    let calls = driver.calls();
    assert!(calls.iter().any(|c| matches!(c, Call::Clear(_))));
    assert_eq!(driver.typed_texts(), vec!["Ireland".to_string()]);
}

#[tokio::test]
async fn test_filter_term_truncated_to_fifteen_chars() {
    let driver = FakeDriver::new()
        .respond(markers::OPEN_PROBE, json!(true))
        .respond(markers::VISIBLE_OPTION_CLICK, json!(true))
        .respond(markers::VERIFICATION, json!({"success": true}));

    let long_value = "Not applicable - I do not live in Ireland";
    let attempt = fill_dropdown(&driver, &custom_widget(), long_value).await;

    assert_eq!(attempt.outcome, FillOutcome::Filled);
    assert_eq!(driver.typed_texts(), vec!["Not applicable ".to_string()]);
}

#[tokio::test]
async fn test_container_scan_after_primary_search_misses() {
    let driver = FakeDriver::new()
        .respond(markers::OPEN_PROBE, json!(true))
        .respond(markers::CONTAINER_SCAN, json!(true))
        .respond(markers::VERIFICATION, json!({"success": true}));

    let attempt = fill_dropdown(&driver, &custom_widget(), "Ireland").await;

    assert_eq!(attempt.outcome, FillOutcome::Filled);
    assert_eq!(attempt.strategy, Some(FillStrategy::ContainerScan));
}

#[tokio::test]
async fn test_text_locator_as_final_dom_search() {
    let driver = FakeDriver::new()
        .respond(markers::OPEN_PROBE, json!(true))
        .respond(markers::TEXT_LOCATOR, json!(true))
        .respond(markers::VERIFICATION, json!({"success": true}));

    let attempt = fill_dropdown(&driver, &custom_widget(), "Ireland").await;

    assert_eq!(attempt.outcome, FillOutcome::Filled);
    assert_eq!(attempt.strategy, Some(FillStrategy::TextLocator));
}

// ============================================================================
// Stage 6 and verification outcomes
// ============================================================================

#[tokio::test]
async fn test_keyboard_fallback_reports_unverified_success() {
    // Every search comes up empty: the machine sends ArrowDown + Enter and
    // optimistically assumes success, reported as explicitly unverified.
    let driver = FakeDriver::new();

    let attempt = fill_dropdown(&driver, &custom_widget(), "Ireland").await;

    assert_eq!(attempt.outcome, FillOutcome::Unverified);
    assert_eq!(attempt.strategy, Some(FillStrategy::Keyboard));

    let keys = driver.pressed_keys();
    assert!(keys.contains(&"ArrowDown".to_string()));
    assert!(keys.contains(&"Enter".to_string()));
    assert!(keys.contains(&"Tab".to_string()));
}

#[tokio::test]
async fn test_inconclusive_verification_reports_unverified() {
    // The click lands but no read-back signal contains the value, and the
    // re-check after the settle delay stays unclear.
    let driver = FakeDriver::new()
        .respond(markers::OPEN_PROBE, json!(true))
        .respond(markers::VISIBLE_OPTION_CLICK, json!(true))
        .respond(markers::VERIFICATION, json!({"success": false}));

    let attempt = fill_dropdown(&driver, &custom_widget(), "Ireland").await;

    assert_eq!(attempt.outcome, FillOutcome::Unverified);
    assert_eq!(attempt.strategy, Some(FillStrategy::TypeAndPick));

    // The re-check did run.
    assert!(driver
        .evaluated_scripts()
        .iter()
        .any(|s| s.contains(markers::FINAL_CHECK)));
}

#[tokio::test]
async fn test_recheck_can_rescue_unclear_verification() {
    let driver = FakeDriver::new()
        .respond(markers::OPEN_PROBE, json!(true))
        .respond(markers::VISIBLE_OPTION_CLICK, json!(true))
        .respond(markers::VERIFICATION, json!({"success": false}))
        .respond(markers::FINAL_CHECK, json!(true));

    let attempt = fill_dropdown(&driver, &custom_widget(), "Ireland").await;

    assert_eq!(attempt.outcome, FillOutcome::Filled);
    assert_eq!(attempt.strategy, Some(FillStrategy::TypeAndPick));
}
