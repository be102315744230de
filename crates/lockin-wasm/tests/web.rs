use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use lockin_wasm::{
    default_settings, evaluate, is_within_schedule, normalize_domain, observer_events, on_navigation,
    select_observer, should_block, validate_settings,
};

// All-day schedule so results do not depend on when the tests run.
const SETTINGS: &str = r#"{
    "blockedSites": [
        {"domain": "example.com", "listType": "blacklist",
         "paths": [{"value": "/shorts/*", "type": "glob"}]},
        {"domain": "news.com", "listType": "whitelist",
         "paths": [{"value": "/sport", "type": "exact"}]}
    ],
    "schedule": {"startTime": "09:00", "endTime": "17:00", "days": [], "allDay": true},
    "flashEnabled": false,
    "customBlockMessage": "Focus"
}"#;

fn get(value: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn blocks_per_list_mode() {
    assert!(should_block("https://example.com/shorts/1", SETTINGS));
    assert!(!should_block("https://example.com/watch", SETTINGS));
    assert!(should_block("https://www.news.com/politics", SETTINGS));
    assert!(!should_block("https://news.com/sport/football", SETTINGS));
}

#[wasm_bindgen_test]
fn fails_open_on_bad_input() {
    assert!(!should_block("invalid-url", SETTINGS));
    assert!(!should_block("https://example.com/shorts/1", "{not json"));
}

#[wasm_bindgen_test]
fn evaluate_reports_reason() {
    let result = evaluate("https://example.com/shorts/1", SETTINGS).unwrap();
    assert_eq!(get(&result, "blocked"), JsValue::TRUE);
    assert_eq!(get(&result, "reason").as_string().unwrap(), "blacklist-hit");
    assert_eq!(get(&result, "siteIndex").as_f64(), Some(0.0));
    assert_eq!(get(&result, "ruleIndex").as_f64(), Some(0.0));

    let result = evaluate("https://other.org/", SETTINGS).unwrap();
    assert_eq!(get(&result, "reason").as_string().unwrap(), "no-matching-site");
    assert!(get(&result, "siteIndex").is_null());

    assert!(evaluate("https://example.com", "{not json").is_err());
}

#[wasm_bindgen_test]
fn all_day_schedule_is_active() {
    assert!(is_within_schedule(r#"{"startTime":"09:00","endTime":"09:01","days":[],"allDay":true}"#).unwrap());
    assert!(!is_within_schedule(r#"{"startTime":"09:00","endTime":"17:00","days":[]}"#).unwrap());
}

#[wasm_bindgen_test]
fn observer_selection() {
    assert_eq!(select_observer(true), "navigate-event");
    assert_eq!(select_observer(false), "history-patch");

    let events = observer_events("navigate-event").unwrap();
    assert_eq!(events.length(), 2);
    assert!(observer_events("polling").is_err());
}

#[wasm_bindgen_test]
fn navigation_returns_overlay() {
    let result = on_navigation("history-patch", "pushstate", "https://example.com/shorts/9", SETTINGS).unwrap();
    assert_eq!(get(&result, "block"), JsValue::TRUE);
    assert_eq!(get(&result, "message").as_string().unwrap(), "Focus");
    assert_eq!(get(&result, "flash"), JsValue::FALSE);

    let result = on_navigation("navigate-event", "pushstate", "https://example.com/shorts/9", SETTINGS).unwrap();
    assert_eq!(get(&result, "block"), JsValue::FALSE);

    assert!(on_navigation("history-patch", "scroll", "https://example.com", SETTINGS).is_err());

    let result = on_navigation("history-patch", "pushstate", "https://example.com/shorts/9", "{bad").unwrap();
    assert_eq!(get(&result, "block"), JsValue::FALSE);
}

#[wasm_bindgen_test]
fn null_fields_keep_blocking() {
    let settings = r#"{
        "blockedSites": [{"domain": "example.com", "paths": null, "listType": null}],
        "schedule": {"allDay": true},
        "customBlockMessage": null
    }"#;
    assert!(should_block("https://example.com/feed", settings));

    let result = on_navigation("history-patch", "load", "https://example.com/feed", settings).unwrap();
    assert_eq!(get(&result, "block"), JsValue::TRUE);
    assert_eq!(get(&result, "message").as_string().unwrap(), "YOU NEED TO LOCK IN");
}

#[wasm_bindgen_test]
fn options_helpers() {
    assert_eq!(normalize_domain("https://www.YouTube.com/shorts"), "youtube.com");

    let issues = validate_settings(r#"{"blockedSites":[{"domain":"a.com","paths":[{"value":"(","type":"regex"}]}]}"#)
        .unwrap();
    assert_eq!(issues.length(), 1);

    let defaults = default_settings().unwrap();
    assert!(defaults.contains("\"startTime\": \"09:00\""));
}
