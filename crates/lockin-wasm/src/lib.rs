//! WebAssembly bindings for Lock In
//!
//! The content script owns storage and passes the current settings as a JSON
//! string on every call. Nothing is cached on this side.

use chrono::{NaiveDate, NaiveDateTime};
use wasm_bindgen::prelude::*;

use lockin_core::{
    decision,
    guard::{Enforcement, NavigationEvent, NavigationGuard, ObserverKind},
    schedule::{is_within_schedule_at, Clock},
    types::{Schedule, Settings},
    url,
};

mod console;

// =============================================================================
// Clock
// =============================================================================

/// Local wall-clock time from the JS `Date` object.
struct JsClock;

impl Clock for JsClock {
    fn now(&self) -> NaiveDateTime {
        let date = js_sys::Date::new_0();
        NaiveDate::from_ymd_opt(date.get_full_year() as i32, date.get_month() + 1, date.get_date())
            .and_then(|d| d.and_hms_opt(date.get_hours(), date.get_minutes(), date.get_seconds()))
            .unwrap_or_default()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_settings(settings_json: &str) -> Result<Settings, JsValue> {
    Settings::from_json(settings_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_observer(observer: &str) -> Result<ObserverKind, JsValue> {
    ObserverKind::from_str(observer)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown observer: {}", observer)))
}

/// Set a property on a fresh plain object, which cannot fail.
fn set(target: &js_sys::Object, key: &str, value: &JsValue) {
    js_sys::Reflect::set(target, &key.into(), value).ok();
}

// =============================================================================
// Exports
// =============================================================================

/// Route `log` output to the browser console. Safe to call more than once.
#[wasm_bindgen]
pub fn init_logging(debug: bool) {
    console::init(if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
}

/// Whether `url` should be blocked now. Undecodable settings never block.
#[wasm_bindgen]
pub fn should_block(url: &str, settings_json: &str) -> bool {
    match Settings::from_json(settings_json) {
        Ok(settings) => decision::should_block_with_clock(url, &settings, &JsClock),
        Err(e) => {
            log::warn!("Ignoring unreadable settings: {}", e);
            false
        }
    }
}

/// Decision for `url` with the reason and matched site/rule indices.
#[wasm_bindgen]
pub fn evaluate(url: &str, settings_json: &str) -> Result<JsValue, JsValue> {
    let settings = parse_settings(settings_json)?;
    let verdict = decision::evaluate(url, &settings, &JsClock);

    let result = js_sys::Object::new();
    set(&result, "blocked", &JsValue::from(verdict.is_block()));
    set(&result, "reason", &JsValue::from_str(verdict.reason.as_str()));
    set(
        &result,
        "siteIndex",
        &verdict.site_index.map_or(JsValue::NULL, |i| JsValue::from(i as u32)),
    );
    set(
        &result,
        "ruleIndex",
        &verdict.rule_index.map_or(JsValue::NULL, |i| JsValue::from(i as u32)),
    );

    Ok(result.into())
}

#[wasm_bindgen]
pub fn is_within_schedule(schedule_json: &str) -> Result<bool, JsValue> {
    let schedule: Schedule =
        serde_json::from_str(schedule_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(is_within_schedule_at(&schedule, JsClock.now()))
}

/// Observer name for this browser: `navigate-event` or `history-patch`.
#[wasm_bindgen]
pub fn select_observer(has_navigation_api: bool) -> String {
    ObserverKind::select(has_navigation_api).as_str().to_string()
}

/// Event names the observer should subscribe to.
#[wasm_bindgen]
pub fn observer_events(observer: &str) -> Result<js_sys::Array, JsValue> {
    let kind = parse_observer(observer)?;
    Ok(kind.events().map(|e| JsValue::from_str(e.as_str())).collect())
}

/// Check a navigation and describe the overlay to render, if any.
///
/// Unknown observer or event names are errors. Undecodable settings never
/// block.
#[wasm_bindgen]
pub fn on_navigation(observer: &str, event: &str, url: &str, settings_json: &str) -> Result<JsValue, JsValue> {
    let kind = parse_observer(observer)?;
    let event = NavigationEvent::from_str(event)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown navigation event: {}", event)))?;

    let enforcement = match Settings::from_json(settings_json) {
        Ok(settings) => NavigationGuard::new(kind).on_navigation(event, url, &settings, &JsClock),
        Err(e) => {
            log::warn!("Ignoring unreadable settings: {}", e);
            Enforcement::Allow
        }
    };

    let result = js_sys::Object::new();
    match enforcement {
        Enforcement::Allow => {
            set(&result, "block", &JsValue::FALSE);
        }
        Enforcement::Block(overlay) => {
            set(&result, "block", &JsValue::TRUE);
            set(&result, "message", &JsValue::from_str(&overlay.message));
            set(&result, "flash", &JsValue::from(overlay.flash));
        }
    }

    Ok(result.into())
}

/// Human-readable problems with the settings, for the options page.
#[wasm_bindgen]
pub fn validate_settings(settings_json: &str) -> Result<js_sys::Array, JsValue> {
    let settings = parse_settings(settings_json)?;
    Ok(settings
        .validate()
        .iter()
        .map(|issue| JsValue::from_str(&issue.to_string()))
        .collect())
}

#[wasm_bindgen]
pub fn normalize_domain(input: &str) -> String {
    url::normalize_domain(input)
}

#[wasm_bindgen]
pub fn default_settings() -> Result<String, JsValue> {
    Settings::default()
        .to_json_pretty()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
