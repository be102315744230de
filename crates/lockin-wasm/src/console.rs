//! `log` backend that writes to the browser console.

use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;

const PREFIX: &str = "[Lock In]";

static LOGGER: ConsoleLogger = ConsoleLogger;
static INIT: Once = Once::new();

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = JsValue::from_str(&format!("{} {}", PREFIX, record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger once; later calls only change the level.
pub fn init(level: LevelFilter) {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_err() {
            web_sys::console::warn_1(&JsValue::from_str("[Lock In] A logger is already installed"));
        }
    });
    log::set_max_level(level);
}
