use std::fs;
use std::path::Path;

use lockin_core::Settings;

pub fn read_settings(path: &Path) -> Result<Settings, String> {
    Settings::load(path).map_err(|e| e.to_string())
}

/// Read the settings file, or start from defaults if it does not exist and
/// `create` is set.
pub fn read_or_default(path: &Path, create: bool) -> Result<Settings, String> {
    if create && !path.exists() {
        tracing::info!("Creating new settings file '{}'", path.display());
        return Ok(Settings::default());
    }
    read_settings(path)
}

pub fn write_settings(path: &Path, settings: &Settings) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
    }
    settings.save(path).map_err(|e| e.to_string())?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}
