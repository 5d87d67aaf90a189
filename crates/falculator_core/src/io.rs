//! Config persistence: one UTF-8 JSON document per config.
//!
//! Both directions sanitize: a loaded document is normalized before the
//! caller sees it, and a save normalizes first so any document on disk
//! round-trips unchanged. Writes go through a write-then-rename so an
//! interrupted save never corrupts the previous document.

use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::ConfigIoError;
use crate::sanitize::SanitizeReport;

/// Load and sanitize a config document. The report carries whatever the
/// normalization changed; the caller decides whether to accept it.
pub fn load_config(path: &Path) -> Result<(Config, SanitizeReport), ConfigIoError> {
    let text = fs::read_to_string(path)?;
    let mut config: Config = serde_json::from_str(&text)?;
    let report = config.sanitize();
    Ok((config, report))
}

/// Sanitize and persist a config document atomically.
pub fn save_config(config: &mut Config, path: &Path) -> Result<SanitizeReport, ConfigIoError> {
    let report = config.sanitize();
    let json = serde_json::to_string_pretty(config)?;
    atomic_write(path, &json)?;
    Ok(report)
}

/// Write-then-rename; atomic on POSIX filesystems.
fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)
}
