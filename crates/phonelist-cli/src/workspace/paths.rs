use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Directory generated output names are placed in.
pub const DEFAULT_OUT_DIR: &str = "PhoneListGenerator";

/// `<out_dir>/<US|Country{cc}>_<state|Custom>_<YYYY-MM-DD>.txt`
pub fn output_file_name(
    out_dir: &Path,
    country_code: &str,
    state: Option<&str>,
    date: NaiveDate,
) -> PathBuf {
    let country = if country_code == "1" {
        "US".to_string()
    } else {
        format!("Country{country_code}")
    };
    let state = state.map(safe_label).unwrap_or_else(|| "Custom".to_string());
    out_dir.join(format!("{country}_{state}_{}.txt", date.format("%Y-%m-%d")))
}

/// Keep alphanumerics, spaces and dashes; everything else becomes `_`.
pub fn safe_label(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == ' ' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
