use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{WorkspaceError, WorkspaceResult};

/// Settings file picked up from the working directory when present.
pub const DEFAULT_SETTINGS_FILE: &str = "phonelist.toml";

/// Defaults applied when neither a flag nor a prompt supplies a value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub workers: Option<usize>,
    pub batch_size: Option<usize>,
    pub area_code_digits: Option<usize>,
    pub subscriber_digits: Option<usize>,
    pub plus_prefix: Option<bool>,
    pub out_dir: Option<PathBuf>,
    pub area_table: Option<PathBuf>,
    pub run_dir: Option<PathBuf>,
}

/// Load `explicit`, or the default settings file if it exists.
///
/// An explicit path that does not exist is an error; a missing default file
/// just yields empty settings.
pub fn load_settings(explicit: Option<&Path>) -> WorkspaceResult<Settings> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(WorkspaceError::Invalid(format!(
                    "settings file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => {
            let path = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !path.exists() {
                return Ok(Settings::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = toml::from_str(&content)?;
    Ok(settings)
}
