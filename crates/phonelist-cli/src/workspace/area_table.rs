use std::collections::BTreeMap;
use std::path::Path;

use super::WorkspaceResult;

/// Local table of area codes keyed by state, e.g. `{ "TX": ["210", "214"] }`.
#[derive(Debug, Clone, Default)]
pub struct AreaTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl AreaTable {
    pub fn load(path: &Path) -> WorkspaceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: BTreeMap<String, Vec<String>> = serde_json::from_str(&content)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: BTreeMap<String, Vec<String>>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(state, codes)| (state.trim().to_uppercase(), codes))
            .collect();
        Self { entries }
    }

    /// Look a state up ignoring case. Returns the canonical key and its codes.
    pub fn lookup(&self, state: &str) -> Option<(&str, &[String])> {
        let key = state.trim().to_uppercase();
        self.entries
            .get_key_value(&key)
            .map(|(state, codes)| (state.as_str(), codes.as_slice()))
    }

    #[cfg(test)]
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
