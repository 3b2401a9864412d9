use anyhow::{Context, Result};
use camino::Utf8Path;
use regex::Regex;
use std::fs;

/// Reads hotkey bindings from a mod's configuration file.
///
/// Every line of the form `key = <value>` (the `key` token matched
/// case-insensitively) contributes its trimmed value, in file order and with
/// duplicates preserved.
pub struct MetadataReader {
    file_name: String,
    key_pattern: Regex,
}

impl MetadataReader {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            key_pattern: Regex::new(r"(?i)^\s*key\s*=\s*(.*)$").expect("Invalid key regex"),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Extract the bound keys from configuration text
    pub fn parse_keys(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .filter_map(|line| self.key_pattern.captures(line))
            .filter_map(|caps| caps.get(1))
            .map(|value| value.as_str().trim().to_string())
            .collect()
    }

    /// Read the bound keys of the mod folder at `mod_dir`.
    ///
    /// A missing configuration file yields no keys.
    pub fn read_keys(&self, mod_dir: &Utf8Path) -> Result<Vec<String>> {
        let path = mod_dir.join(&self.file_name);
        if !path.is_file() {
            tracing::debug!("No {} in {}", self.file_name, mod_dir);
            return Ok(Vec::new());
        }

        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path))?;
        let content = String::from_utf8_lossy(&bytes);
        let keys = self.parse_keys(&content);

        tracing::debug!("Found {} key binding(s) in {}", keys.len(), path);
        Ok(keys)
    }
}
