use crate::models::{Preset, PresetDocument};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors raised by preset bookkeeping
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Preset name cannot be empty")]
    EmptyName,

    #[error("Preset '{0}' not found")]
    NotFound(String),

    #[error("No presets found")]
    NoPresets,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Reads and writes the preset JSON document.
///
/// The whole document is rewritten on every mutation. Writes go to a temp
/// file in the same directory that is then persisted over the target, and
/// read-modify-write cycles within this process are serialized.
pub struct PresetStore {
    path: Utf8PathBuf,
    write_lock: Mutex<()>,
}

impl PresetStore {
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the document. A missing file yields an empty document.
    pub fn load(&self) -> Result<PresetDocument> {
        if !self.path.exists() {
            tracing::debug!("Preset file not found at {}, starting empty", self.path);
            return Ok(PresetDocument::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read presets: {}", self.path))?;
        if contents.trim().is_empty() {
            return Ok(PresetDocument::default());
        }

        let document: PresetDocument = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse presets: {}", self.path))?;
        Ok(document)
    }

    /// Write the whole document, pretty-printed with four-space indentation.
    pub fn save(&self, document: &PresetDocument) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        document
            .serialize(&mut serializer)
            .context("Failed to serialize presets to JSON")?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create preset directory: {}", dir))?;
        }

        let mut temp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir))?;
        temp.write_all(&buffer)
            .and_then(|_| temp.flush())
            .with_context(|| format!("Failed to write presets: {}", self.path))?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to replace presets: {}", self.path))?;

        tracing::debug!("Saved presets to {}", self.path);
        Ok(())
    }

    /// Load, mutate and save the document as one serialized step.
    pub fn modify<F, R>(&self, f: F) -> Result<R, PresetError>
    where
        F: FnOnce(&mut PresetDocument) -> Result<R, PresetError>,
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut document = self.load()?;
        let result = f(&mut document)?;
        self.save(&document)?;
        Ok(result)
    }

    /// Preset names stored for `root`, in stored order
    pub fn list(&self, root: &str) -> Result<Vec<String>> {
        Ok(self.load()?.names(root))
    }

    pub fn get(&self, root: &str, name: &str) -> Result<Preset, PresetError> {
        if !self.exists() {
            return Err(PresetError::NoPresets);
        }
        self.load()?
            .get(root, name)
            .cloned()
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    /// Store a snapshot under (root, name), silently replacing any previous one.
    pub fn save_preset(&self, root: &str, name: &str, preset: Preset) -> Result<(), PresetError> {
        if name.trim().is_empty() {
            return Err(PresetError::EmptyName);
        }
        let (enabled, disabled) = (preset.enabled.len(), preset.disabled.len());
        self.modify(|doc| {
            doc.insert(root, name, preset);
            Ok(())
        })?;
        tracing::info!(
            "Saved preset '{}' for {} ({} enabled, {} disabled)",
            name,
            root,
            enabled,
            disabled
        );
        Ok(())
    }

    /// Replace an existing preset. Fails if it was never saved.
    pub fn update_preset(&self, root: &str, name: &str, preset: Preset) -> Result<(), PresetError> {
        if name.trim().is_empty() {
            return Err(PresetError::EmptyName);
        }
        if !self.exists() {
            return Err(PresetError::NoPresets);
        }
        self.modify(|doc| {
            if doc.get(root, name).is_none() {
                return Err(PresetError::NotFound(name.to_string()));
            }
            doc.insert(root, name, preset);
            Ok(())
        })?;
        tracing::info!("Updated preset '{}' for {}", name, root);
        Ok(())
    }

    pub fn delete_preset(&self, root: &str, name: &str) -> Result<Preset, PresetError> {
        if name.trim().is_empty() {
            return Err(PresetError::EmptyName);
        }
        if !self.exists() {
            return Err(PresetError::NoPresets);
        }
        let removed = self.modify(|doc| {
            doc.remove(root, name)
                .ok_or_else(|| PresetError::NotFound(name.to_string()))
        })?;
        tracing::info!("Deleted preset '{}' for {}", name, root);
        Ok(removed)
    }

    /// Rewrite `old` to `new` in every preset under `root`.
    ///
    /// Returns the number of presets updated. The file is left untouched when
    /// nothing references `old`.
    pub fn rename_references(&self, root: &str, old: &str, new: &str) -> Result<usize> {
        if !self.exists() {
            return Ok(0);
        }

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut document = self.load()?;
        let touched = document.rename_references(root, old, new);
        if touched > 0 {
            self.save(&document)?;
            tracing::info!(
                "Renamed '{}' -> '{}' in {} preset(s) for {}",
                old,
                new,
                touched,
                root
            );
        }
        Ok(touched)
    }
}
