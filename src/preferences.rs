use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(anyhow!("Unknown theme `{}`", other)),
        }
    }
}

/// A saved choice wins; otherwise follow the system color scheme.
pub fn resolve_theme(saved: Option<Theme>, system_prefers_dark: bool) -> Theme {
    match saved {
        Some(theme) => theme,
        None if system_prefers_dark => Theme::Dark,
        None => Theme::Light,
    }
}

pub trait PreferenceStore {
    fn load_theme(&self) -> Result<Option<Theme>>;
    fn save_theme(&mut self, theme: Theme) -> Result<()>;
}

/// Flips `current`, persists the new value and returns it.
pub fn toggle_theme<S: PreferenceStore + ?Sized>(store: &mut S, current: Theme) -> Result<Theme> {
    let next = current.toggled();
    store.save_theme(next)?;
    Ok(next)
}

/// Preferences kept as a flat JSON object on disk. Unknown keys survive a save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}

impl PreferenceStore for JsonFileStore {
    fn load_theme(&self) -> Result<Option<Theme>> {
        let values = self.read_all()?;
        match values.get(THEME_KEY) {
            None => Ok(None),
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(theme) => Ok(Some(theme)),
                Err(e) => {
                    log::warn!("Ignoring stored theme {}: {}", value, e);
                    Ok(None)
                }
            },
        }
    }

    fn save_theme(&mut self, theme: Theme) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(THEME_KEY.to_string(), serde_json::to_value(theme)?);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&values)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::debug!("Saved theme {} to {}", theme, self.path.display());
        Ok(())
    }
}
