//! User settings persisted in `localStorage`.
//!
//! Reads never write back: a blob that fails to load stays in storage
//! untouched until the user changes a setting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STORAGE_KEY: &str = "gc_settings";

pub const SENSITIVITY_RANGE: (f64, f64) = (0.5, 3.0);
pub const LONG_PRESS_RANGE: (u32, u32) = (200, 2000);

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("localStorage is not available")]
    StorageUnavailable,
    #[error("storage access failed: {0}")]
    Storage(String),
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Storage port for the raw settings blob.
pub trait SettingsStore {
    /// `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError>;
    fn write(&self, key: &str, raw: &str) -> Result<(), SettingsError>;
}

/// The browser's `window.localStorage`.
pub struct LocalStore;

impl SettingsStore for LocalStore {
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        local_storage()?.get_item(key).map_err(js_err)
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), SettingsError> {
        local_storage()?.set_item(key, raw).map_err(js_err)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub zoom_sensitivity: f64,
    pub long_press_ms: u32,
    pub show_grid: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { zoom_sensitivity: 1.0, long_press_ms: 600, show_grid: true }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let (lo, hi) = SENSITIVITY_RANGE;
        if !(lo..=hi).contains(&self.zoom_sensitivity) {
            return Err(SettingsError::OutOfRange { field: "zoomSensitivity", value: self.zoom_sensitivity });
        }
        let (lo, hi) = LONG_PRESS_RANGE;
        if !(lo..=hi).contains(&self.long_press_ms) {
            return Err(SettingsError::OutOfRange { field: "longPressMs", value: self.long_press_ms as f64 });
        }
        Ok(())
    }

    /// Sensitivity the gesture code should use; anything unusable means 1.0.
    pub fn effective_zoom_sensitivity(&self) -> f64 {
        if self.zoom_sensitivity.is_finite() && self.zoom_sensitivity > 0.0 {
            self.zoom_sensitivity
        } else {
            1.0
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let s: Settings = serde_json::from_str(raw)?;
        s.validate()?;
        Ok(s)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reads the stored blob. A missing entry yields the defaults.
    pub fn load_from(store: &impl SettingsStore) -> Result<Self, SettingsError> {
        match store.read(STORAGE_KEY)? {
            Some(raw) => Self::from_json(&raw),
            None => Ok(Self::default()),
        }
    }

    pub fn load_or_default(store: &impl SettingsStore) -> Self {
        Self::load_from(store).unwrap_or_else(|e| {
            log::warn!("settings not loaded ({e}); using defaults");
            Self::default()
        })
    }

    /// Validates, then writes. Nothing is written when validation fails.
    pub fn save_to(&self, store: &impl SettingsStore) -> Result<(), SettingsError> {
        self.validate()?;
        store.write(STORAGE_KEY, &self.to_json()?)
    }
}

fn local_storage() -> Result<web_sys::Storage, SettingsError> {
    web_sys::window()
        .ok_or(SettingsError::StorageUnavailable)?
        .local_storage()
        .map_err(js_err)?
        .ok_or(SettingsError::StorageUnavailable)
}

fn js_err(v: wasm_bindgen::JsValue) -> SettingsError {
    SettingsError::Storage(v.as_string().unwrap_or_else(|| format!("{v:?}")))
}
