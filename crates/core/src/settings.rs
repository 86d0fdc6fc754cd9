//! General dashboard preferences (theme, accent color, language).
//!
//! Updates are partial merges: absent fields keep their current value.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;

pub const VALID_THEMES: &[&str] = &["light", "dark"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    pub theme: String,
    pub primary_color: String,
    pub language: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            primary_color: "#ff6b00".to_string(),
            language: "es".to_string(),
        }
    }
}

/// Partial settings update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    #[validate(custom(function = "validate_theme"))]
    pub theme: Option<String>,
    #[validate(length(equal = 7))]
    pub primary_color: Option<String>,
    #[validate(length(min = 2, max = 5))]
    pub language: Option<String>,
}

fn validate_theme(value: &str) -> Result<(), ValidationError> {
    if VALID_THEMES.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("theme")
            .with_message(format!("theme must be one of {VALID_THEMES:?}").into()))
    }
}

#[derive(Default)]
pub struct SettingsStore {
    settings: RwLock<DashboardSettings>,
}

impl SettingsStore {
    pub fn get(&self) -> Result<DashboardSettings, CoreError> {
        self.settings
            .read()
            .map(|s| s.clone())
            .map_err(|_| CoreError::Internal("settings lock poisoned".to_string()))
    }

    pub fn merge(&self, patch: SettingsPatch) -> Result<DashboardSettings, CoreError> {
        patch.validate()?;

        let mut settings = self
            .settings
            .write()
            .map_err(|_| CoreError::Internal("settings lock poisoned".to_string()))?;
        if let Some(theme) = patch.theme {
            settings.theme = theme;
        }
        if let Some(color) = patch.primary_color {
            settings.primary_color = color;
        }
        if let Some(language) = patch.language {
            settings.language = language;
        }
        Ok(settings.clone())
    }
}
