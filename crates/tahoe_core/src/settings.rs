//! Persisted user preferences.
//!
//! # Invariants
//! - A missing settings file yields [`AppSettings::default`].
//! - A corrupt settings file is logged and yields defaults; it is never fatal.
//! - Saves replace the file atomically.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name of the settings document inside the data directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    Red,
    Green,
    Purple,
    #[default]
    Azure,
}

impl AccentColor {
    /// Display color name used by renderers.
    pub fn color_name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Azure => "cyan",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "zh-Hans")]
    SimplifiedChinese,
}

macro_rules! impl_setting_value {
    ($ty:ty, $expected:literal, { $($text:literal => $variant:path),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($variant => $text,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = SettingsError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim() {
                    $($text => Ok($variant),)+
                    other => Err(SettingsError::InvalidValue {
                        value: other.to_string(),
                        expected: $expected,
                    }),
                }
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_setting_value!(Theme, "system|light|dark", {
    "system" => Theme::System,
    "light" => Theme::Light,
    "dark" => Theme::Dark,
});

impl_setting_value!(AccentColor, "red|green|purple|azure", {
    "red" => AccentColor::Red,
    "green" => AccentColor::Green,
    "purple" => AccentColor::Purple,
    "azure" => AccentColor::Azure,
});

impl_setting_value!(Language, "en|ru|de|zh-Hans", {
    "en" => Language::English,
    "ru" => Language::Russian,
    "de" => Language::German,
    "zh-Hans" => Language::SimplifiedChinese,
});

/// User preferences. Unknown or missing fields fall back to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub theme: Theme,
    pub accent_color: AccentColor,
    pub language: Language,
}

#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    InvalidValue {
        value: String,
        expected: &'static str,
    },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "settings i/o error at `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "settings serialization error: {err}"),
            Self::InvalidValue { value, expected } => {
                write!(f, "unsupported value `{value}`; expected {expected}")
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Path of the settings file inside `data_dir`.
pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE_NAME)
}

/// Loads settings from `data_dir`, falling back to defaults.
pub fn load_settings(data_dir: &Path) -> AppSettings {
    let path = settings_path(data_dir);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return AppSettings::default(),
        Err(err) => {
            warn!("event=settings_load module=settings status=error reason=io error={err}");
            return AppSettings::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("event=settings_load module=settings status=error reason=corrupt error={err}");
            AppSettings::default()
        }
    }
}

/// Writes settings into `data_dir` through a temp file and rename.
pub fn save_settings(data_dir: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    std::fs::create_dir_all(data_dir).map_err(|source| SettingsError::Io {
        path: data_dir.to_path_buf(),
        source,
    })?;

    let path = settings_path(data_dir);
    let tmp_path = path.with_extension("json.tmp");
    let payload = serde_json::to_vec_pretty(settings)?;

    std::fs::write(&tmp_path, payload).map_err(|source| SettingsError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, &path).map_err(|source| SettingsError::Io {
        path: path.clone(),
        source,
    })?;

    info!(
        "event=settings_save module=settings status=ok theme={} accent={} language={}",
        settings.theme, settings.accent_color, settings.language
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AccentColor, AppSettings, Language, Theme};

    #[test]
    fn defaults_are_system_azure_english() {
        let settings = AppSettings::default();
        assert_eq!(settings.theme, Theme::System);
        assert_eq!(settings.accent_color, AccentColor::Azure);
        assert_eq!(settings.language, Language::English);
    }

    #[test]
    fn serialized_values_use_short_names() {
        let settings = AppSettings {
            theme: Theme::Dark,
            accent_color: AccentColor::Purple,
            language: Language::SimplifiedChinese,
        };
        let json = serde_json::to_string(&settings).expect("serialize settings");
        assert_eq!(
            json,
            r#"{"theme":"dark","accent_color":"purple","language":"zh-Hans"}"#
        );
    }

    #[test]
    fn parse_values_from_cli_text() {
        assert_eq!("light".parse::<Theme>().expect("theme"), Theme::Light);
        assert_eq!("ru".parse::<Language>().expect("language"), Language::Russian);
        assert!("blue".parse::<AccentColor>().is_err());
        assert_eq!(AccentColor::Azure.color_name(), "cyan");
    }

    #[test]
    fn partial_document_fills_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"theme":"light"}"#).expect("partial settings");
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.accent_color, AccentColor::Azure);
    }
}
