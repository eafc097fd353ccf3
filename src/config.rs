//! Runtime configuration from the environment.

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("la variable de entorno GEMINI_API_KEY no está configurada")]
    MissingApiKey,
    #[error("no se pudo determinar el directorio de datos")]
    NoDataDir,
}

/// Startup settings. A missing API key is fatal: without it no view of the
/// dashboard can load.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub data_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SettingsError::MissingApiKey)?;

        let model =
            std::env::var("BRIGHTSTONE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let data_dir = match std::env::var("BRIGHTSTONE_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .ok_or(SettingsError::NoDataDir)?
                .join("brightstone"),
        };

        Ok(Self {
            api_key,
            model,
            data_dir,
        })
    }
}
