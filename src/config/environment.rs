//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Todas las variables tienen un valor por defecto salvo las credenciales.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errores de configuración
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("OPENAI_API_KEY must be set in {0} (or set MOCK_IMAGE_GENERATION=true)")]
    MissingApiKey(String),
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// Prefijo de todas las rutas (ej: /app/calendar)
    pub base_path: String,
    /// Directorio con meta.json e images/
    pub data_dir: PathBuf,
    pub car_catalog_path: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub mock_image_generation: bool,
    pub generation_timeout: Option<Duration>,
    pub card_font_dir: Option<PathBuf>,
    /// Vacío = CORS permisivo
    pub cors_origins: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            base_path: "/app/calendar".to_string(),
            data_dir: PathBuf::from("public/data"),
            car_catalog_path: None,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            mock_image_generation: false,
            generation_timeout: None,
            card_font_dir: None,
            cors_origins: Vec::new(),
        }
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            expected: "boolean",
            value: value.to_string(),
        }),
    }
}

/// Normalizar el base path: "/x/y" sin barra final, "" para la raíz
fn normalize_base_path(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

impl EnvironmentConfig {
    /// Cargar desde las variables de entorno del proceso
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    /// Cargar desde un mapa de variables (permite testear sin tocar el entorno)
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port: u16 = match get("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                expected: "port number",
                value,
            })?,
            None => defaults.port,
        };

        let generation_timeout = match get("GENERATION_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                    name: "GENERATION_TIMEOUT_SECS",
                    expected: "number of seconds",
                    value: value.clone(),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let mock_image_generation = match get("MOCK_IMAGE_GENERATION") {
            Some(value) => parse_bool("MOCK_IMAGE_GENERATION", &value)?,
            None => defaults.mock_image_generation,
        };

        let config = Self {
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            port,
            host: get("HOST").unwrap_or(defaults.host),
            base_path: get("BASE_PATH")
                .map(|v| normalize_base_path(&v))
                .unwrap_or(defaults.base_path),
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            car_catalog_path: get("CAR_CATALOG_PATH").map(PathBuf::from),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            mock_image_generation,
            generation_timeout,
            card_font_dir: get("CARD_FONT_DIR").map(PathBuf::from),
            cors_origins: get("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.use_mock_generator() && self.openai_api_key.is_none() {
            return Err(ConfigError::MissingApiKey(self.environment.clone()));
        }
        Ok(())
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Mock si se pide explícitamente, o en desarrollo sin API key
    pub fn use_mock_generator(&self) -> bool {
        self.mock_image_generation || (self.is_development() && self.openai_api_key.is_none())
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("meta.json")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// Prefijo público de las imágenes servidas
    pub fn images_url_prefix(&self) -> String {
        format!("{}/data/images", self.base_path)
    }
}
