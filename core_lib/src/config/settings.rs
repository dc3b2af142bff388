use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::files::{DocumentManagerConfig, FileValidationConfig};
use crate::files::validation::{MAX_FILENAME_LENGTH, SAMPLE_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub files: FileConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub upload_dir: PathBuf,
    pub max_file_size_mb: u64,
    pub max_filename_length: usize,
    pub sample_size_bytes: usize,
    pub create_subdirectories: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_any_origin: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            files: FileConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_seconds: 30,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            max_file_size_mb: 10,
            max_filename_length: MAX_FILENAME_LENGTH,
            sample_size_bytes: SAMPLE_SIZE,
            create_subdirectories: true,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            allow_any_origin: false,
        }
    }
}

impl FileConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Multipart framing adds overhead on top of the file itself; oversize
    /// files must still reach the validator instead of being cut off.
    pub fn max_request_body_bytes(&self) -> usize {
        usize::try_from(self.max_file_size_bytes())
            .unwrap_or(usize::MAX)
            .saturating_mul(2)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config.toml"))
    }

    /// Defaults, then `path` if it exists, then `APP_*` environment variables.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.files.max_file_size_mb == 0 {
            return Err(ConfigError::Message(
                "Max file size must be greater than 0".to_string(),
            ));
        }

        if self.files.max_filename_length == 0 {
            return Err(ConfigError::Message(
                "Max filename length must be greater than 0".to_string(),
            ));
        }

        if self.files.sample_size_bytes == 0 {
            return Err(ConfigError::Message(
                "Content sample size must be greater than 0".to_string(),
            ));
        }

        if self.cors.allow_any_origin {
            tracing::warn!("CORS allows any origin - restrict this in production!");
        }

        Ok(())
    }

    pub fn create_directories(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.files.upload_dir)?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn file_validation(&self) -> FileValidationConfig {
        FileValidationConfig {
            max_file_size: self.files.max_file_size_bytes(),
            max_filename_length: self.files.max_filename_length,
            sample_size: self.files.sample_size_bytes,
        }
    }

    pub fn document_manager(&self) -> DocumentManagerConfig {
        DocumentManagerConfig {
            storage_path: self.files.upload_dir.clone(),
            validation: self.file_validation(),
            create_subdirectories: self.files.create_subdirectories,
        }
    }
}
