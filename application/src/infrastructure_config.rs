use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::ports::outgoing::image_codec::DECODABLE_FORMATS;
use domain::image::ImageFormat;
use domain::viewport::VisibilityThreshold;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub images: ImagesConfig,
    pub workers: WorkerConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    pub source_dir: String,
    pub default_format: ImageFormat,
    pub http_cache_control: String,
    pub max_dimension: u32,
    pub max_source_bytes: usize,
    /// Lossy encoder quality, 1..=100. WebP and PNG are always lossless.
    pub encode_quality: u8,
    /// AVIF encoder speed, 1 (slowest) ..= 10.
    pub avif_speed: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerIsolation {
    #[serde(rename = "thread")]
    Thread,
    #[serde(rename = "process")]
    Process,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub isolation: WorkerIsolation,
    /// Worker executable for process isolation; defaults to `codec-worker`
    /// next to the running binary.
    pub program: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub conversion_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub public_base_url: String,
    pub visibility_threshold: f64,
    pub image_format: ImageFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "pretty")]
    Pretty,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_origin: None,
            },
            images: ImagesConfig {
                source_dir: "images".to_string(),
                default_format: ImageFormat::Avif,
                http_cache_control: "public, max-age=86400, immutable".to_string(),
                max_dimension: 8192,
                max_source_bytes: 32 * 1024 * 1024,
                encode_quality: 80,
                avif_speed: 6,
            },
            workers: WorkerConfig {
                isolation: WorkerIsolation::Thread,
                program: None,
                args: Vec::new(),
                conversion_timeout_ms: Some(30_000),
            },
            client: ClientConfig {
                public_base_url: "http://localhost:3000".to_string(),
                visibility_threshold: VisibilityThreshold::DEFAULT,
                image_format: ImageFormat::Webp,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: false,
            },
            environment: EnvironmentConfig {
                env: "development".to_string(),
            },
        }
    }
}

impl Config {
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "server host cannot be empty".to_string(),
            });
        }

        if self.images.source_dir.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "images source_dir cannot be empty".to_string(),
            });
        }

        if self.images.http_cache_control.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "http_cache_control cannot be empty".to_string(),
            });
        }

        if self.images.max_dimension == 0 || self.images.max_dimension > 65_535 {
            return Err(AppError::ConfigError {
                message: "max_dimension must be between 1 and 65535".to_string(),
            });
        }

        if self.images.max_source_bytes == 0 {
            return Err(AppError::ConfigError {
                message: "max_source_bytes must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.images.encode_quality) {
            return Err(AppError::ConfigError {
                message: "encode_quality must be between 1 and 100".to_string(),
            });
        }

        if !(1..=10).contains(&self.images.avif_speed) {
            return Err(AppError::ConfigError {
                message: "avif_speed must be between 1 and 10".to_string(),
            });
        }

        if self.workers.conversion_timeout_ms == Some(0) {
            return Err(AppError::ConfigError {
                message: "conversion_timeout_ms must be greater than 0 when set".to_string(),
            });
        }

        if let Some(program) = &self.workers.program {
            if program.trim().is_empty() {
                return Err(AppError::ConfigError {
                    message: "worker program cannot be empty when set".to_string(),
                });
            }
        }

        self.visibility_threshold()?;

        if !DECODABLE_FORMATS.contains(&self.client.image_format) {
            return Err(AppError::ConfigError {
                message: format!(
                    "client image_format '{}' cannot be decoded by the codec",
                    self.client.image_format
                ),
            });
        }

        if Url::parse(&self.client.public_base_url).is_err() {
            return Err(AppError::ConfigError {
                message: format!(
                    "public_base_url '{}' is not a valid URL",
                    self.client.public_base_url
                ),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn visibility_threshold(&self) -> AppResult<VisibilityThreshold> {
        VisibilityThreshold::new(self.client.visibility_threshold).map_err(|e| {
            AppError::ConfigError {
                message: e.to_string(),
            }
        })
    }
}
