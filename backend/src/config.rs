use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "LUNGSCAN_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/lungscan.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub image: ImageConfig,
    pub inference: InferenceConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Load the model before accepting connections and refuse to start on failure.
    pub preload: bool,
    pub apply_softmax: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Target size as `[height, width]`.
    pub size: [u32; 2],
    pub channels: u32,
    pub preprocessing: PreprocessingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub resize_method: ResizeMethod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMethod {
    #[default]
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeMethod {
    pub fn filter(self) -> FilterType {
        match self {
            ResizeMethod::Nearest => FilterType::Nearest,
            ResizeMethod::Triangle => FilterType::Triangle,
            ResizeMethod::CatmullRom => FilterType::CatmullRom,
            ResizeMethod::Gaussian => FilterType::Gaussian,
            ResizeMethod::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub timeout_secs: u64,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_confidence_default: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            static_dir: PathBuf::from("frontend/static"),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("trained_lung_cancer_model.onnx"),
            preload: true,
            apply_softmax: false,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            size: [350, 350],
            channels: 3,
            preprocessing: PreprocessingConfig::default(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_confidence_default: true,
        }
    }
}

impl ImageConfig {
    pub fn height(&self) -> u32 {
        self.size[0]
    }

    pub fn width(&self) -> u32 {
        self.size[1]
    }

    /// NHWC shape of a single-image batch.
    pub fn input_shape(&self) -> [usize; 4] {
        [
            1,
            self.height() as usize,
            self.width() as usize,
            self.channels as usize,
        ]
    }
}

impl AppConfig {
    /// Reads the file named by `LUNGSCAN_CONFIG`, or the default path.
    /// A missing default file yields the built-in defaults.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                Ok((Self::from_file(&path)?, Some(path)))
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Ok((Self::from_file(&path)?, Some(path)))
                } else {
                    Ok((Self::default(), None))
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.height() == 0 || self.image.width() == 0 {
            return Err(ConfigError::Invalid(format!(
                "image.size must be non-zero, got {:?}",
                self.image.size
            )));
        }
        if self.image.channels != 3 {
            return Err(ConfigError::Invalid(format!(
                "image.channels must be 3, got {}",
                self.image.channels
            )));
        }
        if self.inference.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "inference.timeout_secs must be positive".to_string(),
            ));
        }
        if self.inference.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "inference.max_upload_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
