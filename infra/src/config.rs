//! Configuration for the gallery stacks

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CloudFront only accepts ACM certificates issued in this region
pub const CLOUDFRONT_CERTIFICATE_REGION: &str = "us-east-1";

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value failed validation
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prefix for stack names and export names
    #[serde(default = "default_stack_prefix")]
    pub stack_prefix: String,

    /// Region both stacks are deployed to
    #[serde(default = "default_region")]
    pub region: String,

    /// Keep buckets and their photos when the stack is deleted
    #[serde(default = "default_retain_buckets")]
    pub retain_buckets: bool,

    /// Custom domain; without it the distribution keeps its generated domain
    #[serde(default)]
    pub domain: Option<DomainConfig>,

    /// Photo bucket settings
    #[serde(default)]
    pub photos: PhotosConfig,

    /// Website bucket settings
    #[serde(default)]
    pub website: WebsiteConfig,

    /// Listing function settings
    #[serde(default)]
    pub function: FunctionConfig,
}

/// Custom domain binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Apex domain name, e.g. `example.com`
    pub name: String,
}

/// Photo bucket settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotosConfig {
    /// Local directory seeded into the photo bucket
    #[serde(default = "default_photos_dir")]
    pub seed_dir: PathBuf,
}

/// Website bucket settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    /// Prebuilt frontend bundle
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

/// Listing function settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Bucket holding the function's deployment package
    ///
    /// When unset, the template takes the code location as parameters.
    #[serde(default)]
    pub code_bucket: Option<String>,

    /// Key of the deployment package zip
    #[serde(default)]
    pub code_key: Option<String>,

    /// Memory in MB
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,

    /// Timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,

    /// Instruction set of the `bootstrap` binary
    #[serde(default)]
    pub architecture: Architecture,
}

/// Lambda instruction set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// Graviton
    #[default]
    Arm64,
    /// Intel/AMD
    X86_64,
}

impl Architecture {
    /// Name used by the Lambda API
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::X86_64 => "x86_64",
        }
    }
}

fn default_stack_prefix() -> String {
    "SimpleApp".to_string()
}

fn default_region() -> String {
    CLOUDFRONT_CERTIFICATE_REGION.to_string()
}

const fn default_retain_buckets() -> bool {
    true
}

fn default_photos_dir() -> PathBuf {
    PathBuf::from("photos")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("frontend/build")
}

const fn default_memory_size() -> u32 {
    128
}

const fn default_timeout_secs() -> u32 {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stack_prefix: default_stack_prefix(),
            region: default_region(),
            retain_buckets: default_retain_buckets(),
            domain: None,
            photos: PhotosConfig::default(),
            website: WebsiteConfig::default(),
            function: FunctionConfig::default(),
        }
    }
}

impl Default for PhotosConfig {
    fn default() -> Self {
        Self {
            seed_dir: default_photos_dir(),
        }
    }
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
        }
    }
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            code_bucket: None,
            code_key: None,
            memory_size: default_memory_size(),
            timeout_secs: default_timeout_secs(),
            architecture: Architecture::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed or validated
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text cannot be parsed or validated
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the provisioning engine would otherwise reject late
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_prefix.is_empty()
            || !self.stack_prefix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid(format!(
                "stack_prefix must be non-empty and alphanumeric, got {:?}",
                self.stack_prefix
            )));
        }

        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".to_string()));
        }

        if let Some(domain) = &self.domain {
            if domain.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "domain.name must not be empty".to_string(),
                ));
            }
            if self.region != CLOUDFRONT_CERTIFICATE_REGION {
                return Err(ConfigError::Invalid(format!(
                    "a custom domain needs its certificate in {CLOUDFRONT_CERTIFICATE_REGION}, region is {}",
                    self.region
                )));
            }
        }

        match (&self.function.code_bucket, &self.function.code_key) {
            (Some(bucket), Some(key)) if bucket.is_empty() || key.is_empty() => Err(
                ConfigError::Invalid("function code location must not be empty".to_string()),
            ),
            (Some(_), None) | (None, Some(_)) => Err(ConfigError::Invalid(
                "function.code_bucket and function.code_key must be set together".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Name of the DNS/certificate stack
    #[must_use]
    pub fn dns_stack_name(&self) -> String {
        format!("{}Dns", self.stack_prefix)
    }

    /// Name of the application stack
    #[must_use]
    pub fn app_stack_name(&self) -> String {
        format!("{}Stack", self.stack_prefix)
    }
}
