use serde::{Deserialize, Serialize};

/// Maximum accepted upload size in bytes (16 MiB).
///
/// Enforced at the HTTP boundary; documents near this size are still
/// comfortably within what the rasterizer and assembler handle in memory.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Page rasterization settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Display width in pixels for rendered page images.
    /// Height follows from each page's aspect ratio.
    #[serde(default = "default_target_width")]
    pub target_width: u32,

    /// Supersampling factor applied before downscaling to `target_width`.
    /// Rendering large and resampling down avoids aliasing at high zoom.
    #[serde(default = "default_supersample")]
    pub supersample: f32,
}

const fn default_target_width() -> u32 {
    1500
}

const fn default_supersample() -> f32 {
    4.0
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_width: default_target_width(),
            supersample: default_supersample(),
        }
    }
}

/// Blob store connection settings.
///
/// Points at a Supabase-style storage REST endpoint; the service account
/// key is passed as a bearer token on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the storage service (e.g. "https://xyz.supabase.co")
    pub endpoint: String,

    /// Service key for authenticated requests
    pub api_key: Option<String>,

    /// Bucket holding all documents
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Key namespace for uploaded originals
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_bucket() -> String {
    "pdfs".to_string()
}

fn default_key_prefix() -> String {
    "uploaded".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:54321".to_string(),
            api_key: None,
            bucket: default_bucket(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page rasterization settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Blob store settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load from default locations (~/.config/pagepatch/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pagepatch").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.render.target_width, 1500);
        assert_eq!(config.storage.bucket, "pdfs");
        assert_eq!(config.storage.key_prefix, "uploaded");
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [render]
            target_width = 800

            [storage]
            endpoint = "https://store.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.render.target_width, 800);
        // Unspecified fields fall back to defaults
        assert!((config.render.supersample - 4.0).abs() < f32::EPSILON);
        assert_eq!(config.storage.bucket, "pdfs");
    }
}
