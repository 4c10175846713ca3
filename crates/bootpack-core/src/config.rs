use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::encoding::parse_hex_u32_or_default;
use crate::error::{BootpackError, BootpackResult};
use crate::types::{ImageParams, PROTOCOL_VERSION};

/// Top-level configuration (loaded from bootpack.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootpackConfig {
    pub image: ImageConfig,
    pub keys: KeysConfig,
    pub recover: RecoverConfig,
    pub history: HistoryConfig,
    pub log: LogConfig,
}

/// Header values written into new containers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Protocol version tag (default: 1)
    pub protocol_version: u32,
    /// Product ID as hex text (default: 0)
    pub product_id: Option<String>,
    /// Application version as hex text (default: 0)
    pub app_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Raw 16-byte key file used when no key is given on the command line
    pub key_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoverConfig {
    /// Treat a CRC mismatch as a failure (output is still written)
    pub strict_integrity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record recently used paths
    pub enabled: bool,
    /// JSON history file
    pub path: PathBuf,
    /// Entries kept per slot
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            product_id: None,
            app_version: None,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("~/.local/share/bootpack/history.json"),
            max_entries: 10,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ImageConfig {
    /// Resolve the configured header values, parsing the hex identifiers.
    pub fn params(&self) -> BootpackResult<ImageParams> {
        Ok(ImageParams {
            protocol_version: self.protocol_version,
            product_id: parse_hex_u32_or_default(self.product_id.as_deref())?,
            app_version: parse_hex_u32_or_default(self.app_version.as_deref())?,
        })
    }
}

impl BootpackConfig {
    /// Load the configuration file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> BootpackResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| BootpackError::Config(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| BootpackError::Config(format!("parsing {}: {e}", path.display())))
    }
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[image]
protocol_version = 1
product_id = "0x1234"
app_version = "0102"

[keys]
key_file = "/secure/fw.key"

[recover]
strict_integrity = true

[history]
enabled = false
path = "/tmp/history.json"
max_entries = 3

[log]
level = "debug"
format = "json"
"#;
        let config: BootpackConfig = toml::from_str(toml_str).unwrap();

        let params = config.image.params().unwrap();
        assert_eq!(params.product_id, 0x1234);
        assert_eq!(params.app_version, 0x0102);
        assert_eq!(params.protocol_version, 1);
        assert_eq!(config.keys.key_file, Some(PathBuf::from("/secure/fw.key")));
        assert!(config.recover.strict_integrity);
        assert!(!config.history.enabled);
        assert_eq!(config.history.max_entries, 3);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config: BootpackConfig = toml::from_str("").unwrap();

        assert_eq!(config.image.params().unwrap(), ImageParams::default());
        assert!(config.keys.key_file.is_none());
        assert!(!config.recover.strict_integrity);
        assert!(config.history.enabled);
        assert_eq!(config.history.max_entries, 10);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "text");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[image]
product_id = "beef"
"#;
        let config: BootpackConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.image.params().unwrap().product_id, 0xbeef);
        // Defaults
        assert_eq!(config.image.params().unwrap().app_version, 0);
        assert_eq!(config.image.protocol_version, 1);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_bad_identifier_is_malformed_hex() {
        let config: BootpackConfig = toml::from_str("[image]\napp_version = \"v1\"\n").unwrap();
        assert!(matches!(
            config.image.params(),
            Err(BootpackError::MalformedHex(_))
        ));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = BootpackConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: BootpackConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.history.path, parsed.history.path);
        assert_eq!(config.image.protocol_version, parsed.image.protocol_version);
        assert_eq!(config.log.format, parsed.log.format);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = BootpackConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert!(config.history.enabled);
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[image\nproduct_id = ").unwrap();
        assert!(matches!(
            BootpackConfig::load(&path),
            Err(BootpackError::Config(_))
        ));
    }

    #[test]
    fn test_expand_tilde() {
        let plain = expand_tilde(Path::new("/etc/bootpack.toml"));
        assert_eq!(plain, PathBuf::from("/etc/bootpack.toml"));
        let expanded = expand_tilde(Path::new("~/x/y.json"));
        assert!(expanded.ends_with("x/y.json"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
