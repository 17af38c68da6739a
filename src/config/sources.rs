//! Settings file loading.
//!
//! The format is picked from the file extension: YAML (`yaml` feature,
//! on by default), JSON (`json`) or TOML (`toml`).

use std::path::Path;

use super::model::Settings;
use crate::error::GatewayError;

/// Parse a settings string based on file extension.
pub fn parse_settings_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Settings, GatewayError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| GatewayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| GatewayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| GatewayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(GatewayError::UnsupportedFormat(other.to_string())),
    }
}

/// Read and parse a settings file.
pub async fn load_file(path: &Path) -> Result<Settings, GatewayError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            GatewayError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            GatewayError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let settings = parse_settings_str(ext, &content, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), "loaded settings file");
    Ok(settings)
}
