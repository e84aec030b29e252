use std::env;

use anyhow::{bail, Context, Result};

/// Process configuration, read from the environment at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub camera_uri: String,
    pub width: i32,
    pub height: i32,
    pub jpeg_quality: u8,
    /// Whether the capture worker starts with the process or waits for
    /// `GET /start`.
    pub autostart: bool,
    /// Selfie-mode horizontal mirror applied before detection.
    pub mirror: bool,
    /// Command line of the hand-model sidecar; `None` disables server-side
    /// detection entirely.
    pub detector_cmd: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an injectable lookup so the parsing rules are testable
    /// without touching process-global state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = parse_or(&lookup, "PORT", 5000u16)?;
        let camera_uri = lookup("CAMERA_SOURCE").unwrap_or_else(|| "/dev/video0".to_string());
        let width = parse_or(&lookup, "FRAME_WIDTH", 640i32)?;
        let height = parse_or(&lookup, "FRAME_HEIGHT", 480i32)?;
        let jpeg_quality = parse_or(&lookup, "JPEG_QUALITY", 85u8)?;
        let autostart = parse_flag(&lookup, "CAPTURE_AUTOSTART", true)?;
        let mirror = parse_flag(&lookup, "MIRROR", true)?;
        let detector_cmd = lookup("HAND_MODEL_CMD").filter(|cmd| !cmd.trim().is_empty());

        if width <= 0 || height <= 0 {
            bail!("FRAME_WIDTH and FRAME_HEIGHT must be positive");
        }
        if !(1..=100).contains(&jpeg_quality) {
            bail!("JPEG_QUALITY must be between 1 and 100");
        }

        Ok(Self {
            port,
            camera_uri,
            width,
            height,
            jpeg_quality,
            autostart,
            mirror,
            detector_cmd,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => bail!("invalid value for {key}: {raw:?} (expected a boolean)"),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.camera_uri, "/dev/video0");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.jpeg_quality, 85);
        assert!(config.autostart);
        assert!(config.mirror);
        assert!(config.detector_cmd.is_none());
    }

    #[test]
    fn overrides_are_honoured() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("CAMERA_SOURCE", "0"),
            ("CAPTURE_AUTOSTART", "off"),
            ("HAND_MODEL_CMD", "hand-model --lite"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.camera_uri, "0");
        assert!(!config.autostart);
        assert_eq!(config.detector_cmd.as_deref(), Some("hand-model --lite"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn invalid_flag_is_rejected() {
        assert!(config_from(&[("MIRROR", "maybe")]).is_err());
    }

    #[test]
    fn jpeg_quality_is_bounded() {
        assert!(config_from(&[("JPEG_QUALITY", "0")]).is_err());
        assert!(config_from(&[("JPEG_QUALITY", "100")]).is_ok());
    }

    #[test]
    fn blank_detector_command_counts_as_unset() {
        let config = config_from(&[("HAND_MODEL_CMD", "  ")]).unwrap();
        assert!(config.detector_cmd.is_none());
    }
}
