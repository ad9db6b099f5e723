//! Tool configuration, loaded from a YAML file.
//!
//! Every field has a default matching the reference station hookup, so an
//! empty file (or no file at all) yields a working configuration for a
//! station on `/dev/ttyUSB0`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serial link settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Device node of the station's serial adapter.
    pub port: String,
    pub baud: u32,
    /// Read timeout, which also sets the reader thread's cadence.
    pub timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            port: "/dev/ttyUSB0".to_string(),
            baud: 9600,
            timeout_ms: 1000,
        }
    }
}

/// Sound cue settings. Cues without a file configured are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SfxConfig {
    /// External player binary, invoked with the cue file as its only
    /// argument. Defaults to a platform-appropriate player.
    pub player: Option<String>,
    pub startup: Option<PathBuf>,
    pub key_stored: Option<PathBuf>,
    pub key_deleted: Option<PathBuf>,
    pub manual_send: Option<PathBuf>,
}

/// Top level configuration for the panel and sender tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub link: LinkConfig,
    /// Register names on the station, in listing order. The set is fixed
    /// for the lifetime of the program.
    pub registers: Vec<String>,
    pub sfx: SfxConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            link: LinkConfig::default(),
            registers: vec!["EXX".to_string(), "EYX".to_string(), "EZX".to_string()],
            sfx: SfxConfig::default(),
        }
    }
}

impl PanelConfig {
    /// Reads and parses the given config file.
    pub fn load(path: &Path) -> Result<PanelConfig, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        serde_yaml::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_station() {
        let config = PanelConfig::default();
        assert_eq!(config.link.port, "/dev/ttyUSB0");
        assert_eq!(config.link.baud, 9600);
        assert_eq!(config.link.timeout_ms, 1000);
        assert_eq!(config.registers, ["EXX", "EYX", "EZX"]);
        assert_eq!(config.sfx, SfxConfig::default());
    }

    #[test]
    fn empty_mapping_yields_defaults() {
        let config: PanelConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, PanelConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let yaml = "
link:
  port: /dev/ttyACM1
registers: [R1, R2]
";
        let config: PanelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.link.port, "/dev/ttyACM1");
        assert_eq!(config.link.baud, 9600);
        assert_eq!(config.registers, ["R1", "R2"]);
    }

    #[test]
    fn sfx_paths_parse() {
        let yaml = "
sfx:
  player: mpg123
  startup: /srv/sfx/hello.mp3
  key_stored: /srv/sfx/stored.mp3
";
        let config: PanelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sfx.player.as_deref(), Some("mpg123"));
        assert_eq!(
            config.sfx.startup,
            Some(PathBuf::from("/srv/sfx/hello.mp3"))
        );
        assert_eq!(config.sfx.manual_send, None);
    }
}
