//! Boot configuration: `mudstone.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level server configuration. Every field has a default, so an
/// absent file boots a usable server; a malformed file is boot-fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: NetConfig,
    pub data: DataConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Listen address.
    pub bind_address: String,
    pub port: u16,
    /// PEM paths enabling the TLS listener when both are set.
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            bind_address: "0.0.0.0".to_string(),
            port: 4000,
            tls_cert: None,
            tls_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root data directory; relative paths below resolve against it.
    pub data_dir: PathBuf,
    pub area_list: String,
    pub loot_file: String,
    pub player_dir: String,
    /// Optional log file tee'd with stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            data_dir: PathBuf::from("data"),
            area_list: "area.lst".to_string(),
            loot_file: "loot.lst".to_string(),
            player_dir: "players".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Room new characters start in.
    pub mud_school_vnum: i32,
    /// Room `recall` returns to, and where link-dead players are saved.
    pub recall_vnum: i32,
    /// Default area reset interval in pulses, for areas that set none.
    pub reset_interval: u32,
    /// Pulse length in milliseconds.
    pub pulse_millis: u64,
    /// World RNG seed; 0 seeds from entropy.
    pub rng_seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            mud_school_vnum: 3700,
            recall_vnum: 3001,
            reset_interval: 480,
            pulse_millis: 250,
            rng_seed: 0,
        }
    }
}

impl ServerConfig {
    /// Loads the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn area_list_path(&self) -> PathBuf {
        self.data.data_dir.join(&self.data.area_list)
    }

    pub fn loot_path(&self) -> PathBuf {
        self.data.data_dir.join(&self.data.loot_file)
    }

    pub fn player_dir(&self) -> PathBuf {
        self.data.data_dir.join(&self.data.player_dir)
    }

    pub fn area_path(&self, file_name: &str) -> PathBuf {
        self.data.data_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.game.pulse_millis, 250);
        assert!(config.area_list_path().ends_with("area.lst"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: ServerConfig = toml::from_str(
            "[server]\nport = 5000\n\n[game]\nrecall_vnum = 9001\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.game.recall_vnum, 9001);
        assert_eq!(config.data.area_list, "area.lst");
    }

    #[test]
    fn malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mudstone.toml");
        std::fs::write(&path, "not valid [toml").unwrap();
        assert!(ServerConfig::load(&path).is_err());
    }
}
