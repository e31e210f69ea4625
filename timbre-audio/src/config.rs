use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use timbre_types::Source;

use crate::paths;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");
const DEFAULT_SERVER_PORT: u16 = 57110;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    synthdefs: SynthdefsConfig,
    #[serde(default)]
    instrument: InstrumentConfig,
}

#[derive(Deserialize, Default)]
struct ServerConfig {
    address: Option<String>,
    spawn: Option<bool>,
}

#[derive(Deserialize, Default)]
struct SynthdefsConfig {
    bundle_dir: Option<PathBuf>,
    install_dir: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
struct InstrumentConfig {
    source: Option<String>,
}

pub struct Config {
    server: ServerConfig,
    synthdefs: SynthdefsConfig,
    instrument: InstrumentConfig,
}

impl Config {
    /// Embedded defaults merged with the user's config file, if present.
    pub fn load() -> Self {
        match paths::user_config_path() {
            Some(path) => Self::load_with_user_file(&path),
            None => Self::embedded(),
        }
    }

    /// Embedded defaults only.
    pub fn embedded() -> Self {
        let base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");
        Config {
            server: base.server,
            synthdefs: base.synthdefs,
            instrument: base.instrument,
        }
    }

    /// Embedded defaults with `path` merged over them. A missing, unreadable
    /// or malformed file leaves the defaults in place.
    pub fn load_with_user_file(path: &Path) -> Self {
        let mut config = Self::embedded();
        if !path.exists() {
            return config;
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                Ok(user) => config.merge(user),
                Err(e) => {
                    log::warn!(target: "timbre::config", "ignoring malformed config {}: {}", path.display(), e)
                }
            },
            Err(e) => {
                log::warn!(target: "timbre::config", "could not read config {}: {}", path.display(), e)
            }
        }
        config
    }

    fn merge(&mut self, user: ConfigFile) {
        if user.server.address.is_some() {
            self.server.address = user.server.address;
        }
        if user.server.spawn.is_some() {
            self.server.spawn = user.server.spawn;
        }
        if user.synthdefs.bundle_dir.is_some() {
            self.synthdefs.bundle_dir = user.synthdefs.bundle_dir;
        }
        if user.synthdefs.install_dir.is_some() {
            self.synthdefs.install_dir = user.synthdefs.install_dir;
        }
        if user.instrument.source.is_some() {
            self.instrument.source = user.instrument.source;
        }
    }

    pub fn server_address(&self) -> String {
        self.server
            .address
            .clone()
            .unwrap_or_else(|| format!("127.0.0.1:{}", DEFAULT_SERVER_PORT))
    }

    /// UDP port a spawned scsynth should listen on.
    pub fn server_port(&self) -> u16 {
        self.server_address()
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .map(|addr| addr.port())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn spawn_server(&self) -> bool {
        self.server.spawn.unwrap_or(false)
    }

    pub fn bundle_dir(&self) -> PathBuf {
        paths::synthdefs_bundle_dir(self.synthdefs.bundle_dir.as_deref())
    }

    pub fn install_dir(&self) -> PathBuf {
        paths::synthdefs_install_dir(self.synthdefs.install_dir.as_deref())
    }

    /// Source new sessions start with.
    pub fn default_source(&self) -> Source {
        match self.instrument.source.as_deref() {
            None => Source::default(),
            Some(name) => Source::from_name(name).unwrap_or_else(|| {
                log::warn!(target: "timbre::config", "unknown instrument source {:?}, using sine", name);
                Source::default()
            }),
        }
    }
}
