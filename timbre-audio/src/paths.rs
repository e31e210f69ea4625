use std::path::{Path, PathBuf};

/// Resolve the directory bundled synth definitions are read from.
///
/// Fallback chain:
/// 1. `TIMBRE_SYNTHDEFS_DIR` env var (runtime override)
/// 2. the configured directory, if any
/// 3. `CARGO_MANIFEST_DIR/synthdefs` (compile-time, resolves to timbre-audio/)
/// 4. `./synthdefs` relative to CWD
pub fn synthdefs_bundle_dir(configured: Option<&Path>) -> PathBuf {
    if let Ok(dir) = std::env::var("TIMBRE_SYNTHDEFS_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(dir) = configured {
        return dir.to_path_buf();
    }

    let compile_time = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/synthdefs"));
    if compile_time.exists() {
        return compile_time;
    }

    PathBuf::from("synthdefs")
}

/// The server's well-known storage directory for synth definitions
/// (`~/.local/share/timbre/synthdefs/` on Linux).
pub fn synthdefs_install_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    dirs::data_dir()
        .map(|d| d.join("timbre").join("synthdefs"))
        .unwrap_or_else(|| PathBuf::from("synthdefs-installed"))
}

/// User config file location (`~/.config/timbre/config.toml`).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("timbre").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_install_dir_wins() {
        let dir = Path::new("/tmp/timbre-defs");
        assert_eq!(synthdefs_install_dir(Some(dir)), dir.to_path_buf());
    }

    #[test]
    fn default_install_dir_is_namespaced() {
        let dir = synthdefs_install_dir(None);
        assert!(dir.ends_with("synthdefs") || dir.ends_with("synthdefs-installed"));
    }
}
