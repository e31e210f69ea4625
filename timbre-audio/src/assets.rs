//! Delivery of bundled synth definitions to the server's storage directory.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A definition file that could not be delivered.
#[derive(Debug)]
pub struct AssetError {
    pub file: String,
    pub source: io::Error,
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to deliver {}: {}", self.file, self.source)
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub trait AssetDelivery: Send + Sync {
    /// Make sure the destination exists. Called once before any `deliver`.
    fn prepare(&self) -> Result<(), AssetError>;

    /// Copy one bundled definition file into place.
    fn deliver(&self, file_name: &str) -> Result<PathBuf, AssetError>;

    /// Directory the server should load delivered definitions from, if the
    /// server has to be told about them.
    fn load_dir(&self) -> Option<PathBuf> {
        None
    }
}

/// Copies definition files from a bundle directory into the install directory.
pub struct DirAssetDelivery {
    bundle_dir: PathBuf,
    install_dir: PathBuf,
}

impl DirAssetDelivery {
    pub fn new(bundle_dir: impl Into<PathBuf>, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            bundle_dir: bundle_dir.into(),
            install_dir: install_dir.into(),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }
}

impl AssetDelivery for DirAssetDelivery {
    fn prepare(&self) -> Result<(), AssetError> {
        fs::create_dir_all(&self.install_dir).map_err(|source| AssetError {
            file: self.install_dir.display().to_string(),
            source,
        })
    }

    fn deliver(&self, file_name: &str) -> Result<PathBuf, AssetError> {
        let from = self.bundle_dir.join(file_name);
        let to = self.install_dir.join(file_name);
        fs::copy(&from, &to).map_err(|source| AssetError {
            file: file_name.to_string(),
            source,
        })?;
        log::info!(target: "timbre::assets", "synthdef delivered: {}", to.display());
        Ok(to)
    }

    fn load_dir(&self) -> Option<PathBuf> {
        Some(
            self.install_dir
                .canonicalize()
                .unwrap_or_else(|_| self.install_dir.clone()),
        )
    }
}

/// Delivery that does nothing, for backends that already have their definitions.
pub struct NoAssets;

impl AssetDelivery for NoAssets {
    fn prepare(&self) -> Result<(), AssetError> {
        Ok(())
    }

    fn deliver(&self, file_name: &str) -> Result<PathBuf, AssetError> {
        Ok(PathBuf::from(file_name))
    }
}
