use crate::error::{CliError, Result};
use cgforge::core::forcefield::registry::ForceFieldRegistry;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DATA_DIR_ENV: &str = "CGFORGE_DATA_DIR";
const FORCEFIELD_SUBDIR: &str = "forcefields";

/// Where the data directory was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Argument,
    Environment,
    Default,
}

/// Locates user-supplied force-field libraries and builds the registry from them.
#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
    source: DataSource,
}

impl DataManager {
    /// Resolves the data directory: `--ff-dir`, then `CGFORGE_DATA_DIR`, then the OS data dir.
    ///
    /// `--ff-dir` names the library directory itself; the other two name a
    /// base directory whose `forcefields/` subdirectory holds the libraries.
    pub fn resolve(ff_dir: Option<&Path>) -> Result<Self> {
        let manager = if let Some(dir) = ff_dir {
            Self {
                base_path: dir.to_path_buf(),
                source: DataSource::Argument,
            }
        } else if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            Self {
                base_path: PathBuf::from(dir),
                source: DataSource::Environment,
            }
        } else {
            Self {
                base_path: Self::default_data_path()?,
                source: DataSource::Default,
            }
        };
        debug!(
            "DataManager initialized with path {:?} ({:?})",
            manager.base_path, manager.source
        );
        Ok(manager)
    }

    pub fn with_custom_path(path: PathBuf) -> Self {
        Self {
            base_path: path,
            source: DataSource::Argument,
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.base_path
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn forcefield_dir(&self) -> PathBuf {
        match self.source {
            DataSource::Argument => self.base_path.clone(),
            DataSource::Environment | DataSource::Default => {
                self.base_path.join(FORCEFIELD_SUBDIR)
            }
        }
    }

    /// The built-in libraries plus every library found in [`Self::forcefield_dir`].
    ///
    /// A missing default directory is not an error; a missing directory that
    /// was asked for explicitly is.
    pub fn load_registry(&self) -> Result<ForceFieldRegistry> {
        let mut registry = ForceFieldRegistry::builtin()?;
        let dir = self.forcefield_dir();
        if dir.is_dir() {
            let loaded = registry.load_dir(&dir)?;
            info!("Loaded {} additional force field(s) from {:?}", loaded, dir);
        } else if self.source == DataSource::Argument {
            return Err(CliError::Data(format!(
                "Force-field directory does not exist: {}",
                dir.display()
            )));
        } else {
            debug!("No force-field directory at {:?}, using built-ins only", dir);
        }
        Ok(registry)
    }

    fn default_data_path() -> Result<PathBuf> {
        ProjectDirs::from("edu", "caltech", "cgforge")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CliError::Data("Could not determine default data directory path.".to_string())
            })
    }
}
