//! Platform specific locations of the config and store files.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Directories for the `pricealert` application on this platform
pub fn project_dirs() -> ProjectDirs {
    ProjectDirs::from("ng", "First Securities Brokers", "pricealert")
        .expect("Couldn't find operating-system-specific configuration paths")
}

/// Location of the optional TOML settings file
pub fn config_file() -> PathBuf {
    project_dirs().config_dir().join("config.toml")
}

/// Default location of the secure store
pub fn default_store_file() -> PathBuf {
    project_dirs().data_local_dir().join("secure-store.json")
}
