//! ConfigLoader: builds a [`TrackerConfig`] from layered sources.

use super::merge::merge_policy;
use super::sources::{env, global_file, workspace_file};
use super::TrackerConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root`.
    ///
    /// Precedence, lowest first: defaults, `~/.config/tracker/config.toml`,
    /// `<root>/config/config.toml`, `<root>/config/<TRACKER_ENV>.toml`,
    /// `TRACKER_*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<TrackerConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load a single file on top of the defaults. No other sources are read.
    pub fn load_from_file(path: &Path) -> Result<TrackerConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
