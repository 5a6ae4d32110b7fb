//! Parses config file

use std::{
    fs::OpenOptions,
    io::Read,
    path::{Path, PathBuf},
};

use std::env;

use eyre::eyre;
use serde::Deserialize;

use crate::utils::{bbox::BBox3, constants::DEFAULT_WORLD_BOUND};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Half size of the cube every propagated object has to stay in.
    pub world_bound: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world_bound: DEFAULT_WORLD_BOUND,
        }
    }
}

impl Config {
    pub fn world_bounds(&self) -> BBox3 {
        BBox3::cube(self.world_bound)
    }
}

pub static CONFIG_FILE_NAME: &str = "config.toml";

/// Parse `config.toml` in the same folder as the binary
///
/// A missing file gives the defaults.
pub fn parse_config() -> eyre::Result<Config> {
    let path = match env::current_exe() {
        Ok(path) => path
            .parent()
            .map(|parent| parent.join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        Err(_) => PathBuf::from(CONFIG_FILE_NAME),
    };

    if !path.exists() {
        log::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        return Ok(Config::default());
    }

    parse_config_from_file(path.as_path())
}

pub fn parse_config_from_file(path: &Path) -> eyre::Result<Config> {
    let mut file = OpenOptions::new().read(true).open(path.as_os_str())?;
    let mut buffer = String::new();

    file.read_to_string(&mut buffer)?;

    parse_config_from_str(&buffer)
}

pub fn parse_config_from_str(s: &str) -> eyre::Result<Config> {
    let config: Config = toml::from_str(s)?;

    if !config.world_bound.is_finite() || config.world_bound <= 0. {
        return Err(eyre!(
            "world_bound must be a positive number, got {}",
            config.world_bound
        ));
    }

    Ok(config)
}
