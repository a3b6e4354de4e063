use std::fs::{read_to_string, write};
use std::path::PathBuf;

use anyhow::{Result, bail};

use serde_derive::{Deserialize, Serialize};

use dirs::home_dir;

use toml::from_str;

use crate::core::common::{LoggingOptions, RegistryOptions, ResolveOptions};

#[derive(Deserialize, Debug, Serialize)]
pub struct Config {
    pub resolve_options: ResolveOptions,
    pub registry_options: RegistryOptions,
    pub logging_options: LoggingOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            resolve_options: ResolveOptions::default(),
            registry_options: RegistryOptions::default(),
            logging_options: LoggingOptions::default(),
        }
    }
}

impl Config {
    /// Load the config file from the current directory, falling back to
    /// the home directory.
    pub fn load(filename: &str) -> Result<Config> {
        let mut config_file = PathBuf::from(filename);
        if !config_file.exists() {
            if let Some(home) = home_dir() {
                config_file = home.join(filename);
            }
        }

        let config = read_to_string(config_file)?;
        let config: Config = from_str(&config)?;
        Ok(config)
    }

    /// Write a default config file.
    pub fn generate(filename: &str, force: bool) -> Result<()> {
        let config_file = PathBuf::from(filename);
        if config_file.exists() && !force {
            bail!("configuration file `{filename}` already exists, use --force to overwrite")
        }

        let toml_config = toml::to_string(&Config::default())?;
        write(&config_file, toml_config)?;
        println!("Created configuration file `{filename}`.");
        Ok(())
    }
}
