//! Deployment settings that are not part of the positional parameters:
//! where the storage client lives, which generator payload to stage and how
//! to run it.
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const HADOOP_HOME_ENV: &str = "HADOOP_HOME";
pub const DEFAULT_HADOOP_HOME: &str = "/usr/local/hadoop";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Installation root of the storage client; `bin/hdfs` is resolved
    /// against it.
    pub hadoop_home: PathBuf,
    /// Generator archive copied into every staging directory.
    pub generator_archive: PathBuf,
    /// Command that unpacks the archive, run with the archive name appended.
    pub unpack_command: String,
    /// Command that runs the generator, run with the properties file name
    /// appended.
    pub generator_command: String,
    /// Directory, relative to the staging directory, the generator writes
    /// its `<table>.tbl.<n>` files into.
    pub data_subdir: String,
    pub launcher_name: String,
    pub properties_name: String,
    pub log_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hadoop_home: PathBuf::from(DEFAULT_HADOOP_HOME),
            generator_archive: PathBuf::from("tpch-gen.tar.gz"),
            unpack_command: String::from("tar -xzf"),
            generator_command: String::from("java -jar tpch-gen/tpch-gen.jar"),
            data_subdir: String::from("tpch-gen/data"),
            launcher_name: String::from("gen_and_load.sh"),
            properties_name: String::from("data.properties"),
            log_name: String::from("gen_and_load.log"),
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Loads the config file if one was given, then applies `HADOOP_HOME`.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_hadoop_home(std::env::var_os(HADOOP_HOME_ENV).map(PathBuf::from));
        debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// An unset storage root is not fatal: the configured (or default) root
    /// stays in place and a warning is logged.
    pub fn apply_hadoop_home(&mut self, hadoop_home: Option<PathBuf>) {
        match hadoop_home {
            Some(home) if !home.as_os_str().is_empty() => self.hadoop_home = home,
            _ => warn!(
                "{} is not set, using {}",
                HADOOP_HOME_ENV,
                self.hadoop_home.display()
            ),
        }
    }

    pub fn hdfs_bin(&self) -> PathBuf {
        self.hadoop_home.join("bin").join("hdfs")
    }
}
