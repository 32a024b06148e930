use crate::error::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

pub const MAX_ZIPF_FACTOR: i64 = 4;

/// Generate TPC-H data on the listed hosts and load it into HDFS.
#[derive(Debug, Parser)]
#[command(name = "coordinator", allow_negative_numbers = true)]
pub struct Cli {
    /// Scale factor of the generated data, roughly its size in GB
    pub scale_factor: f64,

    /// Number of files each table is split into. Must be at least half the
    /// scale factor, which keeps each generated file near 2GB or smaller
    pub num_files: i64,

    /// Zipfian skew of the generated values, 0 (uniform) to 4
    pub zipf_factor: i64,

    /// File listing the hosts to generate on, one per line
    pub host_list: PathBuf,

    /// Local working directory for each host job; must not exist yet
    pub local_dir: PathBuf,

    /// HDFS directory the tables are loaded into; must not exist yet
    pub hdfs_dir: String,

    /// Optional JSON file overriding generator and storage client settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Validated run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub scale_factor: f64,
    pub num_file_splits: u32,
    pub zipf_factor: u8,
    pub host_list_path: PathBuf,
    pub local_dir: PathBuf,
    pub remote_dir: String,
}

impl Parameters {
    pub fn validate(cli: &Cli) -> Result<Parameters> {
        if cli.scale_factor.is_nan() || cli.scale_factor <= 0.0 {
            return Err(Error::InvalidScaleFactor(cli.scale_factor));
        }
        let invalid_splits = || Error::InvalidSplitCount {
            num_file_splits: cli.num_files,
            scale_factor: cli.scale_factor,
        };
        let num_file_splits = u32::try_from(cli.num_files).map_err(|_| invalid_splits())?;
        if num_file_splits == 0 || (num_file_splits as f64) < cli.scale_factor / 2.0 {
            return Err(invalid_splits());
        }
        if !(0..=MAX_ZIPF_FACTOR).contains(&cli.zipf_factor) {
            return Err(Error::InvalidZipfFactor(cli.zipf_factor));
        }
        if !cli.host_list.exists() {
            return Err(Error::MissingHostList(cli.host_list.clone()));
        }

        Ok(Parameters {
            scale_factor: cli.scale_factor,
            num_file_splits,
            zipf_factor: cli.zipf_factor as u8,
            host_list_path: cli.host_list.clone(),
            local_dir: cli.local_dir.clone(),
            remote_dir: cli.hdfs_dir.clone(),
        })
    }
}
