use crate::error::{Error, Result};
use crate::params::Parameters;
use crate::SplitAssignment;
use std::fs;
use std::path::{Path, PathBuf};

/// Input of the external generator for one host, written as a Java style
/// `key=value` properties file.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProperties {
    pub scaling_factor: f64,
    pub num_file_splits: u32,
    pub first_file_split: u32,
    pub last_file_split: u32,
    pub zipf: u8,
    pub tpch_home: PathBuf,
}

impl GenerationProperties {
    pub fn new(params: &Parameters, assignment: SplitAssignment, tpch_home: PathBuf) -> Self {
        GenerationProperties {
            scaling_factor: params.scale_factor,
            num_file_splits: params.num_file_splits,
            first_file_split: assignment.first_split,
            last_file_split: assignment.last_split,
            zipf: params.zipf_factor,
            tpch_home,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "scaling_factor={}\n\
             num_file_splits={}\n\
             first_file_split={}\n\
             last_file_split={}\n\
             zipf={}\n\
             tpch_home={}\n",
            self.scaling_factor,
            self.num_file_splits,
            self.first_file_split,
            self.last_file_split,
            self.zipf,
            self.tpch_home.display(),
        )
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|source| Error::StagingFailure {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_key() {
        let props = GenerationProperties {
            scaling_factor: 0.5,
            num_file_splits: 4,
            first_file_split: 3,
            last_file_split: 4,
            zipf: 1,
            tpch_home: PathBuf::from("/tmp/work/tpch-gen/data"),
        };
        assert_eq!(
            props.render(),
            "scaling_factor=0.5\n\
             num_file_splits=4\n\
             first_file_split=3\n\
             last_file_split=4\n\
             zipf=1\n\
             tpch_home=/tmp/work/tpch-gen/data\n"
        );
    }

    #[test]
    fn whole_scale_factor_has_no_fraction() {
        let params = Parameters {
            scale_factor: 1.0,
            num_file_splits: 1,
            zipf_factor: 0,
            host_list_path: PathBuf::from("hosts.txt"),
            local_dir: PathBuf::from("/tmp/work"),
            remote_dir: String::from("/data/tpch1"),
        };
        let props = GenerationProperties::new(
            &params,
            SplitAssignment {
                first_split: 1,
                last_split: 1,
            },
            PathBuf::from("/tmp/work/data"),
        );
        assert!(props.render().starts_with("scaling_factor=1\n"));
        assert_eq!(props.first_file_split, 1);
        assert_eq!(props.last_file_split, 1);
    }
}
