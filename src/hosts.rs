use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// The only host the coordinator can launch jobs on.
pub const LOCALHOST: &str = "localhost";

/// Hostnames in the order they appear in the host list file.
#[derive(Debug, Clone, PartialEq)]
pub struct HostList(Vec<String>);

impl HostList {
    pub fn hosts(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One host per line; surrounding whitespace is trimmed and blank lines are
/// skipped.
pub fn parse_hosts(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Reads the host list and checks it names exactly one host, `localhost`.
/// Partitioning handles any number of hosts, but jobs are launched as local
/// child processes so nothing else can be reached.
pub fn load_hosts(path: &Path) -> Result<HostList> {
    let contents =
        fs::read_to_string(path).map_err(|_| Error::MissingHostList(path.to_path_buf()))?;
    let hosts = parse_hosts(&contents);

    if hosts.len() != 1 {
        return Err(Error::InvalidHostCount(hosts.len()));
    }
    if hosts[0] != LOCALHOST {
        return Err(Error::UnsupportedHost(hosts[0].clone()));
    }
    Ok(HostList(hosts))
}
