//! The distributed filesystem, seen through the three things the coordinator
//! needs from it: does a path exist, create a directory, and how a job
//! uploads files.
use crate::error::{Error, Result};
use crate::{remote_join, shell_quote, Table};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Present,
    NotFound,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn status(&self, path: &str) -> Result<PathStatus>;

    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Shell command a host job runs to upload every local file matching
    /// `local_pattern` into `remote_dir`. The pattern is already shell ready
    /// (quoted directory, bare glob) and is passed through as is.
    fn put_command(&self, local_pattern: &str, remote_dir: &str) -> String;
}

/// Storage backed by the `hdfs dfs` command line client.
pub struct HdfsClient {
    bin: PathBuf,
}

impl HdfsClient {
    pub fn new(bin: PathBuf) -> HdfsClient {
        HdfsClient { bin }
    }

    async fn dfs(&self, args: &[&str]) -> Result<std::process::Output> {
        let command = format!("{} dfs {}", self.bin.display(), args.join(" "));
        debug!("running {}", command);
        Command::new(&self.bin)
            .arg("dfs")
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::StorageClient { command, source })
    }
}

#[async_trait]
impl Storage for HdfsClient {
    async fn status(&self, path: &str) -> Result<PathStatus> {
        let output = self.dfs(&["-stat", path]).await?;
        // -stat exits non-zero when the path does not exist
        if output.status.success() {
            Ok(PathStatus::Present)
        } else {
            Ok(PathStatus::NotFound)
        }
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let output = self.dfs(&["-mkdir", path]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::RemoteDirCreationFailure {
                path: path.to_string(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }

    fn put_command(&self, local_pattern: &str, remote_dir: &str) -> String {
        format!(
            "{} dfs -put {} {}",
            shell_quote(&self.bin.to_string_lossy()),
            local_pattern,
            shell_quote(remote_dir)
        )
    }
}

/// In-process storage: directories are kept in a set and uploads are
/// rendered as `echo` commands, failing for a directory set up to refuse
/// them. Used to exercise the coordinator without a cluster.
#[derive(Default)]
pub struct MemoryStorage {
    dirs: Mutex<BTreeSet<String>>,
    created: Mutex<Vec<String>>,
    fail_on: Option<String>,
    fail_put_on: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    /// Storage that already holds `path`.
    pub fn with_dir(path: &str) -> MemoryStorage {
        let storage = MemoryStorage::default();
        storage.insert(path);
        storage
    }

    /// Storage whose mkdir of `path` fails.
    pub fn failing_mkdir(path: &str) -> MemoryStorage {
        MemoryStorage {
            fail_on: Some(path.to_string()),
            ..MemoryStorage::default()
        }
    }

    /// Storage whose uploads into `remote_dir` fail.
    pub fn failing_put(remote_dir: &str) -> MemoryStorage {
        MemoryStorage {
            fail_put_on: Some(remote_dir.to_string()),
            ..MemoryStorage::default()
        }
    }

    /// Directories created through [`Storage::mkdir`], in call order.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn insert(&self, path: &str) {
        if let Ok(mut dirs) = self.dirs.lock() {
            dirs.insert(path.to_string());
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn status(&self, path: &str) -> Result<PathStatus> {
        let present = self
            .dirs
            .lock()
            .map(|dirs| dirs.contains(path))
            .unwrap_or(false);
        Ok(if present {
            PathStatus::Present
        } else {
            PathStatus::NotFound
        })
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        if self.fail_on.as_deref() == Some(path) {
            return Err(Error::RemoteDirCreationFailure {
                path: path.to_string(),
                reason: String::from("mkdir refused"),
            });
        }
        self.insert(path);
        if let Ok(mut created) = self.created.lock() {
            created.push(path.to_string());
        }
        Ok(())
    }

    fn put_command(&self, local_pattern: &str, remote_dir: &str) -> String {
        let put = format!("echo put {} {}", local_pattern, shell_quote(remote_dir));
        if self.fail_put_on.as_deref() == Some(remote_dir) {
            format!("{} && false", put)
        } else {
            put
        }
    }
}

/// Checks `remote_dir` does not exist yet, then creates it and one directory
/// per table. Any mkdir failure aborts; directories created before it are
/// left in place.
pub async fn ensure_remote_layout<S: Storage + ?Sized>(
    storage: &S,
    remote_dir: &str,
) -> Result<Vec<String>> {
    if storage.status(remote_dir).await? == PathStatus::Present {
        return Err(Error::RemoteDirExists(remote_dir.to_string()));
    }

    let mut dirs = vec![remote_dir.to_string()];
    dirs.extend(Table::ALL.iter().map(|t| remote_join(remote_dir, t.name())));

    for dir in &dirs {
        storage.mkdir(dir).await?;
        info!("created {}", dir);
    }
    Ok(dirs)
}

/// The upload command for one table's generated files. Only the glob is left
/// for the shell to expand; the directory is quoted.
pub fn table_put_command<S: Storage + ?Sized>(
    storage: &S,
    tpch_home: &Path,
    remote_dir: &str,
    table: Table,
) -> String {
    let pattern = format!(
        "{}/{}",
        shell_quote(&tpch_home.to_string_lossy()),
        table.file_pattern()
    );
    storage.put_command(&pattern, &remote_join(remote_dir, table.name()))
}
