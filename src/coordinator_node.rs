use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tpch_load::config::Config;
use tpch_load::hosts::load_hosts;
use tpch_load::launcher::{archive_name, tpch_home, LauncherScript};
use tpch_load::params::Parameters;
use tpch_load::partition::partition;
use tpch_load::properties::GenerationProperties;
use tpch_load::storage::{ensure_remote_layout, HdfsClient, Storage};
use tpch_load::{Error, Result, SplitAssignment};
use tracing::{debug, info, warn};

/// A host whose staging directory is ready to run.
#[derive(Debug, Clone)]
struct StagedHost {
    host: String,
    assignment: SplitAssignment,
    dir: PathBuf,
}

/// A running generate-and-load child process.
struct HostJob {
    host: String,
    assignment: SplitAssignment,
    child: Child,
}

#[derive(Debug)]
pub struct JobOutcome {
    pub host: String,
    pub assignment: SplitAssignment,
    /// `None` when the child could not be waited on.
    pub status: Option<ExitStatus>,
}

impl JobOutcome {
    pub fn success(&self) -> bool {
        self.status.map(|s| s.success()).unwrap_or(false)
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub remote_dirs: Vec<String>,
    pub outcomes: Vec<JobOutcome>,
}

pub struct Coordinator<S: Storage> {
    params: Parameters,
    config: Config,
    storage: S,
}

impl<S: Storage> Coordinator<S> {
    pub fn new(params: Parameters, config: Config, storage: S) -> Coordinator<S> {
        Coordinator {
            params,
            config,
            storage,
        }
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs the whole generate-and-load cycle: create the remote layout,
    /// stage and launch one job per host, then wait for all of them.
    /// Nothing is rolled back if a step fails half way.
    pub async fn start(&self) -> Result<RunSummary> {
        let hosts = load_hosts(&self.params.host_list_path)?;
        info!("generating on {} host(s): {:?}", hosts.len(), hosts.hosts());

        let remote_dirs = ensure_remote_layout(&self.storage, &self.params.remote_dir).await?;

        // the job runs from its staging directory, so paths written into
        // its files must not depend on our working directory
        let stage_dir = absolute(&self.params.local_dir)?;
        let home = tpch_home(&stage_dir, &self.config);
        let launcher =
            LauncherScript::render(&self.storage, &self.config, &home, &self.params.remote_dir);

        let assignments = partition(self.params.num_file_splits, hosts.len());
        let mut staged = Vec::new();
        let mut jobs = Vec::new();
        for (host, assignment) in hosts.hosts().iter().zip(assignments) {
            let staged_host = self.stage_host(host, assignment, &stage_dir, &home, &launcher)?;
            jobs.push(self.launch(&staged_host)?);
            staged.push(staged_host);
        }

        let outcomes = await_all(jobs).await;
        self.cleanup(&staged);

        Ok(RunSummary {
            remote_dirs,
            outcomes,
        })
    }

    fn stage_host(
        &self,
        host: &str,
        assignment: SplitAssignment,
        dir: &Path,
        home: &Path,
        launcher: &LauncherScript,
    ) -> Result<StagedHost> {
        if dir.exists() {
            return Err(Error::StagingFailure {
                path: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::AlreadyExists, "directory already exists"),
            });
        }
        fs::create_dir_all(dir).map_err(|source| Error::StagingFailure {
            path: dir.to_path_buf(),
            source,
        })?;

        launcher.write_to(&dir.join(&self.config.launcher_name))?;

        let archive = &self.config.generator_archive;
        fs::copy(archive, dir.join(archive_name(&self.config))).map_err(|source| {
            Error::StagingFailure {
                path: archive.clone(),
                source,
            }
        })?;

        GenerationProperties::new(&self.params, assignment, home.to_path_buf())
            .write_to(&dir.join(&self.config.properties_name))?;

        debug!("staged {} in {}", host, dir.display());
        Ok(StagedHost {
            host: host.to_string(),
            assignment,
            dir: dir.to_path_buf(),
        })
    }

    /// Starts the launcher in the background with stdout and stderr going to
    /// the host's log file. Returns as soon as the child is spawned.
    fn launch(&self, staged: &StagedHost) -> Result<HostJob> {
        let launch_err = |source| Error::Launch {
            host: staged.host.clone(),
            source,
        };
        let log = File::create(staged.dir.join(&self.config.log_name)).map_err(launch_err)?;
        let log_stderr = log.try_clone().map_err(launch_err)?;

        let child = Command::new("sh")
            .arg(&self.config.launcher_name)
            .current_dir(&staged.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_stderr))
            .spawn()
            .map_err(launch_err)?;

        info!(
            "launched job on {} for splits {} (pid {:?})",
            staged.host,
            staged.assignment,
            child.id()
        );
        Ok(HostJob {
            host: staged.host.clone(),
            assignment: staged.assignment,
            child,
        })
    }

    /// Removes the launcher and properties files. Failures are only logged.
    fn cleanup(&self, staged: &[StagedHost]) {
        for host in staged {
            for name in [&self.config.launcher_name, &self.config.properties_name] {
                let path = host.dir.join(name);
                if let Err(e) = fs::remove_file(&path) {
                    warn!("could not remove {}: {}", path.display(), e);
                }
            }
        }
    }
}

/// Waits for every job to exit, in whatever order they finish.
async fn await_all(jobs: Vec<HostJob>) -> Vec<JobOutcome> {
    let mut set = JoinSet::new();
    for mut job in jobs {
        set.spawn(async move {
            let status = match job.child.wait().await {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!("could not wait for job on {}: {}", job.host, e);
                    None
                }
            };
            JobOutcome {
                host: job.host,
                assignment: job.assignment,
                status,
            }
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(outcome) => {
                match outcome.status {
                    Some(status) if status.success() => {
                        info!("job on {} finished", outcome.host)
                    }
                    Some(status) => warn!("job on {} exited with {}", outcome.host, status),
                    None => {}
                }
                outcomes.push(outcome);
            }
            Err(e) => warn!("job task failed: {}", e),
        }
    }
    outcomes
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| Error::StagingFailure {
            path: path.to_path_buf(),
            source,
        })
}

/// Create a coordinator backed by the HDFS command line client and run it.
pub async fn make_coordinator(params: Parameters, config: Config) -> Result<RunSummary> {
    let storage = HdfsClient::new(config.hdfs_bin());
    let coordinator = Coordinator::new(params, config, storage);
    coordinator.start().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpch_load::storage::MemoryStorage;

    struct Fixture {
        root: tempfile::TempDir,
        params: Parameters,
        config: Config,
    }

    fn fixture(hosts: &str, generator_command: &str) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let host_list = root.path().join("hosts.txt");
        fs::write(&host_list, hosts).unwrap();
        let archive = root.path().join("payload.tar.gz");
        fs::write(&archive, b"payload").unwrap();

        let params = Parameters {
            scale_factor: 1.0,
            num_file_splits: 1,
            zipf_factor: 0,
            host_list_path: host_list,
            local_dir: root.path().join("work"),
            remote_dir: String::from("/data/tpch1"),
        };
        let config = Config {
            generator_archive: archive,
            unpack_command: String::from("true"),
            generator_command: String::from(generator_command),
            ..Config::default()
        };
        Fixture {
            root,
            params,
            config,
        }
    }

    #[tokio::test]
    async fn single_localhost_run_end_to_end() {
        let f = fixture("localhost\n", "cat");
        let work = f.params.local_dir.clone();
        let coordinator = Coordinator::new(f.params, f.config, MemoryStorage::new());

        let summary = coordinator.start().await.unwrap();

        assert_eq!(summary.remote_dirs.len(), 9);
        assert_eq!(coordinator.storage().created(), summary.remote_dirs);
        assert_eq!(summary.outcomes.len(), 1);
        let outcome = &summary.outcomes[0];
        assert_eq!(outcome.host, "localhost");
        assert_eq!(
            outcome.assignment,
            SplitAssignment {
                first_split: 1,
                last_split: 1
            }
        );
        assert!(outcome.success());

        // the generator here just echoes its properties file into the log
        let log = fs::read_to_string(work.join("gen_and_load.log")).unwrap();
        assert!(log.contains("first_file_split=1\n"));
        assert!(log.contains("last_file_split=1\n"));
        assert!(log.contains("put "));
        assert!(log.contains("/data/tpch1/lineitem\n"));

        assert!(!work.join("gen_and_load.sh").exists());
        assert!(!work.join("data.properties").exists());
        assert!(work.join("payload.tar.gz").exists());
    }

    #[tokio::test]
    async fn existing_local_dir_fails_after_remote_layout() {
        let f = fixture("localhost\n", "true");
        fs::create_dir_all(&f.params.local_dir).unwrap();
        let coordinator = Coordinator::new(f.params, f.config, MemoryStorage::new());

        let err = coordinator.start().await.unwrap_err();

        assert!(matches!(err, Error::StagingFailure { .. }));
        // remote directories are not rolled back
        assert_eq!(coordinator.storage().created().len(), 9);
    }

    #[tokio::test]
    async fn existing_remote_dir_stops_before_staging() {
        let f = fixture("localhost\n", "true");
        let work = f.params.local_dir.clone();
        let coordinator =
            Coordinator::new(f.params, f.config, MemoryStorage::with_dir("/data/tpch1"));

        let err = coordinator.start().await.unwrap_err();

        assert!(matches!(err, Error::RemoteDirExists(_)));
        assert!(!work.exists());
    }

    #[tokio::test]
    async fn two_hosts_are_rejected_before_any_side_effect() {
        let f = fixture("localhost\nnode2\n", "true");
        let coordinator = Coordinator::new(f.params, f.config, MemoryStorage::new());

        let err = coordinator.start().await.unwrap_err();

        assert!(matches!(err, Error::InvalidHostCount(2)));
        assert!(coordinator.storage().created().is_empty());
    }

    #[tokio::test]
    async fn failing_job_is_reported_not_fatal() {
        let f = fixture("localhost\n", "false");
        let coordinator = Coordinator::new(f.params, f.config, MemoryStorage::new());

        let summary = coordinator.start().await.unwrap();

        assert_eq!(summary.outcomes.len(), 1);
        assert!(!summary.outcomes[0].success());
    }

    #[tokio::test]
    async fn missing_archive_is_a_staging_failure() {
        let mut f = fixture("localhost\n", "true");
        f.config.generator_archive = f.root.path().join("missing.tar.gz");
        let coordinator = Coordinator::new(f.params, f.config, MemoryStorage::new());

        let err = coordinator.start().await.unwrap_err();

        assert!(matches!(
            err,
            Error::StagingFailure { path, .. } if path.ends_with("missing.tar.gz")
        ));
    }

    const GENERATE_THREE_TABLES: &str = "mkdir -p tpch-gen/data && \
        touch tpch-gen/data/lineitem.tbl.1 tpch-gen/data/orders.tbl.1 tpch-gen/data/region.tbl.1 \
        && cat";

    fn generated_files(work: &Path) -> Vec<PathBuf> {
        ["lineitem", "orders", "region"]
            .iter()
            .map(|t| work.join("tpch-gen/data").join(format!("{}.tbl.1", t)))
            .collect()
    }

    #[tokio::test]
    async fn local_dir_with_space_is_kept_as_one_path() {
        let mut f = fixture("localhost\n", GENERATE_THREE_TABLES);
        let work = f.root.path().join("my work");
        let neighbour = f.root.path().join("my");
        fs::write(&neighbour, b"keep me").unwrap();
        f.params.local_dir = work.clone();
        let coordinator = Coordinator::new(f.params, f.config, MemoryStorage::new());

        let summary = coordinator.start().await.unwrap();

        assert!(summary.outcomes[0].success());
        assert!(neighbour.exists());
        for file in generated_files(&work) {
            assert!(!file.exists(), "{} left behind", file.display());
        }
        let log = fs::read_to_string(work.join("gen_and_load.log")).unwrap();
        let uploaded = format!(
            "put {} /data/tpch1/lineitem\n",
            work.join("tpch-gen/data/lineitem.tbl.1").display()
        );
        assert!(log.contains(&uploaded), "{}", log);
    }

    #[tokio::test]
    async fn failed_upload_still_uploads_the_rest_and_cleans_up() {
        let f = fixture("localhost\n", GENERATE_THREE_TABLES);
        let work = f.params.local_dir.clone();
        let storage = MemoryStorage::failing_put("/data/tpch1/orders");
        let coordinator = Coordinator::new(f.params, f.config, storage);

        let summary = coordinator.start().await.unwrap();

        assert!(!summary.outcomes[0].success());
        let log = fs::read_to_string(work.join("gen_and_load.log")).unwrap();
        assert!(log.contains("/data/tpch1/orders\n"));
        assert!(log.contains("/data/tpch1/customer\n"));
        assert!(log.contains("/data/tpch1/region\n"));
        for file in generated_files(&work) {
            assert!(!file.exists(), "{} left behind", file.display());
        }
    }
}
