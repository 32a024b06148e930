use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{table_put_command, Storage};
use crate::{shell_quote, Table};
use std::fs;
use std::path::{Path, PathBuf};

/// The shell script each host job runs from its staging directory: unpack
/// the generator, generate this host's splits, upload every table into its
/// remote directory and remove the local copies.
#[derive(Debug, Clone, PartialEq)]
pub struct LauncherScript {
    contents: String,
}

impl LauncherScript {
    pub fn render<S: Storage + ?Sized>(
        storage: &S,
        config: &Config,
        tpch_home: &Path,
        remote_dir: &str,
    ) -> LauncherScript {
        let archive = archive_name(config);
        let home = shell_quote(&tpch_home.to_string_lossy());
        let mut contents = String::from("#!/bin/sh\ncd \"$(dirname \"$0\")\" || exit 1\n\n");

        contents.push_str(&format!(
            "{} {} || exit 1\n",
            config.unpack_command,
            shell_quote(&archive)
        ));
        contents.push_str(&format!(
            "{} {} || exit 1\n\n",
            config.generator_command,
            shell_quote(&config.properties_name)
        ));

        // a failed upload must not stop the remaining tables or the local
        // cleanup; it only decides the exit status
        contents.push_str("status=0\n");
        for table in Table::ALL {
            contents.push_str(&table_put_command(storage, tpch_home, remote_dir, table));
            contents.push_str(" || status=1\n");
        }
        contents.push('\n');
        for table in Table::ALL {
            contents.push_str(&format!("rm -f {}/{}\n", home, table.file_pattern()));
        }
        contents.push_str("exit $status\n");

        LauncherScript { contents }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Writes the script and marks it executable.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let staging_err = |source| Error::StagingFailure {
            path: path.to_path_buf(),
            source,
        };
        fs::write(path, &self.contents).map_err(staging_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(staging_err)?;
        }
        Ok(())
    }
}

/// File name the generator archive is staged under.
pub fn archive_name(config: &Config) -> String {
    config
        .generator_archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("tpch-gen.tar.gz"))
}

/// Where the generator writes its table files inside a staging directory.
pub fn tpch_home(stage_dir: &Path, config: &Config) -> PathBuf {
    stage_dir.join(&config.data_subdir)
}
