use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::process;
use std::time::Instant;
use tpch_load::config::Config;
use tpch_load::params::{Cli, Parameters};
use tpch_load::{Error, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod coordinator_node;
use coordinator_node::make_coordinator;

const DEFAULT_LOG_FILTER: &str = "tpch_load=info,coordinator=info";

#[tokio::main]
async fn main() {
    init_logging();

    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            -1
        }
    };
    process::exit(code);
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses the command line. Anything clap rejects (wrong argument count,
/// unparsable numbers) prints the parameter documentation and becomes a
/// usage error; `--help` and `--version` exit normally.
fn parse_args<I, T>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = Cli::command().print_long_help();
            Err(Error::Usage(e.to_string()))
        }
    }
}

async fn run() -> Result<()> {
    let cli = parse_args(std::env::args_os())?;

    let params = Parameters::validate(&cli)?;
    let config = Config::load(cli.config.as_deref())?;

    println!("TPC-H data generation and load");
    println!("  scale factor:    {}", params.scale_factor);
    println!("  file splits:     {}", params.num_file_splits);
    println!("  zipf factor:     {}", params.zipf_factor);
    println!("  host list:       {}", params.host_list_path.display());
    println!("  local directory: {}", params.local_dir.display());
    println!("  HDFS directory:  {}", params.remote_dir);

    let start = Instant::now();
    let summary = make_coordinator(params, config).await?;

    let failed: Vec<String> = summary
        .outcomes
        .iter()
        .filter(|o| !o.success())
        .map(|o| format!("{} (splits {})", o.host, o.assignment))
        .collect();
    if failed.is_empty() {
        info!(
            "{} job(s) finished, {} remote directories created",
            summary.outcomes.len(),
            summary.remote_dirs.len()
        );
    } else {
        warn!("jobs failed on: {}; see their logs", failed.join(", "));
    }

    println!("Elapsed time: {:.2?}", start.elapsed());
    Ok(())
}
