//! hostlist-resolver - resolve a hostname list into a JSON result store

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use hostlist_resolver::config::DEFAULT_LOG_FILE;
use hostlist_resolver::{ProcessConfig, Processor, Strategy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Usage: hostlist-resolver input_file output_file";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File with one hostname per line
    input_file: PathBuf,

    /// JSON file the results are saved to
    output_file: PathBuf,

    /// How results are written to the output file
    #[arg(long, value_enum, default_value_t = StrategyArg::Batch)]
    strategy: StrategyArg,

    /// Append-only error log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Directory for temp_results.json and old_results.json
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// Merge all results into the output once, at the end
    Batch,
    /// Reset the output, then rewrite it after every hostname
    Incremental,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Batch => Self::Batch,
            StrategyArg::Incremental => Self::Incremental,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            println!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostlist_resolver=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ProcessConfig::new(cli.input_file, cli.output_file)
        .with_strategy(cli.strategy.into())
        .with_log_file(&cli.log_file)
        .with_work_dir(cli.work_dir);

    let processor = Processor::new(config);
    if let Err(e) = processor.process(&mut std::io::stdout()) {
        tracing::error!(error = %e, "Failed to write to stdout");
    }

    println!(
        "Any errors encountered have been logged to {}",
        cli.log_file.display()
    );
    ExitCode::SUCCESS
}
