use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use aura_sample_data::app::Provisioner;
use aura_sample_data::config::ProvisionConfig;
use aura_sample_data::download::HttpArchiveClient;
use aura_sample_data::error::{FailureKind, ProvisionError};
use aura_sample_data::output::{ConsoleOutput, OutputMode};

#[derive(Parser)]
#[command(name = "aura-data")]
#[command(about = "Download and extract the AURA sample data into ./data")]
#[command(version)]
struct Cli {}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &ProvisionError) -> u8 {
    match error.kind() {
        FailureKind::Network => 3,
        FailureKind::HttpStatus => 4,
        FailureKind::Filesystem => 5,
        FailureKind::ArchiveFormat => 6,
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let _cli = Cli::parse();

    let console = ConsoleOutput::new(OutputMode::detect());
    let client = HttpArchiveClient::new().into_diagnostic()?;
    let provisioner = Provisioner::new(ProvisionConfig::default(), client);

    match provisioner.ensure_data_present(&console) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            console.print_failure(&err);
            Ok(ExitCode::from(map_exit_code(&err)))
        }
    }
}
