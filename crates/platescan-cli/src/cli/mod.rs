mod commands;
mod helpers;

use clap::Parser;
use platescan_core::calibration::FittingError;
use platescan_core::domain::{EngineError, ErrorCategory};
use tracing_subscriber::EnvFilter;

const PROGRAM_NAME: &str = "platescan";
const LOG_ENV_VAR: &str = "PLATESCAN_LOG";

pub fn run_from_env() -> i32 {
    init_tracing();
    let remaining: Vec<String> = std::env::args().skip(1).collect();

    match run(remaining) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.diagnostic_line());
            eprintln!("{}", error.fatal_exit_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once(PROGRAM_NAME.to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// `PLATESCAN_LOG` wins over `RUST_LOG`; warnings only by default.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "platescan",
    about = "Spectrum trace extraction and wavelength calibration for plate scans"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Extract the intensity profiles of the spectra drawn on a plate
    Extract(commands::ExtractArgs),
    /// Fit a pixel to wavelength function from lamp/material marks
    Calibrate(commands::CalibrateArgs),
    /// Filter a reference line list and optionally snap to the nearest peak
    Lines(commands::LinesArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Extract(args) => commands::run_extract_command(args),
        CliCommand::Calibrate(args) => commands::run_calibrate_command(args),
        CliCommand::Lines(args) => commands::run_lines_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Compute(#[from] EngineError),
    #[error(transparent)]
    Calibration(#[from] FittingError),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
    #[error("{0}")]
    Internal(String),
}

impl CliError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Usage(_) | Self::InvalidInput(_) => ErrorCategory::InputValidation,
            Self::Compute(error) => error.category(),
            Self::Calibration(_) => ErrorCategory::Computation,
            Self::Io(_) => ErrorCategory::IoSystem,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    fn placeholder(&self) -> &'static str {
        match self {
            Self::Usage(_) => "INPUT.CLI_USAGE",
            Self::InvalidInput(_) => "INPUT.JSON",
            Self::Compute(error) => error.placeholder(),
            Self::Calibration(_) => "RUN.CALIBRATION",
            Self::Io(_) => "IO.CLI",
            Self::Internal(_) => "RUN.INTERNAL",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Io(error) => format!("{error:#}"),
            other => other.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder(), self.message().trim_end())
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}
