//! gantry-inspect - entry point.
//!
//! Validates the Gantry labels of a Docker container list and prints a JSON
//! report on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tracing::debug;

use gantry_config::{ConfigLoader, LabelDecoder, DEFAULT_ENV_PREFIX};
use gantry_inspect::{inspect, log_config, read_instances, InputSource};

/// Exit code when any container or the settings failed validation.
const EXIT_INVALID: u8 = 2;

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
    /// Instance list source.
    input: InputSource,
    /// Pretty-print the report.
    pretty: bool,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;
        let mut input = InputSource::Stdin;
        let mut pretty = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--input" | "-i" => {
                    if let Some(value) = args.next() {
                        input = InputSource::from_arg(&value);
                    }
                }
                "--pretty" | "-p" => {
                    pretty = true;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("gantry-inspect {}", gantry_inspect::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config, input, pretty }
    }
}

fn print_help() {
    println!(
        r"gantry-inspect - Validate Gantry container labels

USAGE:
    gantry-inspect [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Extractor configuration file (TOML or JSON)
    -i, --input <PATH>     Container list as returned by GET /containers/json
                           (default: - for stdin)
    -p, --pretty           Pretty-print the report
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    GANTRY__LABELS__NAMESPACE        Label namespace (default: gantry)
    GANTRY__LOGGING__ENABLED         Enable logging (default: true)
    GANTRY__LOGGING__LEVEL           Log level (default: info)
    GANTRY__LOGGING__FORMAT          json or pretty (default: json)
    GANTRY__LOGGING__ANSI_ENABLED    Colour pretty output (default: false)

EXIT STATUS:
    0    Every tracked container and the settings are valid
    1    The configuration or the container list could not be read
    2    At least one container or the settings failed validation

EXAMPLES:
    curl -s --unix-socket /var/run/docker.sock http://localhost/containers/json \
        | gantry-inspect --pretty
"
    );
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut loader = ConfigLoader::new().with_dotenv();
    if let Some(path) = &args.config {
        loader = loader.with_file(path)?;
    }
    let config = loader
        .with_env_prefix(DEFAULT_ENV_PREFIX)
        .load()
        .context("failed to load configuration")?;

    gantry_telemetry::init_logging(&log_config(&config.logging))?;
    debug!(input = %args.input, namespace = %config.labels.namespace, "starting inspection");

    let instances = read_instances(&args.input)?;
    let decoder = LabelDecoder::from_config(&config)?;
    let report = inspect(&decoder, &instances);

    println!("{}", report.to_json(args.pretty)?);

    if report.has_failures() {
        Ok(ExitCode::from(EXIT_INVALID))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
