use std::process::ExitCode;

use validate_xml_dir::cli::{Cli, is_informational, usage_message};
use validate_xml_dir::logging::init_logging;
use validate_xml_dir::{ConfigManager, Reporter, TracingReporter, ValidationError};

/// Exit code for command line usage errors
const USAGE_ERROR: u8 = 2;

fn main() -> ExitCode {
    let reporter = TracingReporter;

    let cli = match Cli::resolve(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            init_logging(false);
            reporter.error(&usage_message(&err));
            return ExitCode::from(USAGE_ERROR);
        }
    };

    let config = match ConfigManager::load_config(&cli).map_err(ValidationError::from) {
        Ok(config) => config,
        Err(err) => {
            init_logging(cli.verbose);
            reporter.error(&err.to_string());
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.verbose);
    reporter.debug(&format!("{config:?}"));

    match validate_xml_dir::run(&config, &reporter) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            reporter.error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}
