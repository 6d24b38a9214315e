use buildmatrix::cli::{handle_run, CliArgs};
use buildmatrix::util::{init_logging, LoggingConfig};
use buildmatrix::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::resolve(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("buildmatrix v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = handle_run(&args).await;
    std::process::exit(exit_code);
}
