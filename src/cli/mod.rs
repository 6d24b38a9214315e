pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, OutputFormatArg};
pub use handlers::handle_run;
pub use output::{OutputFormat, OutputFormatter};
