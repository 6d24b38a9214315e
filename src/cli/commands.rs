use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Build matrix generator for multi-app container image pipelines
#[derive(Parser, Debug)]
#[command(
    name = "buildmatrix",
    about = "Build matrix generator for multi-app container image pipelines",
    version,
    author,
    long_about = "buildmatrix resolves the latest upstream version of every app channel, \
                  compares it with the version already published to the container registry \
                  and prints a JSON plan of the images and per-platform builds that are stale.\n\n\
                  Examples:\n  \
                  buildmatrix all false false\n  \
                  buildmatrix radarr,sonarr true false\n  \
                  buildmatrix radarr false true stable,nightly"
)]
pub struct CliArgs {
    #[arg(value_name = "APPS", help = "Comma-separated app names, or 'all'")]
    pub apps: String,

    #[arg(
        value_name = "FOR_RELEASE",
        value_parser = parse_bool_flag,
        action = ArgAction::Set,
        required = true,
        help = "Release build flag (true/false), currently informational"
    )]
    pub for_release: bool,

    #[arg(
        value_name = "FORCE",
        value_parser = parse_bool_flag,
        action = ArgAction::Set,
        required = true,
        help = "Rebuild without checking published versions (true/false)"
    )]
    pub force: bool,

    #[arg(
        value_name = "CHANNELS",
        help = "Comma-separated channel names to restrict processing to"
    )]
    pub channels: Option<String>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory containing one subdirectory per app [default: apps]"
    )]
    pub apps_root: Option<PathBuf>,

    #[arg(
        short = 'j',
        long,
        value_name = "N",
        help = "Number of apps processed concurrently"
    )]
    pub jobs: Option<usize>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    JsonPretty,
    Yaml,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::JsonPretty => super::output::OutputFormat::JsonPretty,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
        }
    }
}

/// Boolean spellings accepted by CI pipelines (`1`, `t`, `TRUE`, `false`, ...)
pub fn parse_bool_flag(s: &str) -> Result<bool, String> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("invalid boolean '{}', expected true or false", s)),
    }
}
