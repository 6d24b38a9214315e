//! Output formatting for build plans
//!
//! JSON is the default since CI systems feed it straight into a job matrix.
//! Field names and their order are part of the contract:
//!
//! ```text
//! {"image_platforms":[...],"images":[...]}
//! ```

use anyhow::{Context, Result};

use crate::matrix::BuildPlan;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact single-line JSON
    Json,
    /// Indented JSON for humans
    JsonPretty,
    /// YAML format
    Yaml,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Serializes a build plan according to the configured format
    pub fn format(&self, plan: &BuildPlan) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string(plan).context("Failed to serialize build plan to JSON")
            }
            OutputFormat::JsonPretty => serde_json::to_string_pretty(plan)
                .context("Failed to serialize build plan to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(plan).context("Failed to serialize build plan to YAML")
            }
        }
    }
}
