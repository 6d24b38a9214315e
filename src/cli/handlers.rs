use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use super::commands::CliArgs;
use super::output::OutputFormatter;
use crate::config::MatrixConfig;
use crate::fs::{FileSystem, RealFileSystem};
use crate::matrix::{split_list, AppAggregator, AppSelection, BuildPlan, MatrixEngine, RunRequest};
use crate::probe::ScriptProbe;

/// Run one matrix generation and return the process exit code
pub async fn handle_run(args: &CliArgs) -> i32 {
    match run(args).await {
        Ok(plan) => match emit(args, &plan) {
            Ok(()) => 0,
            Err(e) => {
                error!("Failed to write build plan: {:#}", e);
                eprintln!("Error: {:#}", e);
                1
            }
        },
        Err(e) => {
            error!("Build matrix generation failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

async fn run(args: &CliArgs) -> Result<BuildPlan> {
    let default_config = MatrixConfig::default();
    let config = MatrixConfig {
        apps_root: args.apps_root.clone().unwrap_or(default_config.apps_root.clone()),
        concurrency: args.jobs.unwrap_or(default_config.concurrency),
        ..default_config
    };
    debug!("Configuration: {:?}", config);

    config.validate()?;

    if config.credentials.owner.is_none() && !args.force {
        warn!(
            "No registry owner configured (GITHUB_REPOSITORY_OWNER or REPO_OWNER); \
             published versions cannot be checked and every channel will be built"
        );
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let probe = ScriptProbe::with_timeout(fs.clone(), config.probe_timeout());
    let lookup = config.create_lookup()?;
    let engine = MatrixEngine::new(fs.clone(), Arc::new(probe), Arc::new(lookup));
    let aggregator = AppAggregator::new(fs, engine, config.apps_root.clone())
        .with_concurrency(config.concurrency);

    let request = RunRequest {
        apps: AppSelection::parse(&args.apps),
        for_release: args.for_release,
        force: args.force,
        channels: args.channels.as_deref().map(split_list).unwrap_or_default(),
    };
    info!(
        apps_root = %config.apps_root.display(),
        apps = %args.apps,
        "Generating build matrix"
    );

    Ok(aggregator.run(&request).await?)
}

fn emit(args: &CliArgs, plan: &BuildPlan) -> Result<()> {
    let formatter = OutputFormatter::new(args.format.into());
    let output = formatter.format(plan)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", output))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Build plan written to {}", path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}
