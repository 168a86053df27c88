//! Submit and plan command implementations

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use deadline_bridge::config::Config;
use deadline_bridge::submit::{
    self, DeadlineCommand, SubmissionReport, Submitter, locate_deadline_bin,
};
use deadline_bridge::{PublishContext, SubmissionBatch};

/// CLI settings that can override config.toml values
#[derive(Debug, Default)]
pub struct CliSettings {
    pub deadline_path: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

fn load_context(path: &Path) -> Result<PublishContext> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read publish context: {}", path.display()))?;
    PublishContext::from_json(&content)
        .with_context(|| format!("Failed to parse publish context: {}", path.display()))
}

fn print_report(report: &SubmissionReport) {
    for job in &report.jobs {
        let order = job
            .order
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {} [order {}] {}", job.job_id, order, job.label);
    }
}

/// Submit every eligible job of a publish context
pub async fn submit_command(
    context_path: &Path,
    mut config: Config,
    cli_settings: CliSettings,
) -> Result<()> {
    if let Some(path) = cli_settings.deadline_path {
        config.deadline.path = Some(path);
    }
    if let Some(dir) = cli_settings.temp_dir {
        config.deadline.temp_dir = Some(dir);
    }
    if let Some(secs) = cli_settings.timeout_secs {
        config.deadline.timeout_secs = Some(secs);
    }

    let context = load_context(context_path)?;
    let batch = SubmissionBatch::from_context(&context);
    if batch.is_empty() {
        println!("Nothing to submit.");
        return Ok(());
    }

    let bin_dir = locate_deadline_bin(config.deadline.path.as_deref())?;
    let command = DeadlineCommand::new(bin_dir).with_timeout(config.deadline.timeout());
    let submitter = Submitter::new(command, config.deadline.temp_dir());

    match submitter.submit(&context, &batch).await {
        Ok(report) => {
            println!("Submitted {} job(s):", report.jobs.len());
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            if !e.submitted.jobs.is_empty() {
                println!("Already submitted before the failure:");
                print_report(&e.submitted);
            }
            Err(e.into())
        }
    }
}

/// Print the files a submit would write, without contacting the farm
pub fn plan_command(context_path: &Path) -> Result<()> {
    let context = load_context(context_path)?;
    let batch = SubmissionBatch::from_context(&context);
    let planned = submit::plan(&context, &batch);

    if planned.is_empty() {
        println!("Nothing to submit.");
        return Ok(());
    }

    for (index, job) in planned.iter().enumerate() {
        let order = job
            .order
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("#{} {} [order {}] as {}", index, job.label, order, job.placeholder_id);
        println!("--- job");
        print!("{}", job.job_file);
        println!("--- plugin");
        print!("{}", job.plugin_file);
        for aux in &job.auxiliary_files {
            println!("--- auxiliary {}", aux.display());
        }
        println!();
    }

    Ok(())
}
