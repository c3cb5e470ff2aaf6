//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::cli::args::{
    ClipArgs, DownloadArgs, EmailArgs, KindArgs, ResetArgs, SpeedArgs, StatusArgs,
};
use crate::config_initialization::ClientConfig;
use crate::domain::errors::DomainError;
use crate::domain::model::{
    ClipPayload, CutRange, Job, JobKind, JobStatus, SpeedEditPayload, SpeedSource, TimeSpec,
};
use crate::utils::Utils;

/// Domain errors reach the user with the server's wording intact
fn user_error(e: DomainError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

fn parse_kind(args: &KindArgs) -> Result<JobKind> {
    JobKind::parse(&args.kind).map_err(user_error)
}

fn download_dir(config: &ClientConfig, dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| config.download_dir.clone())
}

/// Execute the clip command
pub async fn clip(container: &DefaultAppContainer, config: &ClientConfig, args: ClipArgs) -> Result<()> {
    let start = TimeSpec::parse(&args.start)
        .map_err(|e| anyhow::anyhow!("Invalid start time '{}': {}", args.start, e))?;
    let end = TimeSpec::parse(&args.end)
        .map_err(|e| anyhow::anyhow!("Invalid end time '{}': {}", args.end, e))?;
    let range = CutRange::new(start, end).map_err(user_error)?;

    let interactor = container.clip_interactor();
    let job = interactor
        .execute(ClipPayload {
            source_url: args.url.trim().to_string(),
            range,
        })
        .await
        .map_err(user_error)?;

    if let Some(title) = interactor.saved_form().map_err(user_error)?.video_title {
        println!("Video: {}", title);
    }
    if args.no_wait {
        print_job(&job);
        return Ok(());
    }

    let job = interactor.wait().await.map_err(user_error)?;
    print_job(&job);
    finish(&job)?;

    if let Some(resolution) = args.download {
        let path = interactor
            .download(&resolution, &download_dir(config, args.dir))
            .await
            .map_err(user_error)?;
        report_saved(&path).await;
    }
    Ok(())
}

/// Execute the speed command
pub async fn speed(container: &DefaultAppContainer, config: &ClientConfig, args: SpeedArgs) -> Result<()> {
    let source = match (args.file, args.clip) {
        (Some(path), _) => SpeedSource::Upload { path },
        (None, Some(artifact_id)) => SpeedSource::Clip { artifact_id },
        (None, None) => anyhow::bail!("Either --file or --clip is required"),
    };

    let interactor = container.speed_interactor();
    let job = interactor
        .execute(SpeedEditPayload {
            speed_factor: args.factor,
            source,
        })
        .await
        .map_err(user_error)?;

    if args.no_wait {
        print_job(&job);
        return Ok(());
    }

    let job = interactor.wait().await.map_err(user_error)?;
    print_job(&job);
    finish(&job)?;

    let path = interactor
        .download(&download_dir(config, args.dir))
        .await
        .map_err(user_error)?;
    report_saved(&path).await;
    Ok(())
}

/// Execute the status command
pub async fn status(container: &DefaultAppContainer, args: StatusArgs) -> Result<()> {
    let tracker = container.tracker(parse_kind(&args.kind)?);

    let job = if args.wait {
        crate::app::wait_interruptible(tracker).await.map_err(user_error)?
    } else {
        // the container loaded the job without a poller; ask the server once
        if tracker.snapshot().is_pending() {
            let outcome = tracker.poll().await;
            info!(?outcome, "Refreshed pending job");
        }
        tracker.snapshot()
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&job_json(&job))
            .context("Failed to serialize job to JSON")?;
        println!("{}", rendered);
    } else {
        print_job(&job);
    }
    Ok(())
}

/// Execute the cancel command
pub async fn cancel(container: &DefaultAppContainer, args: KindArgs) -> Result<()> {
    let tracker = container.tracker(parse_kind(&args)?);
    let job = tracker.cancel().await.map_err(user_error)?;
    print_job(&job);
    Ok(())
}

/// Execute the reset command
pub fn reset(container: &DefaultAppContainer, args: ResetArgs) -> Result<()> {
    let kind = parse_kind(&args.kind)?;
    container.tracker(kind).reset();
    if args.all && kind == JobKind::Clip {
        container.clip_interactor().clear_form().map_err(user_error)?;
    }
    println!("{} job cleared", kind);
    Ok(())
}

/// Execute the download command
pub async fn download(container: &DefaultAppContainer, config: &ClientConfig, args: DownloadArgs) -> Result<()> {
    let dir = download_dir(config, args.dir);
    let path = match parse_kind(&args.kind)? {
        JobKind::Clip => container
            .clip_interactor()
            .download(&args.resolution, &dir)
            .await,
        JobKind::SpeedEdit => container.speed_interactor().download(&dir).await,
    }
    .map_err(user_error)?;

    report_saved(&path).await;
    Ok(())
}

/// Execute the email command
pub async fn email(container: &DefaultAppContainer, args: EmailArgs) -> Result<()> {
    container
        .clip_interactor()
        .send_email(&args.address)
        .await
        .map_err(user_error)?;
    println!("Clip sent to {}", args.address.trim());
    Ok(())
}

async fn report_saved(path: &Path) {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => println!(
            "Saved {} ({})",
            path.display(),
            Utils::format_file_size(metadata.len())
        ),
        Err(_) => println!("Saved {}", path.display()),
    }
}

/// Turn a settled job into the command's exit status
fn finish(job: &Job) -> Result<()> {
    match job.status {
        JobStatus::Completed => Ok(()),
        JobStatus::Failed => Err(anyhow::anyhow!(job
            .error_message
            .clone()
            .unwrap_or_else(|| "Processing failed".to_string()))),
        JobStatus::Cancelled => {
            warn!("Job cancelled");
            Err(anyhow::anyhow!("Job cancelled"))
        }
        status => Err(anyhow::anyhow!("Job ended in unexpected state {}", status)),
    }
}

/// Display a job in human-readable form
fn print_job(job: &Job) {
    println!("{} job: {}", job.kind, job.status);
    if let Some(id) = &job.id {
        println!("  id:      {}", id);
    }
    if let Some(elapsed) = job.elapsed(Utc::now()).and_then(|d| d.to_std().ok()) {
        println!("  elapsed: {}", Utils::format_duration(elapsed));
    }
    if let Some(message) = &job.error_message {
        println!("  error:   {}", message);
    }
    for (label, artifact) in job.result.artifacts() {
        match artifact.size_label() {
            Some(size) => println!("  {:<8} {} ({})", label, artifact.download_url, size),
            None => println!("  {:<8} {}", label, artifact.download_url),
        }
    }
}

fn job_json(job: &Job) -> serde_json::Value {
    json!({
        "kind": job.kind,
        "status": job.status,
        "id": job.id,
        "created_at": job.created_at,
        "error_message": job.error_message,
        "result": job.result,
    })
}
