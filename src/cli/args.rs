//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgGroup, Args};

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// YouTube video link (watch?v= or youtu.be)
    #[arg(short, long)]
    pub url: String,

    /// Start time (HH:MM:SS)
    #[arg(short, long)]
    pub start: String,

    /// End time (HH:MM:SS)
    #[arg(short, long)]
    pub end: String,

    /// Return right after the job is created instead of waiting for it
    #[arg(long)]
    pub no_wait: bool,

    /// Download this resolution once the clip is ready (e.g. 720p)
    #[arg(long)]
    pub download: Option<String>,

    /// Directory for downloads
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Arguments for the speed command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "clip"])))]
pub struct SpeedArgs {
    /// Speed factor between 0.25 and 2.0
    #[arg(short = 'x', long)]
    pub factor: f64,

    /// Local video to upload (at most 50MB)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Artifact id of an earlier clip to use as the source
    #[arg(long)]
    pub clip: Option<String>,

    /// Return right after the job is created instead of waiting for it
    #[arg(long)]
    pub no_wait: bool,

    /// Directory for the edited video
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Job kind selector shared by several commands
#[derive(Args, Debug)]
pub struct KindArgs {
    /// Job kind: clip or speed
    #[arg(default_value = "clip")]
    pub kind: String,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub kind: KindArgs,

    /// Keep tracking a pending job until it settles
    #[arg(long)]
    pub wait: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the reset command
#[derive(Args, Debug)]
pub struct ResetArgs {
    #[command(flatten)]
    pub kind: KindArgs,

    /// Also forget the remembered clip form
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the download command
#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub kind: KindArgs,

    /// Resolution to download for clips (e.g. 1080p, 720p)
    #[arg(short, long, default_value = "720p")]
    pub resolution: String,

    /// Directory for downloads
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Arguments for the email command
#[derive(Args, Debug)]
pub struct EmailArgs {
    /// Recipient address
    pub address: String,
}
