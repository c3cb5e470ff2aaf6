//! CLI module for VidClip
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// VidClip CLI
///
/// A command-line client for a remote YouTube clip and speed-edit service.
/// Jobs survive restarts: the session file remembers what is in flight.
#[derive(Parser, Debug)]
#[command(name = "vidclip")]
#[command(about = "VidClip - Cut YouTube clips and change video speed from the command line")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, `[vidclip]` section)
    #[arg(long, env = "VIDCLIP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the clip service
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// Session file that mirrors in-flight jobs
    #[arg(long, global = true)]
    pub mirror: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut a segment out of a YouTube video
    Clip(args::ClipArgs),
    /// Change the playback speed of an uploaded video or an earlier clip
    Speed(args::SpeedArgs),
    /// Show the tracked job of a kind
    Status(args::StatusArgs),
    /// Cancel the pending job of a kind
    Cancel(args::KindArgs),
    /// Forget the tracked job of a kind
    Reset(args::ResetArgs),
    /// Download an artifact of the tracked job
    Download(args::DownloadArgs),
    /// Send the finished clip to an email address
    Email(args::EmailArgs),
}
