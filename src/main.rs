//! VidClip CLI
//!
//! A command-line client for a remote YouTube clip and speed-edit service.
//!
//! # Features
//!
//! - Clip a time range out of a YouTube video in several resolutions
//! - Speed up or slow down an uploaded video or an earlier clip
//! - Jobs survive restarts; `status --wait` picks a pending job back up
//! - Ctrl-C while waiting cancels the job on the server
//!
//! # Usage
//!
//! ```bash
//! vidclip clip --url "https://youtu.be/dQw4w9WgXcQ" --start 00:00:10 --end 00:00:40 --download 720p
//! vidclip speed --factor 1.5 --file talk.mp4
//! vidclip status clip --wait
//! vidclip cancel speed
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use vidclip_cli::app::container::DefaultAppContainer;
use vidclip_cli::cli::{commands, Cli, Commands};
use vidclip_cli::config_initialization::initialize_configuration_hierarchy;
use vidclip_cli::utils::logging::LoggingSystem;

/// Main entry point for the VidClip CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(&cli).context("Invalid configuration")?;

    // Initialize logging
    let logging = LoggingSystem::new(config.logging_config());
    logging.initialize()?;
    logging.log_system_info();

    info!(api = %config.api_base_url, mirror = %config.mirror_path.display(), "Starting VidClip");

    // only a waiting status command keeps a restored job polling
    let resume_polling = matches!(&cli.command, Commands::Status(args) if args.wait);
    let container = DefaultAppContainer::new(&config, resume_polling)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Failed to initialize")?;

    // Execute the requested command
    let result = match cli.command {
        Commands::Clip(args) => commands::clip(&container, &config, args).await,
        Commands::Speed(args) => commands::speed(&container, &config, args).await,
        Commands::Status(args) => commands::status(&container, args).await,
        Commands::Cancel(args) => commands::cancel(&container, args).await,
        Commands::Reset(args) => commands::reset(&container, args),
        Commands::Download(args) => commands::download(&container, &config, args).await,
        Commands::Email(args) => commands::email(&container, args).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
