use anyhow::Result;
use capture_onboarding::{ErrorCode, OnboardingError, StoreError, cli, logging};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file before anything else (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Parse CLI arguments first to check for debug flag
    let cli_args = cli::Cli::parse();
    let debug = cli_args.debug;

    let config = cli::load_config(cli_args.config.as_deref())?;

    let log_dir = config.logging.log_dir();
    let mut log_config = logging::LogConfig::new()
        .with_log_dir(log_dir.clone())
        .with_file(config.logging.file.clone())
        .with_debug_mode(debug);
    if !debug {
        log_config = log_config.with_level(config.logging.level.clone());
    }

    let guard = logging::init_logging(log_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    // Clean up old log files (keep last 7 days)
    if debug
        && let Ok(removed) = logging::cleanup_old_logs(&log_dir, 7)
        && removed > 0
    {
        tracing::info!("🧹 Cleaned up {} old log file(s)", removed);
    }

    if let Err(e) = cli::run(cli_args, config).await {
        let code = if let Some(err) = e.downcast_ref::<OnboardingError>() {
            Some(err.code())
        } else if e.downcast_ref::<StoreError>().is_some() {
            Some(ErrorCode::Store)
        } else {
            None
        };

        if let Some(code) = code {
            eprintln!("Error: {:#}", e);
            drop(guard);
            std::process::exit(code as i32);
        }
        return Err(e);
    }

    Ok(())
}
