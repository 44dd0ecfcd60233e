//! CLI Module
//!
//! Command-line interface for the onboarding wizard using Clap v4.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::sync::Arc;

use crate::config::Config;
use crate::onboarding::{
    OnboardingWizard, ProviderChoice, Renderer, StaticProbe, Step, Transition, TracingNotifier,
};
use crate::store;
use crate::tui::{ConsoleRenderer, WizardCommand, map_key};

/// Capture onboarding - resumable first-run setup wizard
#[derive(Parser, Debug)]
#[command(name = "capture-onboarding")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (creates log files in .capture/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive wizard (default)
    Run,

    /// Show where the user is in onboarding
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Advance to the next step (finishes on the last step)
    Next,

    /// Go back one step, or jump to an earlier STEP (name or id)
    Back {
        step: Option<Step>,
    },

    /// Pick the AI provider on the provider selection step
    Select {
        /// hosted, openai, ollama or custom
        provider: ProviderChoice,
    },

    /// Mark onboarding as done from the current step
    Complete,

    /// Discard all progress and start over
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Log management operations
    Logs {
        #[command(subcommand)]
        operation: LogCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Show log file location and status
    Status,
    /// View recent log entries (requires debug mode)
    View {
        /// Number of lines to show (default: 50)
        #[arg(short, long, default_value = "50")]
        lines: usize,
    },
    /// Clean up old log files
    Clean {
        /// Maximum age in days (default: 7)
        #[arg(short = 'a', long, default_value = "7")]
        days: u64,
    },
}

/// Main CLI entry point
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    if cli.debug {
        tracing::info!("Debug mode enabled");
    }

    match cli.command {
        None | Some(Commands::Run) => cmd_run(&config).await,
        Some(Commands::Status { json }) => cmd_status(&config, json).await,
        Some(Commands::Next) => cmd_next(&config).await,
        Some(Commands::Back { step }) => cmd_back(&config, step).await,
        Some(Commands::Select { provider }) => cmd_select(&config, provider).await,
        Some(Commands::Complete) => cmd_complete(&config).await,
        Some(Commands::Reset { force }) => cmd_reset(&config, force).await,
        Some(Commands::Logs { operation }) => cmd_logs(&config, operation),
    }
}

/// Load configuration from file or defaults
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = config_path {
        tracing::info!("Loading configuration from custom path: {}", path);
        Config::load_from_path(path)?
    } else {
        tracing::debug!("Loading default configuration");
        Config::load()?
    };

    config.validate()?;

    Ok(config)
}

/// Wire the configured store and probe into a wizard
async fn build_wizard(
    config: &Config,
    renderer: impl Renderer + 'static,
) -> Result<OnboardingWizard> {
    let state_path = config.onboarding.state_path();
    let store = store::open(config.onboarding.store, &state_path).await?;

    Ok(OnboardingWizard::new(store)
        .with_renderer(renderer)
        .with_notifier(Arc::new(TracingNotifier))
        .with_probe(Arc::new(StaticProbe::new(config.probe.assume_granted))))
}

fn stdout_renderer() -> ConsoleRenderer<std::io::Stdout> {
    let stdout = std::io::stdout();
    let color = stdout.is_terminal();
    ConsoleRenderer::new(stdout).with_color(color)
}

/// Let a capability check spawned by the last transition finish before the
/// runtime shuts down
async fn settle(wizard: &mut OnboardingWizard) {
    if let Some(handle) = wizard.take_capability_check() {
        if let Err(e) = handle.await {
            tracing::debug!("Capability check task ended abnormally: {}", e);
        }
        tracing::debug!(state = ?wizard.capability_status().get(), "Capability check settled");
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    step: Step,
    step_id: u32,
    number: usize,
    total: usize,
    schema_version: u32,
    completed: bool,
    selection: Option<ProviderChoice>,
}

async fn cmd_status(config: &Config, json: bool) -> Result<()> {
    let mut wizard = build_wizard(config, crate::onboarding::NullRenderer).await?;
    let state = wizard.state().await?;
    let step = wizard.resolve().await?;

    let report = StatusReport {
        step,
        step_id: state.step_id,
        number: step.number().min(Step::total()),
        total: Step::total(),
        schema_version: state.schema_version,
        completed: state.completed,
        selection: state.selection,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("📋 Onboarding Status\n");
    println!(
        "Store: {:?} ({})",
        config.onboarding.store,
        config.onboarding.state_path().display()
    );
    println!(
        "Completed: {}",
        if report.completed { "✅ yes" } else { "❌ no" }
    );
    println!(
        "Step: {}/{} {} ({})",
        report.number,
        report.total,
        step.title(),
        step.name()
    );
    println!("Schema version: {}", report.schema_version);
    println!(
        "Provider: {}",
        report
            .selection
            .map(|p| p.label().to_string())
            .unwrap_or_else(|| "not chosen".to_string())
    );

    Ok(())
}

async fn cmd_next(config: &Config) -> Result<()> {
    let mut wizard = build_wizard(config, stdout_renderer()).await?;
    wizard.advance().await?;
    settle(&mut wizard).await;
    Ok(())
}

async fn cmd_back(config: &Config, step: Option<Step>) -> Result<()> {
    let mut wizard = build_wizard(config, stdout_renderer()).await?;
    match step {
        Some(target) => {
            wizard.go_back(target).await?;
        }
        None => {
            if wizard.back().await?.is_none() {
                println!("Already at the first step");
            }
        }
    }
    settle(&mut wizard).await;
    Ok(())
}

async fn cmd_select(config: &Config, provider: ProviderChoice) -> Result<()> {
    let mut wizard = build_wizard(config, stdout_renderer()).await?;
    wizard.select(provider).await?;
    Ok(())
}

async fn cmd_complete(config: &Config) -> Result<()> {
    let mut wizard = build_wizard(config, stdout_renderer()).await?;
    wizard.complete().await?;
    settle(&mut wizard).await;
    Ok(())
}

async fn cmd_reset(config: &Config, force: bool) -> Result<()> {
    if !force {
        print!("Reset all onboarding progress? [y/N] ");
        std::io::stdout().flush()?;

        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Aborted");
            return Ok(());
        }
    }

    let mut wizard = build_wizard(config, stdout_renderer()).await?;
    wizard.reset().await?;
    Ok(())
}

/// Restores cooked mode however the interactive loop exits
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            tracing::warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Interactive wizard: draw the resolved step and react to key presses
/// until the user finishes, skips, or quits.
async fn cmd_run(config: &Config) -> Result<()> {
    use crossterm::event::{Event, EventStream};
    use futures::StreamExt;

    let renderer = ConsoleRenderer::new(std::io::stdout()).interactive();
    let mut wizard = build_wizard(config, renderer).await?;

    if !wizard.needs_onboarding().await? {
        println!("✅ Onboarding already complete. Run `capture-onboarding reset` to start over.");
        return Ok(());
    }

    {
        let _raw = RawModeGuard::enter()?;
        let mut step = wizard.show().await?;
        let mut reader = EventStream::new();

        while let Some(event) = reader.next().await {
            let key = match event? {
                Event::Key(key) => key,
                Event::Resize(_, _) => {
                    step = wizard.show().await?;
                    continue;
                }
                _ => continue,
            };

            match map_key(key, step) {
                WizardCommand::Next => match wizard.advance().await? {
                    Transition::Entered(next) => step = next,
                    Transition::Completed => break,
                },
                WizardCommand::Back => {
                    if let Some(previous) = wizard.back().await? {
                        step = previous;
                    }
                }
                WizardCommand::Select(provider) => wizard.select(provider).await?,
                WizardCommand::Skip => {
                    wizard.complete().await?;
                    break;
                }
                WizardCommand::Quit => {
                    tracing::info!(step = %step, "Onboarding paused");
                    break;
                }
                WizardCommand::None => {}
            }
        }
    }

    settle(&mut wizard).await;
    Ok(())
}

/// Log management commands
fn cmd_logs(config: &Config, operation: LogCommands) -> Result<()> {
    use crate::logging;
    use std::io::{BufRead, BufReader};

    let log_dir = config.logging.log_dir();

    match operation {
        LogCommands::Status => {
            println!("📊 Logging Status\n");
            println!("Log directory: {}", log_dir.display());

            match logging::get_log_path(&log_dir) {
                Some(latest) => {
                    println!("Status: ✅ Active");
                    println!("Latest log: {}", latest.display());
                }
                None => {
                    println!("Status: ❌ No logs found");
                    println!("\n💡 To enable debug logging, run with -d flag:");
                    println!("   capture-onboarding -d");
                }
            }

            Ok(())
        }

        LogCommands::View { lines } => {
            if let Some(log_path) = logging::get_log_path(&log_dir) {
                println!(
                    "📜 Viewing last {} lines of: {}\n",
                    lines,
                    log_path.display()
                );

                let file = std::fs::File::open(&log_path)?;
                let reader = BufReader::new(file);

                let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();
                let start = all_lines.len().saturating_sub(lines);

                for line in &all_lines[start..] {
                    println!("{}", line);
                }

                if all_lines.is_empty() {
                    println!("(empty log file)");
                }
            } else {
                println!("❌ No log files found.\n");
                println!("💡 Run with -d flag to enable debug logging:");
                println!("   capture-onboarding -d");
            }

            Ok(())
        }

        LogCommands::Clean { days } => {
            println!("🧹 Cleaning up log files older than {} days...\n", days);

            match logging::cleanup_old_logs(&log_dir, days) {
                Ok(removed) if removed > 0 => println!("✅ Removed {} old log file(s)", removed),
                Ok(_) => println!("✅ No old log files to remove"),
                Err(e) => println!("❌ Error cleaning logs: {}", e),
            }

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_back_with_step_name() {
        let cli = Cli::try_parse_from(["capture-onboarding", "back", "permissions"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Back {
                step: Some(Step::Permissions)
            })
        ));
    }

    #[test]
    fn test_parse_select_provider() {
        let cli = Cli::try_parse_from(["capture-onboarding", "-d", "select", "Ollama"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Some(Commands::Select {
                provider: ProviderChoice::Ollama
            })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["capture-onboarding", "select", "nope"]).is_err());
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["capture-onboarding"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[tokio::test]
    async fn test_commands_against_file_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.onboarding.state_path = Some(dir.path().join("onboarding.toml"));

        cmd_next(&config).await.unwrap();
        cmd_next(&config).await.unwrap();
        cmd_back(&config, Some(Step::Welcome)).await.unwrap();

        let mut wizard = build_wizard(&config, crate::onboarding::NullRenderer)
            .await
            .unwrap();
        assert_eq!(wizard.resolve().await.unwrap(), Step::Welcome);

        cmd_complete(&config).await.unwrap();
        assert!(!wizard.needs_onboarding().await.unwrap());

        cmd_reset(&config, true).await.unwrap();
        assert!(wizard.needs_onboarding().await.unwrap());
    }
}
