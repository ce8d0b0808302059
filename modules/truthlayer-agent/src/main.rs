use std::sync::atomic::Ordering;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use truthlayer_agent::learning::LearningStore;
use truthlayer_agent::pipeline::{Orchestrator, PipelineObserver};
use truthlayer_agent::session::{self, LastRun};
use truthlayer_common::{
    AgentState, Config, FeedbackHints, FeedbackKind, LogEntry, LogLevel, Priorities, UserCommand,
    UserInfo, UserPreferences,
};

const STORE_FILE: &str = "memory.json";

#[derive(Parser)]
#[command(name = "truthlayer", about = "Investigate rental listings before you sign")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape, research, score and act on a listing
    Investigate {
        url: String,
        #[command(flatten)]
        prefs: PrefsArgs,
        /// Print the full run as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run an action on the last investigated listing
    Act {
        #[arg(value_enum)]
        action: ActArg,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Rate the last report
    Feedback {
        #[arg(value_enum)]
        rating: Rating,
        #[arg(long)]
        safety_too_high: bool,
        #[arg(long)]
        noise_too_low: bool,
        #[arg(long)]
        value_too_strict: bool,
        #[arg(long)]
        commute_too_important: bool,
    },
    /// Show source reliability weights
    Weights,
    /// Show recent listing outcomes
    History,
}

#[derive(Args)]
struct PrefsArgs {
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value_t = 0)]
    budget: u32,
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    safety: u8,
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    commute: u8,
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    quietness: u8,
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    value: u8,
}

impl From<PrefsArgs> for UserPreferences {
    fn from(args: PrefsArgs) -> Self {
        UserPreferences {
            city: args.city,
            budget: args.budget,
            priorities: Priorities {
                safety: args.safety,
                commute: args.commute,
                quietness: args.quietness,
                value: args.value,
            },
        }
    }
}

#[derive(Args)]
struct UserArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    message: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActArg {
    Shortlist,
    Blacklist,
    ScheduleTour,
    Share,
}

impl From<ActArg> for UserCommand {
    fn from(arg: ActArg) -> Self {
        match arg {
            ActArg::Shortlist => UserCommand::Shortlist,
            ActArg::Blacklist => UserCommand::Blacklist,
            ActArg::ScheduleTour => UserCommand::ScheduleTour,
            ActArg::Share => UserCommand::Share,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Rating {
    Up,
    Down,
}

/// Prints pipeline progress for a human at the terminal.
struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn state_changed(&mut self, state: AgentState) {
        if state != AgentState::Idle {
            eprintln!("== {state}");
        }
    }

    fn log(&mut self, entry: &LogEntry) {
        let marker = match entry.level {
            LogLevel::Info => " ",
            LogLevel::Success => "+",
            LogLevel::Warning => "!",
            LogLevel::Error => "x",
        };
        eprintln!("{marker} [{}] {}", entry.source, entry.message);
    }
}

struct QuietObserver;

impl PipelineObserver for QuietObserver {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("truthlayer=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_redacted();

    let mut store = LearningStore::load(config.data_dir.join(STORE_FILE))
        .context("Failed to open learning store")?;

    match cli.command {
        Command::Investigate { url, prefs, json } => {
            let orchestrator = Orchestrator::from_config(&config)?;

            let cancel = orchestrator.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Cancellation requested, stopping after the current phase");
                    cancel.store(true, Ordering::SeqCst);
                }
            });

            let prefs: UserPreferences = prefs.into();
            let mut console = ConsoleObserver;
            let mut quiet = QuietObserver;
            let observer: &mut dyn PipelineObserver = if json { &mut quiet } else { &mut console };

            let outcome = orchestrator.run(&url, &prefs, &mut store, observer).await?;
            session::save(&config.data_dir, &LastRun::from_outcome(&outcome))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let report = &outcome.report;
                println!("{} ({:.0}/100)", report.verdict_title, report.overall_score);
                println!("{}", report.summary);
                println!(
                    "Scam risk: {} | Safety: {}/10 | Quiet: {}/10 | Value: {} | Commute: {}",
                    report.scores.scam_risk,
                    report.scores.safety,
                    report.scores.noise,
                    report.scores.value,
                    report.scores.commute
                );
                for evidence in &report.evidence {
                    println!("  {} ({:?})", evidence.category, evidence.sentiment);
                    for point in &evidence.points {
                        println!("    - {point}");
                    }
                }
                println!("Next step: {:?}", report.action_recommendation);
                for action in &outcome.actions {
                    println!("  [{}] {}", action.status, action.description);
                }
            }
        }

        Command::Act { action, user } => {
            let Some(last) = session::load(&config.data_dir)? else {
                bail!("No listing has been investigated yet");
            };
            let orchestrator = Orchestrator::from_config(&config)?;

            let user_info = match (user.name, user.email.or_else(|| config.user_email.clone())) {
                (Some(name), Some(email)) => Some(UserInfo {
                    name,
                    email,
                    phone: user.phone,
                    message: user.message,
                }),
                _ => None,
            };

            let actions = orchestrator
                .execute_user_command(
                    action.into(),
                    &last.listing,
                    &last.report,
                    user_info.as_ref(),
                    &mut store,
                )
                .await?;
            for action in &actions {
                println!("[{}] {}", action.status, action.description);
            }
        }

        Command::Feedback {
            rating,
            safety_too_high,
            noise_too_low,
            value_too_strict,
            commute_too_important,
        } => {
            let Some(last) = session::load(&config.data_dir)? else {
                bail!("No listing has been investigated yet");
            };
            let kind = match rating {
                Rating::Up => FeedbackKind::ThumbsUp,
                Rating::Down => FeedbackKind::ThumbsDown,
            };
            let hints = FeedbackHints {
                safety_too_high,
                noise_too_low,
                value_too_strict,
                commute_too_important,
            };

            let outcome = store.record_feedback(&last.listing.url, kind, &hints, &last.report)?;
            for weight in &outcome.penalized {
                println!(
                    "Lowered {} to {} ({})",
                    weight.source, weight.reliability, weight.trend
                );
            }
            println!("Feedback recorded");
        }

        Command::Weights => {
            for weight in store.weights() {
                println!("{:<18} {:>3}  {}", weight.source, weight.reliability, weight.trend);
            }
        }

        Command::History => {
            for entry in store.history().iter().rev() {
                let feedback = entry
                    .user_feedback
                    .map(|f| format!(" ({f:?})"))
                    .unwrap_or_default();
                println!(
                    "{}  {:?}{}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.verdict,
                    feedback,
                    entry.url
                );
            }
        }
    }

    Ok(())
}
