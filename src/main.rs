//! Application entry point for celebration-bot.
//!
//! Runs once: loads the roster, finds today's events and delivers them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use anyhow::Result;
use celebration_bot::config::Config;
use celebration_bot::config::resolve_config_path;
use celebration_bot::event::EventMatch;
use celebration_bot::event::date_keys;
use celebration_bot::event::event_columns;
use celebration_bot::event::find_events;
use celebration_bot::logging::setup_logging;
use celebration_bot::messenger::MessageComposer;
use celebration_bot::messenger::telegram::TelegramSender;
use celebration_bot::notifier::DeliveryOptions;
use celebration_bot::notifier::Notifier;
use celebration_bot::poster::PosterFont;
use celebration_bot::poster::PosterGenerator;
use celebration_bot::roster;
use celebration_bot::roster::Roster;
use chrono::Local;
use chrono::NaiveDate;
use clap::Parser;
use dotenv::dotenv;
use log::debug;
use log::info;

#[derive(Parser, Debug)]
#[command(version, about = "Sends celebration posters for today's roster events")]
struct Cli {
    /// Path to the JSON config file [default: $CELEBRATION_BOT_CONFIG or config.json]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Render posters but do not send anything
    #[arg(long)]
    dry_run: bool,

    /// Write every rendered poster into this directory
    #[arg(long)]
    save_posters: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let init_start = Instant::now();
    let config = load_config(&cli)?;
    let _log_guard = setup_logging(&config)?;
    info!("Starting celebration-bot...");

    let notifier = setup_notifier(&config, &cli)?;
    let roster = fetch_roster(&config, init_start).await?;

    let today = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let events = find_todays_events(&config, &roster, today);
    if events.is_empty() {
        info!("No events today. Exiting.");
        return Ok(());
    }

    info!("Sending messages...");
    let summary = notifier.notify_all(&events).await;
    debug!("{:?}", summary);

    info!(
        "Finished! Processed {} event(s) successfully in {:.2}s!",
        summary.processed,
        init_start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = resolve_config_path(cli.config.clone());
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from '{}'", path.display()))?;
    Ok(config)
}

fn setup_notifier(config: &Config, cli: &Cli) -> Result<Notifier> {
    debug!("Setting up Notifier...");
    let design = &config.poster_design;

    let font = PosterFont::load(design.font_path.as_deref())?;
    let renderer = PosterGenerator::new(design.clone(), &config.customization.club_name, font)?;
    let sender = TelegramSender::new(&config.telegram)?;
    let composer = MessageComposer::new(&config.event_message_templates)?;

    let options = DeliveryOptions {
        send_personal_messages: config.customization.send_personal_messages,
        send_to_group: config.customization.send_to_group,
        group_chat_id: config.telegram.group_chat_id.clone(),
        dry_run: cli.dry_run,
        save_posters: cli.save_posters.clone(),
    };
    if options.dry_run {
        info!("Dry run: posters are rendered but nothing is sent.");
    }

    Ok(Notifier::new(
        Arc::new(renderer),
        Arc::new(sender),
        composer,
        options,
    ))
}

async fn fetch_roster(config: &Config, init_start: Instant) -> Result<Roster> {
    let source = roster::from_config(&config.source()?)?;
    info!("Connecting to {}...", source.describe());

    let roster = source
        .fetch()
        .await
        .with_context(|| format!("Failed to read {}", source.describe()))?;
    info!(
        "Connected to {} - Found {} rows ({:.2}s)",
        source.describe(),
        roster.len(),
        init_start.elapsed().as_secs_f64()
    );
    Ok(roster)
}

fn find_todays_events(config: &Config, roster: &Roster, today: NaiveDate) -> Vec<EventMatch> {
    let reserved = &config.reserved_columns.columns;
    let [slash_key, _] = date_keys(today);
    info!("Today's date: {} ({})", today.format("%B %d, %Y"), slash_key);
    info!(
        "Event columns detected: {}",
        event_columns(roster, reserved).join(", ")
    );

    let events = find_events(roster, reserved, today);
    info!("Found {} event(s) today!", events.len());
    for event in &events {
        info!("  - {} - {}", event.name, event.event_name);
    }
    events
}
