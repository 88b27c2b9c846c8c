//! Storyline runner
//!
//! Plays scripted days from a directory of `day-NN.json` files and prints
//! the dialogue, an optional frame per step, and a group summary per day.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use story_core::{
    parse_day_range, DayScheduler, DialogueDriver, DirectorySource, DriveOutcome, FirstChoice,
    OfflineGenerator, StepLogger, StoryConfig, DEFAULT_TUNING_PATH,
};

/// Command line arguments for the runner
#[derive(Parser, Debug)]
#[command(name = "storyline")]
#[command(about = "Plays a multi-day story script and reports the cast's moods and ties")]
struct Args {
    /// Directory holding day-NN.json scripts
    #[arg(long, default_value = "play_events")]
    scripts: PathBuf,

    /// Day or day range to play, e.g. 01 or 01-03
    #[arg(long, default_value = "01")]
    days: String,

    /// Tuning file
    #[arg(long, default_value = DEFAULT_TUNING_PATH)]
    config: PathBuf,

    /// Overrides the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the step log as JSONL
    #[arg(long)]
    log: Option<PathBuf>,

    /// Print a JSON frame after every step
    #[arg(long)]
    frames: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let days = parse_day_range(&args.days)?;

    let mut config = StoryConfig::load_or_default(&args.config);
    if let Some(seed) = args.seed {
        config.schedule.seed = seed;
    }

    let source = DirectorySource::new(&args.scripts);
    let mut scheduler = DayScheduler::from_config(&config, Box::new(source))?;
    let driver = DialogueDriver::new(OfflineGenerator, FirstChoice)
        .with_context_lines(config.schedule.context_lines);
    let mut logger = match &args.log {
        Some(path) => StepLogger::new(path)?,
        None => StepLogger::null(),
    };

    for day in days {
        scheduler.goto_day(day)?;
        println!("=== Day {:02} ===", day);

        while !scheduler.is_day_complete() {
            if driver.step(&mut scheduler)? == DriveOutcome::Deferred {
                tracing::warn!("Day {} stopped at step {}: dialogue deferred", day, scheduler.current_step());
                break;
            }
            if let Some(entry) = scheduler.log().last() {
                print_line(&entry.event);
            }
            if args.frames {
                println!("{}", serde_json::to_string(&scheduler.frame()?)?);
            }
        }

        logger.log_batch(scheduler.log())?;

        let report = scheduler.dynamics()?.report();
        println!();
        println!("Tension: {:.3} ({})", report.tension, report.tension_label);
        if let Some(mood) = &report.dominant_mood {
            println!("Dominant mood: {}", mood);
        }
        for (a, b) in &report.friendships {
            println!("  friends: {} & {}", a, b);
        }
        for (a, b) in &report.rivalries {
            println!("  rivals:  {} & {}", a, b);
        }
        if !report.isolated.is_empty() {
            println!("  isolated: {}", report.isolated.join(", "));
        }
        println!();
    }

    logger.flush()?;
    tracing::info!("Wrote {} log entries", logger.entry_count());
    Ok(())
}

fn print_line(event: &story_events::EventView) {
    let Some(speaker) = &event.speaker else {
        if !event.text.is_empty() {
            println!("-- {} --", event.text);
        }
        return;
    };
    if event.kind != story_events::RecordKind::Dialogue {
        println!("* {} ({})", speaker, event.kind.label());
        return;
    }
    let to = if event.addressees.is_empty() {
        String::new()
    } else {
        format!(" to {}", event.addressees.join(", "))
    };
    let mood = event
        .mood
        .as_deref()
        .map(|m| format!(" [{}]", m))
        .unwrap_or_default();
    println!("{}{}{}: {}", speaker, to, mood, event.text);
}
