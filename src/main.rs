use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result};
use faceplate_controller::*;
use tokio::time::Duration;
use tracing::{debug, info, instrument, trace};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum, Debug)]
enum Output {
    /// (r, g, b)
    Tuple,
    /// #rrggbb
    Hex,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a simulated faceplate through colors, brightness and the busy indicator
    Demo {
        /// Pause between demo steps in seconds
        #[arg(short, long, default_value_t = 2)]
        duration: u64,
    },
    /// Resolve a color name, hex code or (r,g,b) tuple
    ParseColor {
        descriptor: String,
        #[arg(short, long, value_enum, default_value_t = Output::Tuple)]
        output: Output,
    },
    /// Find the closest known color name
    MatchColor { input: String },
    /// List the color vocabulary
    Colors,
    /// Parse a brightness word, level or percentage
    Brightness { text: String },
    /// Print today's sunrise, noon and sunset with their brightness levels
    Daypoints {
        /// IANA timezone, overrides the configuration
        #[arg(short, long)]
        timezone: Option<String>,
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<f64>,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<f64>,
    },
}

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("faceplate_controller=info")),
        )
        .compact()
        .init();

    color_eyre::install()?;

    let cli = Cli::parse();
    debug!("Parsed command line arguments");

    let config = match &cli.config {
        Some(path) => SkillConfig::load(path)?,
        None => SkillConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Demo { duration: 2 }) {
        Commands::Demo { duration } => {
            run_demo(config, duration).await?;
        }
        Commands::ParseColor { descriptor, output } => {
            let rgb = parse_to_rgb(&descriptor, &config.color_table()?)?;
            match output {
                Output::Tuple => println!("{rgb}"),
                Output::Hex => println!("{}", rgb.to_hex()),
            }
        }
        Commands::MatchColor { input } => {
            let colors = config.color_table()?;
            match fuzzy_match(&input, &colors) {
                Some(name) => println!("{name}"),
                None => return Err(eyre!("no color close to {input:?}")),
            }
        }
        Commands::Colors => {
            for (name, value) in config.color_table()?.iter() {
                match value.to_rgb() {
                    Ok(rgb) => println!("{name:<20} {}", rgb.to_hex()),
                    Err(e) => println!("{name:<20} invalid: {e}"),
                }
            }
        }
        Commands::Brightness { text } => {
            match parse_brightness(&text, &config.brightness_table()?)? {
                BrightnessRequest::Auto => println!("auto"),
                BrightnessRequest::Percent(percent) => {
                    let level = percent_to_level(percent)?;
                    println!("{percent}% (level {level})");
                }
            }
        }
        Commands::Daypoints {
            timezone,
            latitude,
            longitude,
        } => {
            let mut location = config.location.clone();
            if let Some(timezone) = timezone {
                location.timezone = timezone;
            }
            if let Some(latitude) = latitude {
                location.latitude = latitude;
            }
            if let Some(longitude) = longitude {
                location.longitude = longitude;
            }
            print_daypoints(&location)?;
        }
    }

    Ok(())
}

#[instrument]
fn print_daypoints(location: &Location) -> Result<()> {
    let now = chrono::Utc::now();
    let schedule = compute_daypoints(location, now)?;
    let nearest = nearest_daypoint(&schedule, now).daypoint;

    for entry in schedule.iter() {
        let marker = if entry.daypoint == nearest { "*" } else { " " };
        println!(
            "{marker} {:<8} {}  level {:>2} ({}%)",
            entry.daypoint.label(),
            entry.local_time(location)?.format("%H:%M:%S %:z"),
            entry.level.value(),
            entry.level.percent()
        );
    }
    Ok(())
}

/// Sleep for specified number of seconds
#[instrument]
async fn sleep(seconds: u64) {
    trace!("Sleeping for {}s", seconds);
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    trace!("Sleep completed");
}

/// Drive the skill against a logging faceplate
#[instrument(skip(config))]
async fn run_demo(config: SkillConfig, duration: u64) -> Result<()> {
    info!("Running faceplate demo with {}s intervals", duration);

    let enclosure = Arc::new(TracingEnclosure::new());
    let skill = FaceplateSkill::new(
        config,
        enclosure.clone(),
        Arc::new(LogSpeaker),
        Arc::new(StaticHost::default()),
    )?;
    skill.initialize()?;
    skill.handle_event(&Message::new("mycroft.ready"))?;
    sleep(duration).await;

    info!("Setting color by name");
    skill.handle_eye_color(Some("dark blue"))?;
    sleep(duration).await;

    info!("Setting a misheard color");
    skill.handle_eye_color(Some("rad"))?;
    sleep(duration).await;

    info!("Entering a custom color");
    skill.handle_custom_eye_color()?;
    for component in ["255", "128", "0"] {
        skill.handle_utterance(component)?;
    }
    sleep(duration).await;

    info!("Setting brightness to half");
    skill.handle_brightness(Some("half"))?;
    sleep(duration).await;

    info!("Switching to automatic brightness");
    if let Err(e) = skill.handle_auto_brightness() {
        info!("Auto brightness unavailable here: {}", e);
    }
    sleep(duration).await;

    info!("Simulating a busy skill");
    let handler = "WeatherSkill.handle_current";
    skill.handle_event(&Message::new("mycroft.skill.handler.start").with("name", handler))?;
    sleep(1).await;
    skill.handle_event(&Message::new("mycroft.skill.handler.complete").with("name", handler))?;

    let state = enclosure.state();
    info!(
        "Final state: color {} brightness {} thinking {}",
        state.rgb_color, state.brightness, state.thinking
    );

    skill.shutdown();
    info!("Demo completed!");
    Ok(())
}
