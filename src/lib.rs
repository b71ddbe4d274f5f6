/*!
 # Faceplate Eye Controller Library

 A Rust library for driving the eyes of a robot faceplate from a voice
 assistant host. It resolves spoken or typed colors, parses brightness
 requests and follows the sun with an automatic brightness schedule.

 ## Features

 * Color resolution from names, hex codes and `(r,g,b)` tuples
 * Fuzzy matching of spoken color names
 * Brightness words, levels and percentages
 * Sunrise, noon and sunset auto brightness
 * Idle dimming and busy indicator animations
 * Multi-turn custom color entry

 ## Example

 ```rust,no_run
 use std::sync::Arc;
 use faceplate_controller::*;

 #[tokio::main]
 async fn main() -> Result<()> {
     // Initialize tracing for logs
     tracing_subscriber::fmt::init();

     let config = SkillConfig::default();
     let enclosure = Arc::new(TracingEnclosure::new());
     let skill = FaceplateSkill::new(
         config,
         enclosure,
         Arc::new(LogSpeaker),
         Arc::new(StaticHost::default()),
     )?;

     skill.initialize()?;
     skill.handle_eye_color(Some("dark blue"))?;
     skill.handle_brightness(Some("half"))?;
     skill.shutdown();
     Ok(())
 }
 ```
*/

use thiserror::Error;

/// Custom error types for the faceplate controller library
#[derive(Error, Debug)]
pub enum Error {
    /// Color descriptor did not resolve to a name, tuple or hex code
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Malformed hex color string
    #[error("Invalid hex color: {0}")]
    InvalidHex(String),

    /// Brightness input could not be parsed or was out of range
    #[error("Invalid brightness: {0}")]
    InvalidBrightness(String),

    /// Location or timezone prevents solar computation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Value out of range
    #[error("Value {0} out of range ({1}..{2})")]
    ValueOutOfRange(i64, i64, i64),

    /// Settings or locale file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML
    #[error(transparent)]
    SettingsParse(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error(transparent)]
    SettingsWrite(#[from] toml::ser::Error),

    /// General error
    #[error("Error: {0}")]
    General(String),
}

impl Error {
    /// Create a new I/O error for the given path
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

// Import needed for Result type extension
pub type Result<T> = std::result::Result<T, Error>;

// Re-export modules
pub mod brightness;
pub mod color;
pub mod device;
pub mod effects;
pub mod interaction;
pub mod schedule;
pub mod settings;
pub mod skill;
pub mod solar;
pub mod timer;

// Re-export key types
pub use brightness::{
    level_to_percent, parse_brightness, percent_to_level, BrightnessLevel, BrightnessRequest,
    BrightnessTable,
};
pub use color::{fuzzy_match, hex_to_rgb, parse_to_rgb, ColorTable, ColorValue, Rgb};
pub use device::{
    Enclosure, EnclosureCommand, EnclosureState, EyeSide, Gaze, Host, LogSpeaker, Speaker,
    StaticHost, TracingEnclosure,
};
pub use effects::{Dialog, EYE_PIXELS};
pub use interaction::{handle_utterance, Effect, PendingInteraction};
pub use schedule::{
    compute_daypoints, nearest_daypoint, next_occurrence, AutoBrightness, BrightnessScheduler,
    Daypoint, DaypointEntry, DaypointSchedule,
};
pub use settings::{Settings, SettingsStore, SkillConfig};
pub use skill::{EyeColor, FaceplateSkill, Message};
pub use solar::{Location, SolarDay};
pub use timer::{Clock, ManualClock, NamedTimers, SystemClock};
