//! Hardware and host facades.
//!
//! The skill never talks to the faceplate or the assistant directly. It
//! goes through [`Enclosure`] for the eyes and mouth, [`Speaker`] for
//! dialogs and [`Host`] for host configuration and idle state.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, instrument, trace, warn};

use crate::brightness::BrightnessLevel;
use crate::color::{Rgb, DEFAULT_EYE_COLOR};
use crate::effects::{Dialog, EYE_PIXELS};
use crate::settings::Settings;
use crate::{Error, Result};

/// Which eye a blink applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeSide {
    Left,
    Right,
    Both,
}

impl EyeSide {
    /// Single letter code used by the faceplate firmware
    pub fn code(&self) -> char {
        match self {
            EyeSide::Left => 'l',
            EyeSide::Right => 'r',
            EyeSide::Both => 'b',
        }
    }
}

/// Where the eyes look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gaze {
    Up,
    Down,
    Left,
    Right,
    Center,
}

impl Gaze {
    pub fn code(&self) -> char {
        match self {
            Gaze::Up => 'u',
            Gaze::Down => 'd',
            Gaze::Left => 'l',
            Gaze::Right => 'r',
            Gaze::Center => 'c',
        }
    }
}

/// A single command sent to the faceplate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnclosureCommand {
    EyesColor(Rgb),
    EyesPixel(u8, Rgb),
    EyesBrightness(BrightnessLevel),
    EyesBlink(EyeSide),
    EyesLook(Gaze),
    EyesReset,
    MouthReset,
    MouthThink,
    Reset,
}

/// Faceplate hardware facade
///
/// Implementations forward to the real display. Every method is a single
/// fire-and-forget command.
pub trait Enclosure: Send + Sync {
    fn send(&self, command: EnclosureCommand) -> Result<()>;

    fn eyes_color(&self, rgb: Rgb) -> Result<()> {
        self.send(EnclosureCommand::EyesColor(rgb))
    }

    fn eyes_setpixel(&self, index: u8, rgb: Rgb) -> Result<()> {
        if index >= EYE_PIXELS.count {
            return Err(Error::ValueOutOfRange(
                index as i64,
                0,
                EYE_PIXELS.count as i64 - 1,
            ));
        }
        self.send(EnclosureCommand::EyesPixel(index, rgb))
    }

    fn eyes_brightness(&self, level: BrightnessLevel) -> Result<()> {
        self.send(EnclosureCommand::EyesBrightness(level))
    }

    fn eyes_blink(&self, side: EyeSide) -> Result<()> {
        self.send(EnclosureCommand::EyesBlink(side))
    }

    fn eyes_look(&self, gaze: Gaze) -> Result<()> {
        self.send(EnclosureCommand::EyesLook(gaze))
    }

    fn eyes_reset(&self) -> Result<()> {
        self.send(EnclosureCommand::EyesReset)
    }

    fn mouth_reset(&self) -> Result<()> {
        self.send(EnclosureCommand::MouthReset)
    }

    fn mouth_think(&self) -> Result<()> {
        self.send(EnclosureCommand::MouthThink)
    }

    fn reset(&self) -> Result<()> {
        self.send(EnclosureCommand::Reset)
    }
}

/// Last known faceplate state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosureState {
    /// Current RGB color of the eyes
    pub rgb_color: Rgb,
    /// Per pixel colors (24 pixels)
    pub pixels: Vec<Rgb>,
    /// Current brightness (0-30)
    pub brightness: BrightnessLevel,
    /// Whether the mouth shows the thinking animation
    pub thinking: bool,
}

impl Default for EnclosureState {
    fn default() -> Self {
        Self {
            rgb_color: DEFAULT_EYE_COLOR,
            pixels: vec![DEFAULT_EYE_COLOR; EYE_PIXELS.count as usize],
            brightness: BrightnessLevel::default(),
            thinking: false,
        }
    }
}

/// Enclosure that logs commands through tracing and tracks the resulting state
#[derive(Debug, Default)]
pub struct TracingEnclosure {
    state: Mutex<EnclosureState>,
}

impl TracingEnclosure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> EnclosureState {
        self.state.lock().clone()
    }
}

impl Enclosure for TracingEnclosure {
    #[instrument(skip(self))]
    fn send(&self, command: EnclosureCommand) -> Result<()> {
        let mut state = self.state.lock();
        match command {
            EnclosureCommand::EyesColor(rgb) => {
                state.rgb_color = rgb;
                state.pixels.iter_mut().for_each(|p| *p = rgb);
                info!("Eye color set to RGB{}", rgb);
            }
            EnclosureCommand::EyesPixel(index, rgb) => {
                match state.pixels.get_mut(index as usize) {
                    Some(pixel) => *pixel = rgb,
                    None => {
                        warn!("Pixel {} out of range", index);
                        return Err(Error::ValueOutOfRange(
                            index as i64,
                            0,
                            EYE_PIXELS.count as i64 - 1,
                        ));
                    }
                }
                trace!("Pixel {} set to RGB{}", index, rgb);
            }
            EnclosureCommand::EyesBrightness(level) => {
                state.brightness = level;
                info!("Eye brightness set to {} ({}%)", level, level.percent());
            }
            EnclosureCommand::EyesBlink(side) => debug!("Blinking eyes ({})", side.code()),
            EnclosureCommand::EyesLook(gaze) => debug!("Eyes look ({})", gaze.code()),
            EnclosureCommand::EyesReset => {
                let rgb = state.rgb_color;
                state.pixels.iter_mut().for_each(|p| *p = rgb);
                debug!("Eyes reset");
            }
            EnclosureCommand::MouthReset => {
                state.thinking = false;
                debug!("Mouth reset");
            }
            EnclosureCommand::MouthThink => {
                state.thinking = true;
                debug!("Mouth thinking");
            }
            EnclosureCommand::Reset => {
                state.thinking = false;
                debug!("Enclosure reset");
            }
        }
        Ok(())
    }
}

/// Speech output
pub trait Speaker: Send + Sync {
    fn speak_dialog(&self, dialog: &Dialog);
}

/// Speaker that writes dialogs to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak_dialog(&self, dialog: &Dialog) {
        info!("Speak [{}]: {}", dialog.key(), dialog.text());
    }
}

/// Host services the skill depends on
pub trait Host: Send + Sync {
    /// True when no other skill owns the display
    fn display_idle(&self) -> bool;

    /// Whether the host plays a beep when it starts listening
    fn confirm_listening(&self) -> bool;

    /// Updates the user configuration and notifies the host
    fn set_confirm_listening(&self, enabled: bool) -> Result<()>;

    /// Pulls the latest settings from the remote settings service
    fn fetch_remote_settings(&self) -> Result<Option<Settings>>;
}

/// In-process host with fixed answers
#[derive(Debug)]
pub struct StaticHost {
    idle: AtomicBool,
    confirm_listening: AtomicBool,
    remote: Mutex<Option<Settings>>,
}

impl Default for StaticHost {
    fn default() -> Self {
        Self {
            idle: AtomicBool::new(true),
            confirm_listening: AtomicBool::new(true),
            remote: Mutex::new(None),
        }
    }
}

impl StaticHost {
    pub fn set_display_idle(&self, idle: bool) {
        self.idle.store(idle, Ordering::Relaxed);
    }

    /// Settings returned by the next remote pull
    pub fn set_remote_settings(&self, settings: Option<Settings>) {
        *self.remote.lock() = settings;
    }
}

impl Host for StaticHost {
    fn display_idle(&self) -> bool {
        self.idle.load(Ordering::Relaxed)
    }

    fn confirm_listening(&self) -> bool {
        self.confirm_listening.load(Ordering::Relaxed)
    }

    fn set_confirm_listening(&self, enabled: bool) -> Result<()> {
        self.confirm_listening.store(enabled, Ordering::Relaxed);
        info!("Listening confirmation beep {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    fn fetch_remote_settings(&self) -> Result<Option<Settings>> {
        Ok(self.remote.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_enclosure_tracks_state() {
        let enclosure = TracingEnclosure::new();
        enclosure.eyes_color(Rgb::new(255, 0, 0)).unwrap();
        enclosure.eyes_setpixel(3, Rgb::new(0, 0, 0)).unwrap();
        enclosure
            .eyes_brightness(BrightnessLevel::new(20).unwrap())
            .unwrap();
        enclosure.mouth_think().unwrap();

        let state = enclosure.state();
        assert_eq!(state.rgb_color, Rgb::new(255, 0, 0));
        assert_eq!(state.pixels[3], Rgb::new(0, 0, 0));
        assert_eq!(state.pixels[4], Rgb::new(255, 0, 0));
        assert_eq!(state.brightness.value(), 20);
        assert!(state.thinking);

        enclosure.reset().unwrap();
        assert!(!enclosure.state().thinking);
    }

    #[test]
    fn test_pixel_out_of_range() {
        let enclosure = TracingEnclosure::new();
        assert!(matches!(
            enclosure.eyes_setpixel(24, Rgb::default()),
            Err(Error::ValueOutOfRange(24, 0, 23))
        ));
    }

    #[test]
    fn test_static_host() {
        let host = StaticHost::default();
        assert!(host.display_idle());
        host.set_display_idle(false);
        assert!(!host.display_idle());
        host.set_confirm_listening(false).unwrap();
        assert!(!host.confirm_listening());
        assert!(host.fetch_remote_settings().unwrap().is_none());
    }
}
