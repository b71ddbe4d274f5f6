#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use faceplate_controller::*;
use parking_lot::Mutex;

/// Enclosure that remembers every command
#[derive(Debug, Default)]
pub struct RecordingEnclosure {
    commands: Mutex<Vec<EnclosureCommand>>,
}

impl RecordingEnclosure {
    pub fn commands(&self) -> Vec<EnclosureCommand> {
        self.commands.lock().clone()
    }

    pub fn clear(&self) {
        self.commands.lock().clear();
    }

    pub fn pixels(&self) -> Vec<(u8, Rgb)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                EnclosureCommand::EyesPixel(index, rgb) => Some((index, rgb)),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, command: EnclosureCommand) -> bool {
        self.commands.lock().contains(&command)
    }
}

impl Enclosure for RecordingEnclosure {
    fn send(&self, command: EnclosureCommand) -> Result<()> {
        self.commands.lock().push(command);
        Ok(())
    }
}

/// Speaker that remembers every dialog
#[derive(Debug, Default)]
pub struct RecordingSpeaker {
    dialogs: Mutex<Vec<Dialog>>,
}

impl RecordingSpeaker {
    pub fn dialogs(&self) -> Vec<Dialog> {
        self.dialogs.lock().clone()
    }

    pub fn last(&self) -> Option<Dialog> {
        self.dialogs.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.dialogs.lock().clear();
    }
}

impl Speaker for RecordingSpeaker {
    fn speak_dialog(&self, dialog: &Dialog) {
        self.dialogs.lock().push(dialog.clone());
    }
}

/// 08:00 on the summer solstice in Lawrence, Kansas
pub fn summer_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 21, 13, 0, 0).unwrap()
}

pub struct Harness {
    pub enclosure: Arc<RecordingEnclosure>,
    pub speaker: Arc<RecordingSpeaker>,
    pub host: Arc<StaticHost>,
    pub clock: Arc<ManualClock>,
    pub skill: FaceplateSkill,
}

impl Harness {
    pub fn new(config: SkillConfig) -> Self {
        let enclosure = Arc::new(RecordingEnclosure::default());
        let speaker = Arc::new(RecordingSpeaker::default());
        let host = Arc::new(StaticHost::default());
        let clock = Arc::new(ManualClock::new(summer_morning()));
        let skill = FaceplateSkill::with_clock(
            config,
            enclosure.clone(),
            speaker.clone(),
            host.clone(),
            clock.clone(),
        )
        .unwrap();
        Self {
            enclosure,
            speaker,
            host,
            clock,
            skill,
        }
    }

    /// Skill with the idle check switched off
    pub fn quiet() -> Self {
        let mut config = SkillConfig::default();
        config.settings.auto_dim_eyes = false;
        Self::new(config)
    }
}
