/*!
 # Faceplate skill

 [`FaceplateSkill`] reacts to intents, bus events and utterances from the
 assistant host. It keeps the eye color and brightness in sync with the
 user's settings, droops the eyes when nobody is around and shows a
 "thinking" mouth while other skills are busy.

 Events are routed through an explicit table from event name to handler.
 Long running work (idle checks, busy checks, daypoints) runs on
 [`NamedTimers`], so every callback can be cancelled by name.
*/

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::brightness::{parse_brightness, percent_to_level, BrightnessRequest, BrightnessTable};
use crate::color::{fuzzy_match, parse_to_rgb, ColorTable, Rgb, DEFAULT_EYE_COLOR};
use crate::device::{Enclosure, EyeSide, Gaze, Host, Speaker};
use crate::effects::{
    Dialog, EYE_PIXELS, IDLE_CHECK_DELAY, IDLE_CHECK_FREQUENCY, IDLE_DROOP_COUNT,
    LOOK_DOWN_SETTLE, PIXEL_COMMAND_DELAY, THINK_DELAY,
};
use crate::interaction::{self, Effect, PendingInteraction};
use crate::schedule::{AutoBrightness, BrightnessScheduler};
use crate::settings::{Settings, SettingsStore, SkillConfig};
use crate::timer::{Clock, NamedTimers, SystemClock};
use crate::{Error, Result};

/// Timer driving the idle animation
pub const IDLE_CHECK: &str = "IdleCheck";

/// Handlers whose activity never shows the busy indicator
const QUIET_HANDLERS: [&str; 2] = ["Mark1", "TimeSkill.update_display"];

/// Intent names
pub mod intents {
    pub const EYE_COLOR: &str = "eye.color";
    pub const CUSTOM_EYE_COLOR: &str = "custom.eye.color";
    pub const BRIGHTNESS: &str = "brightness";
    pub const BRIGHTNESS_AUTO: &str = "brightness.auto";
    pub const WEB_SETTINGS_SYNC: &str = "web.settings.sync";
}

/// Bus event names
pub mod events {
    pub const INTERNET_CONNECTED: &str = "mycroft.internet.connected";
    pub const EYES_DEFAULT: &str = "mycroft.eyes.default";
    pub const RECORD_BEGIN: &str = "recognizer_loop:record_begin";
    pub const HANDLER_START: &str = "mycroft.skill.handler.start";
    pub const HANDLER_COMPLETE: &str = "mycroft.skill.handler.complete";
    pub const AUDIO_OUTPUT_START: &str = "recognizer_loop:audio_output_start";
    pub const MOUTH_THINK: &str = "enclosure.mouth.think";
    pub const MOUTH_DEACTIVATE: &str = "enclosure.mouth.events.deactivate";
    pub const MOUTH_TEXT: &str = "enclosure.mouth.text";
    pub const READY: &str = "mycroft.ready";
}

/// A bus message: event name plus string data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

impl Message {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: BTreeMap::new(),
        }
    }

    /// Adds a data field
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// Colors the eyes can be set to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeColor<'a> {
    /// Name, hex code or `(r, g, b)` text
    Named(&'a str),
    Rgb(Rgb),
}

type EventHandler = fn(&FaceplateSkill, &Message) -> Result<()>;

#[derive(Debug)]
struct SkillState {
    current_rgb: Rgb,
    idle_count: u32,
    /// Bumped on every user facing interaction
    interaction_id: u64,
    /// Handlers currently shown as busy
    thinking: HashSet<String>,
    pending: PendingInteraction,
}

struct SkillInner {
    colors: ColorTable,
    brightness: BrightnessTable,
    enclosure: Arc<dyn Enclosure>,
    speaker: Arc<dyn Speaker>,
    host: Arc<dyn Host>,
    timers: NamedTimers,
    scheduler: BrightnessScheduler,
    settings: SettingsStore,
    state: Mutex<SkillState>,
    handlers: Mutex<HashMap<&'static str, EventHandler>>,
}

/// The eye color and brightness skill
#[derive(Clone)]
pub struct FaceplateSkill {
    inner: Arc<SkillInner>,
}

impl fmt::Debug for FaceplateSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceplateSkill")
            .field("state", &*self.inner.state.lock())
            .field("settings", &self.inner.settings)
            .field("scheduler", &self.inner.scheduler)
            .finish()
    }
}

fn event_table() -> HashMap<&'static str, EventHandler> {
    let entries: [(&'static str, EventHandler); 10] = [
        (events::INTERNET_CONNECTED, FaceplateSkill::on_internet_connected),
        (events::EYES_DEFAULT, FaceplateSkill::on_eyes_default),
        (events::RECORD_BEGIN, FaceplateSkill::on_record_begin),
        (events::HANDLER_START, FaceplateSkill::on_handler_started),
        (events::HANDLER_COMPLETE, FaceplateSkill::on_handler_complete),
        (events::AUDIO_OUTPUT_START, FaceplateSkill::on_user_interaction),
        (events::MOUTH_THINK, FaceplateSkill::on_user_interaction),
        (events::MOUTH_DEACTIVATE, FaceplateSkill::on_user_interaction),
        (events::MOUTH_TEXT, FaceplateSkill::on_user_interaction),
        (events::READY, FaceplateSkill::on_ready),
    ];
    entries.into_iter().collect()
}

impl FaceplateSkill {
    /// Creates the skill on the system clock
    pub fn new(
        config: SkillConfig,
        enclosure: Arc<dyn Enclosure>,
        speaker: Arc<dyn Speaker>,
        host: Arc<dyn Host>,
    ) -> Result<Self> {
        Self::with_clock(config, enclosure, speaker, host, Arc::new(SystemClock))
    }

    /// Creates the skill with an explicit clock
    pub fn with_clock(
        config: SkillConfig,
        enclosure: Arc<dyn Enclosure>,
        speaker: Arc<dyn Speaker>,
        host: Arc<dyn Host>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let colors = config.color_table()?;
        let brightness = config.brightness_table()?;
        let settings = config.settings_store()?;
        settings.set_on_change(|settings| debug!("Settings changed: {:?}", settings));

        let timers = NamedTimers::new(clock);
        let scheduler =
            BrightnessScheduler::new(config.location.clone(), timers.clone(), enclosure.clone());

        info!(
            "Faceplate skill created ({} colors, {} brightness words)",
            colors.len(),
            brightness.len()
        );
        Ok(Self {
            inner: Arc::new(SkillInner {
                colors,
                brightness,
                enclosure,
                speaker,
                host,
                timers,
                scheduler,
                settings,
                state: Mutex::new(SkillState {
                    current_rgb: DEFAULT_EYE_COLOR,
                    idle_count: 0,
                    interaction_id: 0,
                    thinking: HashSet::new(),
                    pending: PendingInteraction::None,
                }),
                handlers: Mutex::new(event_table()),
            }),
        })
    }

    /// Registers a callback run whenever the settings change
    ///
    /// The callback runs without any skill lock held and may call back into
    /// the skill.
    pub fn on_settings_change(&self, callback: impl Fn(&Settings) + Send + Sync + 'static) {
        self.inner.settings.set_on_change(callback);
    }

    /// Applies the stored color, auto brightness and idle dimming
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<()> {
        // The web color seen at startup counts as already applied
        self.update_settings(|s| s.web_eye_color = s.eye_color.clone());
        let settings = self.settings();

        let rgb = match parse_to_rgb(&settings.current_eye_color, &self.inner.colors) {
            Ok(rgb) => rgb,
            Err(e) => {
                warn!(
                    "Stored eye color {:?} is invalid ({}), using default",
                    settings.current_eye_color, e
                );
                DEFAULT_EYE_COLOR
            }
        };
        self.show_color(rgb)?;

        if settings.auto_brightness {
            if let Err(e) = self.inner.scheduler.enable() {
                warn!("Auto brightness unavailable: {}", e);
            }
        }
        if settings.auto_dim_eyes {
            self.start_idle_check()?;
        }

        info!("Faceplate skill initialized with color {}", rgb);
        Ok(())
    }

    /// Cancels every timer and stops handling events
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        self.inner.scheduler.disable();
        self.inner.timers.cancel_all();
        self.inner.handlers.lock().clear();
        info!("Faceplate skill shut down");
    }

    // Accessors

    pub fn settings(&self) -> Settings {
        self.inner.settings.get()
    }

    pub fn current_color(&self) -> Rgb {
        self.inner.state.lock().current_rgb
    }

    pub fn pending(&self) -> PendingInteraction {
        self.inner.state.lock().pending.clone()
    }

    pub fn idle_count(&self) -> u32 {
        self.inner.state.lock().idle_count
    }

    pub fn auto_brightness(&self) -> AutoBrightness {
        self.inner.scheduler.mode()
    }

    pub fn timers(&self) -> &NamedTimers {
        &self.inner.timers
    }

    pub fn colors(&self) -> &ColorTable {
        &self.inner.colors
    }

    fn speak(&self, dialog: Dialog) {
        self.inner.speaker.speak_dialog(&dialog);
    }

    fn update_settings(&self, change: impl FnOnce(&mut Settings)) {
        if let Err(e) = self.inner.settings.update(change) {
            error!("Failed to save settings: {}", e);
        }
    }

    // Color

    fn show_color(&self, rgb: Rgb) -> Result<()> {
        self.inner.enclosure.eyes_color(rgb)?;
        let mut state = self.inner.state.lock();
        state.current_rgb = rgb;
        state.idle_count = 0;
        Ok(())
    }

    /// Sets the eye color and remembers it
    ///
    /// An unresolvable color speaks "error.set.color" and is returned as an
    /// error. On success "set.color.success" is spoken when `speak` is set.
    #[instrument(skip(self))]
    pub fn set_eye_color(&self, color: EyeColor<'_>, speak: bool) -> Result<Rgb> {
        let (rgb, descriptor) = match color {
            EyeColor::Named(name) => match parse_to_rgb(name, &self.inner.colors) {
                Ok(rgb) => (rgb, name.trim().to_lowercase()),
                Err(e) => {
                    self.speak(Dialog::ErrorSetColor);
                    return Err(e);
                }
            },
            EyeColor::Rgb(rgb) => (rgb, rgb.to_string()),
        };

        if let Err(e) = self.show_color(rgb) {
            self.speak(Dialog::ErrorSetColor);
            return Err(e);
        }
        if speak {
            self.speak(Dialog::SetColorSuccess);
        }
        self.update_settings(|s| s.current_eye_color = descriptor);
        Ok(rgb)
    }

    // Intents

    /// Routes an intent by name. `slot` is the captured utterance part, if any.
    #[instrument(skip(self))]
    pub fn handle_intent(&self, intent: &str, slot: Option<&str>) -> Result<()> {
        self.count_interaction();
        match intent {
            intents::EYE_COLOR => self.handle_eye_color(slot),
            intents::CUSTOM_EYE_COLOR => self.handle_custom_eye_color(),
            intents::BRIGHTNESS => self.handle_brightness(slot),
            intents::BRIGHTNESS_AUTO => self.handle_auto_brightness(),
            intents::WEB_SETTINGS_SYNC => self.handle_web_settings_sync(),
            other => Err(Error::General(format!("unknown intent {other:?}"))),
        }
    }

    /// "Set your eyes to <color>"
    #[instrument(skip(self))]
    pub fn handle_eye_color(&self, color: Option<&str>) -> Result<()> {
        let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) else {
            self.inner.state.lock().pending = PendingInteraction::AwaitingColor;
            self.speak(Dialog::ColorNeed);
            return Ok(());
        };

        if parse_to_rgb(color, &self.inner.colors).is_ok() {
            return self.set_eye_color(EyeColor::Named(color), true).map(|_| ());
        }
        match fuzzy_match(color, &self.inner.colors) {
            Some(name) => self.set_eye_color(EyeColor::Named(name), true).map(|_| ()),
            None => {
                info!("No color like {:?}", color);
                self.speak(Dialog::ColorNotExist);
                Ok(())
            }
        }
    }

    /// Starts the red, green, blue conversation
    #[instrument(skip(self))]
    pub fn handle_custom_eye_color(&self) -> Result<()> {
        self.inner.state.lock().pending = PendingInteraction::custom_color();
        self.speak(Dialog::SetCustomColor);
        self.speak(Dialog::GetRValue);
        Ok(())
    }

    /// "Set brightness to <level>"
    #[instrument(skip(self))]
    pub fn handle_brightness(&self, text: Option<&str>) -> Result<()> {
        let request = text
            .filter(|t| !t.trim().is_empty())
            .map(|t| parse_brightness(t, &self.inner.brightness));

        match request {
            Some(Ok(request)) => self.apply_brightness(request),
            Some(Err(e)) => {
                debug!("Giving up on brightness: {}", e);
                self.inner.state.lock().pending = PendingInteraction::None;
                self.speak(Dialog::BrightnessNotFoundFinal);
                Ok(())
            }
            None => {
                self.inner.state.lock().pending = PendingInteraction::AwaitingBrightness;
                self.speak(Dialog::BrightnessNotFound);
                Ok(())
            }
        }
    }

    /// "Set brightness to auto"
    ///
    /// Applies the nearest daypoint's level without announcing it.
    #[instrument(skip(self))]
    pub fn handle_auto_brightness(&self) -> Result<()> {
        match self.inner.scheduler.enable() {
            Ok(entry) => {
                debug!("Auto brightness starts at {}", entry.daypoint);
                self.update_settings(|s| s.auto_brightness = true);
                Ok(())
            }
            Err(e) => {
                warn!("Could not enable auto brightness: {}", e);
                self.speak(Dialog::AutoBrightnessFailed);
                Err(e)
            }
        }
    }

    fn apply_brightness(&self, request: BrightnessRequest) -> Result<()> {
        match request {
            BrightnessRequest::Auto => self.handle_auto_brightness(),
            BrightnessRequest::Percent(percent) => {
                let level = percent_to_level(percent)?;
                self.inner.scheduler.disable();
                self.update_settings(|s| s.auto_brightness = false);
                self.inner.enclosure.eyes_brightness(level)?;
                self.speak(Dialog::BrightnessSet { percent });
                Ok(())
            }
        }
    }

    /// Feeds an utterance to the pending conversation
    ///
    /// Returns false when nothing was waiting for an answer.
    #[instrument(skip(self))]
    pub fn handle_utterance(&self, text: &str) -> Result<bool> {
        let (effect, consumed) = {
            let mut state = self.inner.state.lock();
            let pending = std::mem::take(&mut state.pending);
            let consumed = pending.is_pending();
            let (next, effect) = interaction::handle_utterance(pending, text, &self.inner.brightness);
            state.pending = next;
            state.interaction_id += 1;
            (effect, consumed)
        };

        trace!("Utterance effect: {:?}", effect);
        match effect {
            Effect::None => {}
            Effect::Prompt(dialog) | Effect::Reject(dialog) => self.speak(dialog),
            Effect::SetColor(name) => self.handle_eye_color(Some(&name))?,
            Effect::SetRgb(rgb) => {
                self.set_eye_color(EyeColor::Rgb(rgb), true)?;
            }
            Effect::SetBrightness(request) => self.apply_brightness(request)?,
        }
        Ok(consumed)
    }

    // Web settings

    /// Pulls remote settings through the host and reconciles them
    #[instrument(skip(self))]
    pub fn handle_web_settings_sync(&self) -> Result<()> {
        match self.inner.host.fetch_remote_settings()? {
            Some(remote) => self.on_websettings_changed(&remote),
            None => {
                debug!("No remote settings");
                Ok(())
            }
        }
    }

    /// Reconciles settings changed on the web page
    #[instrument(skip(self))]
    pub fn on_websettings_changed(&self, remote: &Settings) -> Result<()> {
        let local = self.settings();

        if remote.eye_color != local.web_eye_color {
            match parse_to_rgb(&remote.eye_color, &self.inner.colors) {
                Ok(_) => {
                    self.set_eye_color(EyeColor::Named(&remote.eye_color), false)?;
                    info!("Applied web eye color {:?}", remote.eye_color);
                }
                Err(e) => warn!("Ignoring web eye color {:?}: {}", remote.eye_color, e),
            }
        }

        if remote.auto_dim_eyes {
            if !self.inner.timers.is_pending(IDLE_CHECK) {
                self.start_idle_check()?;
            }
        } else {
            self.stop_idle_check()?;
        }

        if remote.use_listening_beep != self.inner.host.confirm_listening() {
            self.inner
                .host
                .set_confirm_listening(remote.use_listening_beep)?;
        }

        if remote.auto_brightness != local.auto_brightness {
            if remote.auto_brightness {
                if let Err(e) = self.inner.scheduler.enable() {
                    warn!("Web settings asked for auto brightness: {}", e);
                }
            } else {
                self.inner.scheduler.disable();
            }
        }

        let auto_brightness = self.inner.scheduler.mode() == AutoBrightness::On;
        self.update_settings(|s| {
            s.eye_color = remote.eye_color.clone();
            s.web_eye_color = remote.eye_color.clone();
            s.auto_dim_eyes = remote.auto_dim_eyes;
            s.use_listening_beep = remote.use_listening_beep;
            s.auto_brightness = auto_brightness;
        });
        Ok(())
    }

    // Events

    /// Dispatches a bus event. Returns whether a handler ran.
    #[instrument(skip(self), fields(event = %message.name))]
    pub fn handle_event(&self, message: &Message) -> Result<bool> {
        let handler = self.inner.handlers.lock().get(message.name.as_str()).copied();
        match handler {
            Some(handler) => {
                handler(self, message)?;
                Ok(true)
            }
            None => {
                debug!("Ignoring event {}", message.name);
                Ok(false)
            }
        }
    }

    fn count_interaction(&self) {
        self.inner.state.lock().interaction_id += 1;
    }

    fn on_internet_connected(&self, _message: &Message) -> Result<()> {
        info!("Internet connected");
        Ok(())
    }

    fn on_eyes_default(&self, _message: &Message) -> Result<()> {
        let rgb = self.current_color();
        self.inner.enclosure.eyes_color(rgb)
    }

    fn on_ready(&self, _message: &Message) -> Result<()> {
        self.inner.enclosure.mouth_reset()?;
        let rgb = self.current_color();
        self.inner.enclosure.eyes_color(rgb)
    }

    fn on_user_interaction(&self, message: &Message) -> Result<()> {
        trace!("User interaction via {}", message.name);
        self.count_interaction();
        Ok(())
    }

    /// Listening started: wake the eyes up if they looked away
    fn on_record_begin(&self, _message: &Message) -> Result<()> {
        self.count_interaction();
        if !self.settings().auto_dim_eyes {
            self.inner.timers.cancel(IDLE_CHECK);
            return Ok(());
        }

        let (rgb, inattentive) = {
            let state = self.inner.state.lock();
            (state.current_rgb, state.idle_count > IDLE_DROOP_COUNT)
        };
        if inattentive {
            debug!("Waking up from idle");
            self.inner.enclosure.eyes_blink(EyeSide::Both)?;
            self.inner.enclosure.eyes_color(rgb)?;
            self.start_idle_check()?;
        }
        Ok(())
    }

    fn on_handler_started(&self, message: &Message) -> Result<()> {
        let handler = message.get("name").unwrap_or_default().to_string();
        if QUIET_HANDLERS.iter().any(|quiet| handler.contains(quiet)) {
            trace!("No busy indicator for {}", handler);
            return Ok(());
        }

        let seen = self.inner.state.lock().interaction_id;
        let skill = self.clone();
        let deadline = self.inner.timers.clock().now()
            + ChronoDuration::from_std(THINK_DELAY).unwrap_or(ChronoDuration::zero());
        let name = think_timer(&handler);
        self.inner.timers.schedule_at(&name, deadline, async move {
            skill.show_thinking(handler, seen);
        })
    }

    fn show_thinking(&self, handler: String, seen: u64) {
        {
            let mut state = self.inner.state.lock();
            if state.interaction_id != seen {
                trace!("Interaction since {} started, not thinking", handler);
                return;
            }
            state.thinking.insert(handler.clone());
        }
        debug!("{} is busy", handler);
        if let Err(e) = self.inner.enclosure.mouth_think() {
            warn!("Failed to show thinking: {}", e);
        }
    }

    fn on_handler_complete(&self, message: &Message) -> Result<()> {
        let handler = message.get("name").unwrap_or_default();
        self.inner.timers.cancel(&think_timer(handler));
        let was_thinking = self.inner.state.lock().thinking.remove(handler);
        if was_thinking {
            self.inner.enclosure.reset()?;
        }
        Ok(())
    }

    // Idle dimming

    /// (Re)starts the idle check
    pub fn start_idle_check(&self) -> Result<()> {
        self.inner.state.lock().idle_count = 0;
        let skill = self.clone();
        self.inner.timers.schedule_repeating(
            IDLE_CHECK,
            IDLE_CHECK_DELAY,
            IDLE_CHECK_FREQUENCY,
            move || {
                let skill = skill.clone();
                async move { skill.check_for_idle().await }
            },
        )
    }

    /// Stops the idle check and reopens drooped eyes
    pub fn stop_idle_check(&self) -> Result<()> {
        self.inner.timers.cancel(IDLE_CHECK);
        let (rgb, drooped) = {
            let mut state = self.inner.state.lock();
            let drooped = state.idle_count >= IDLE_DROOP_COUNT;
            state.idle_count = 0;
            (state.current_rgb, drooped)
        };
        if drooped {
            self.inner.enclosure.eyes_reset()?;
            self.inner.enclosure.eyes_color(rgb)?;
        }
        Ok(())
    }

    async fn check_for_idle(&self) {
        let idle = self.inner.host.display_idle();
        let (count, rgb) = {
            let mut state = self.inner.state.lock();
            if idle {
                state.idle_count += 1;
            } else {
                state.idle_count = 0;
            }
            (state.idle_count, state.current_rgb)
        };
        trace!("Idle check {} (idle: {})", count, idle);

        let result = if count == IDLE_DROOP_COUNT {
            self.lower_eyes(rgb).await
        } else if count > IDLE_DROOP_COUNT {
            let result = self.look_inattentive(rgb).await;
            self.inner.timers.cancel(IDLE_CHECK);
            result
        } else {
            Ok(())
        };
        if let Err(e) = result {
            warn!("Idle animation failed: {}", e);
        }
    }

    async fn lower_eyes(&self, rgb: Rgb) -> Result<()> {
        debug!("Lowering eyes");
        self.inner.enclosure.eyes_look(Gaze::Down)?;
        tokio::time::sleep(LOOK_DOWN_SETTLE).await;
        for pixel in EYE_PIXELS.lowered {
            self.inner.enclosure.eyes_setpixel(pixel, rgb)?;
        }
        Ok(())
    }

    async fn look_inattentive(&self, rgb: Rgb) -> Result<()> {
        debug!("Looking inattentive");
        let dark = rgb.darker();
        for pixel in 0..EYE_PIXELS.count {
            let lit = EYE_PIXELS
                .inattentive_lit
                .iter()
                .any(|range| range.contains(&pixel));
            let color = if lit { dark } else { Rgb::default() };
            self.inner.enclosure.eyes_setpixel(pixel, color)?;
            tokio::time::sleep(PIXEL_COMMAND_DELAY).await;
        }
        Ok(())
    }
}

fn think_timer(handler: &str) -> String {
    format!("Think:{handler}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{LogSpeaker, StaticHost, TracingEnclosure};
    use crate::schedule::Daypoint;

    fn skill() -> (Arc<TracingEnclosure>, Arc<StaticHost>, FaceplateSkill) {
        let enclosure = Arc::new(TracingEnclosure::new());
        let host = Arc::new(StaticHost::default());
        let skill = FaceplateSkill::new(
            SkillConfig::default(),
            enclosure.clone(),
            Arc::new(LogSpeaker),
            host.clone(),
        )
        .unwrap();
        (enclosure, host, skill)
    }

    #[test]
    fn test_dispatch_table_covers_events() {
        let (_, _, skill) = skill();
        let table = skill.inner.handlers.lock();
        assert_eq!(table.len(), 10);
        assert!(table.contains_key(events::READY));
        assert!(table.contains_key(events::HANDLER_COMPLETE));
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let (_, _, skill) = skill();
        assert!(!skill.handle_event(&Message::new("mycroft.stop")).unwrap());
    }

    #[test]
    fn test_set_eye_color_records_descriptor() {
        let (enclosure, _, skill) = skill();
        let rgb = skill.set_eye_color(EyeColor::Named("Red"), false).unwrap();
        assert_eq!(enclosure.state().rgb_color, rgb);
        assert_eq!(skill.settings().current_eye_color, "red");

        skill
            .set_eye_color(EyeColor::Rgb(Rgb::new(1, 2, 3)), false)
            .unwrap();
        assert_eq!(skill.settings().current_eye_color, "(1, 2, 3)");
        assert_eq!(
            parse_to_rgb(&skill.settings().current_eye_color, skill.colors()).unwrap(),
            Rgb::new(1, 2, 3)
        );
    }

    #[test]
    fn test_manual_brightness_turns_auto_off() {
        let (enclosure, _, skill) = skill();
        skill.handle_brightness(Some("half")).unwrap();
        assert_eq!(enclosure.state().brightness.value(), 15);
        assert_eq!(skill.auto_brightness(), AutoBrightness::Off);
        assert!(!skill.timers().is_pending(Daypoint::Noon.label()));
    }

    #[test]
    fn test_shutdown_clears_dispatch() {
        let (_, _, skill) = skill();
        skill.shutdown();
        assert!(!skill.handle_event(&Message::new(events::READY)).unwrap());
    }
}
