/*!
 # Automatic brightness scheduling

 Brightness follows the sun: bright at sunrise, full at solar noon, dim at
 sunset. Each daypoint owns one named timer which, after firing, schedules
 the same daypoint for the following day.
*/

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::brightness::BrightnessLevel;
use crate::device::Enclosure;
use crate::solar::{solar_day, Location};
use crate::timer::NamedTimers;
use crate::{Error, Result};

/// Points of the day with a fixed brightness target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Daypoint {
    Sunrise,
    Noon,
    Sunset,
}

impl Daypoint {
    /// All daypoints in order through the day
    pub const ALL: [Daypoint; 3] = [Daypoint::Sunrise, Daypoint::Noon, Daypoint::Sunset];

    /// Label, also used as the timer name
    pub fn label(&self) -> &'static str {
        match self {
            Daypoint::Sunrise => "Sunrise",
            Daypoint::Noon => "Noon",
            Daypoint::Sunset => "Sunset",
        }
    }

    /// Brightness level applied at this point of the day
    pub fn level(&self) -> BrightnessLevel {
        let value = match self {
            Daypoint::Sunrise => 20,
            Daypoint::Noon => BrightnessLevel::MAX,
            Daypoint::Sunset => 5,
        };
        // All three are within 0-30
        BrightnessLevel::new(value).unwrap_or_default()
    }
}

impl fmt::Display for Daypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One daypoint with its instant and brightness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaypointEntry {
    pub daypoint: Daypoint,
    pub at: DateTime<Utc>,
    pub level: BrightnessLevel,
}

impl DaypointEntry {
    /// The instant shifted by the location's UTC offset
    pub fn local_time(&self, location: &Location) -> Result<DateTime<FixedOffset>> {
        let offset = location.utc_offset_seconds(self.at)?;
        let offset = FixedOffset::east_opt(offset)
            .ok_or_else(|| Error::Configuration(format!("bad UTC offset {offset}")))?;
        Ok(self.at.with_timezone(&offset))
    }
}

/// Today's sunrise, noon and sunset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaypointSchedule {
    entries: [DaypointEntry; 3],
}

impl DaypointSchedule {
    pub fn get(&self, daypoint: Daypoint) -> &DaypointEntry {
        let index = Daypoint::ALL
            .iter()
            .position(|d| *d == daypoint)
            .unwrap_or_default();
        &self.entries[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DaypointEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Computes today's daypoints at `location`
///
/// "Today" is the calendar date of `now` in the location's timezone. Either
/// all three daypoints are returned or a configuration error.
#[instrument]
pub fn compute_daypoints(location: &Location, now: DateTime<Utc>) -> Result<DaypointSchedule> {
    location.validate()?;
    let date = location.local_date(now)?;
    let day = solar_day(location, date)?;

    let entry = |daypoint: Daypoint, at| DaypointEntry {
        daypoint,
        at,
        level: daypoint.level(),
    };
    Ok(DaypointSchedule {
        entries: [
            entry(Daypoint::Sunrise, day.sunrise),
            entry(Daypoint::Noon, day.noon),
            entry(Daypoint::Sunset, day.sunset),
        ],
    })
}

/// Pushes an instant that is not after `reference` forward by a day
pub fn next_occurrence(at: DateTime<Utc>, reference: DateTime<Utc>) -> DateTime<Utc> {
    if at <= reference {
        at + Duration::hours(24)
    } else {
        at
    }
}

/// The daypoint closest in time to `now`, earlier daypoints winning ties
pub fn nearest_daypoint(schedule: &DaypointSchedule, now: DateTime<Utc>) -> &DaypointEntry {
    let mut nearest = &schedule.entries[0];
    for entry in schedule.iter().skip(1) {
        if (entry.at - now).abs() < (nearest.at - now).abs() {
            nearest = entry;
        }
    }
    nearest
}

/// Whether brightness follows the sun
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoBrightness {
    On,
    #[default]
    Off,
}

struct SchedulerInner {
    location: Mutex<Location>,
    timers: NamedTimers,
    enclosure: Arc<dyn Enclosure>,
    mode: Mutex<AutoBrightness>,
}

/// Drives the daily brightness timers
#[derive(Clone)]
pub struct BrightnessScheduler {
    inner: Arc<SchedulerInner>,
}

impl fmt::Debug for BrightnessScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrightnessScheduler")
            .field("location", &*self.inner.location.lock())
            .field("mode", &self.mode())
            .field("timers", &self.inner.timers)
            .finish()
    }
}

impl BrightnessScheduler {
    pub fn new(location: Location, timers: NamedTimers, enclosure: Arc<dyn Enclosure>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                location: Mutex::new(location),
                timers,
                enclosure,
                mode: Mutex::new(AutoBrightness::Off),
            }),
        }
    }

    pub fn mode(&self) -> AutoBrightness {
        *self.inner.mode.lock()
    }

    pub fn location(&self) -> Location {
        self.inner.location.lock().clone()
    }

    /// Changes the location used by the next computation
    pub fn set_location(&self, location: Location) {
        *self.inner.location.lock() = location;
    }

    /// Today's daypoints at the configured location
    pub fn compute(&self) -> Result<DaypointSchedule> {
        compute_daypoints(&self.location(), self.inner.timers.clock().now())
    }

    /// Turns auto brightness on
    ///
    /// Applies the level of the daypoint nearest to now and schedules all
    /// three daypoints. On failure nothing is scheduled and the mode is left
    /// unchanged.
    #[instrument(skip(self))]
    pub fn enable(&self) -> Result<DaypointEntry> {
        let schedule = self.compute()?;
        let now = self.inner.timers.clock().now();
        let nearest = *nearest_daypoint(&schedule, now);

        let previous = std::mem::replace(&mut *self.inner.mode.lock(), AutoBrightness::On);
        if let Err(e) = self.schedule_all(&schedule) {
            *self.inner.mode.lock() = previous;
            return Err(e);
        }

        if let Err(e) = self.inner.enclosure.eyes_brightness(nearest.level) {
            warn!("Failed to apply {} brightness: {}", nearest.daypoint, e);
        }
        info!(
            "Auto brightness on, nearest daypoint {} (level {})",
            nearest.daypoint, nearest.level
        );
        Ok(nearest)
    }

    /// Turns auto brightness off and drops the daypoint timers
    #[instrument(skip(self))]
    pub fn disable(&self) {
        *self.inner.mode.lock() = AutoBrightness::Off;
        self.cancel_all();
        debug!("Auto brightness off");
    }

    /// Schedules every entry, all or nothing
    pub fn schedule_all(&self, schedule: &DaypointSchedule) -> Result<()> {
        let now = self.inner.timers.clock().now();
        for entry in schedule.iter() {
            if let Err(e) = self.schedule_entry(entry, now) {
                error!("Failed to schedule {}: {}", entry.daypoint, e);
                self.cancel_all();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Cancels the three daypoint timers
    pub fn cancel_all(&self) {
        for daypoint in Daypoint::ALL {
            self.inner.timers.cancel(daypoint.label());
        }
    }

    fn schedule_entry(&self, entry: &DaypointEntry, reference: DateTime<Utc>) -> Result<()> {
        let deadline = next_occurrence(entry.at, reference);
        let task = self.clone().fire(entry.daypoint, entry.level, deadline);
        self.inner
            .timers
            .schedule_at(entry.daypoint.label(), deadline, task)
    }

    /// Timer body: apply the level, then queue the next day
    fn fire(
        self,
        daypoint: Daypoint,
        level: BrightnessLevel,
        deadline: DateTime<Utc>,
    ) -> BoxFuture<'static, ()> {
        async move {
            if self.mode() != AutoBrightness::On {
                debug!("{} fired with auto brightness off, not rescheduling", daypoint);
                return;
            }

            info!("{}: setting brightness to {}", daypoint, level);
            if let Err(e) = self.inner.enclosure.eyes_brightness(level) {
                warn!("Failed to set {} brightness: {}", daypoint, e);
            }

            let now = self.inner.timers.clock().now();
            let next = compute_daypoints(&self.location(), now)
                .and_then(|schedule| self.schedule_entry(schedule.get(daypoint), now.max(deadline)));
            if let Err(e) = next {
                warn!("Could not reschedule {}: {}", daypoint, e);
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::EnclosureCommand;
    use crate::timer::ManualClock;
    use chrono::TimeZone;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EnclosureCommand>>);

    impl Enclosure for Recorder {
        fn send(&self, command: EnclosureCommand) -> Result<()> {
            self.0.lock().push(command);
            Ok(())
        }
    }

    fn summer_day() -> DateTime<Utc> {
        // 08:00 in Lawrence
        Utc.with_ymd_and_hms(2024, 6, 21, 13, 0, 0).unwrap()
    }

    fn scheduler(now: DateTime<Utc>, location: Location) -> (Arc<ManualClock>, Arc<Recorder>, BrightnessScheduler) {
        let clock = Arc::new(ManualClock::new(now));
        let recorder = Arc::new(Recorder::default());
        let timers = NamedTimers::new(clock.clone());
        let scheduler = BrightnessScheduler::new(location, timers, recorder.clone());
        (clock, recorder, scheduler)
    }

    #[test]
    fn test_compute_daypoints() {
        let schedule = compute_daypoints(&Location::default(), summer_day()).unwrap();
        let labels: Vec<_> = schedule.iter().map(|e| e.daypoint.label()).collect();
        let levels: Vec<_> = schedule.iter().map(|e| e.level.value()).collect();

        assert_eq!(labels, vec!["Sunrise", "Noon", "Sunset"]);
        assert_eq!(levels, vec![20, 30, 5]);
        assert!(schedule.get(Daypoint::Sunrise).at < schedule.get(Daypoint::Noon).at);
        assert!(schedule.get(Daypoint::Noon).at < schedule.get(Daypoint::Sunset).at);
    }

    #[test]
    fn test_local_time_uses_location_offset() {
        let location = Location::default();
        let schedule = compute_daypoints(&location, summer_day()).unwrap();
        let noon = schedule.get(Daypoint::Noon);
        let local = noon.local_time(&location).unwrap();
        assert_eq!(local.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(local, noon.at);
    }

    #[test]
    fn test_next_occurrence() {
        let now = summer_day();
        let past = now - Duration::hours(3);
        let future = now + Duration::hours(3);

        let shifted = next_occurrence(past, now);
        assert_eq!(shifted - past, Duration::hours(24));
        assert!(shifted > now && shifted - now < Duration::hours(24));
        assert_eq!(next_occurrence(future, now), future);
        assert_eq!(next_occurrence(now, now), now + Duration::hours(24));
    }

    #[test]
    fn test_nearest_daypoint() {
        let schedule = compute_daypoints(&Location::default(), summer_day()).unwrap();
        let noon = schedule.get(Daypoint::Noon).at;
        let sunset = schedule.get(Daypoint::Sunset).at;

        assert_eq!(
            nearest_daypoint(&schedule, noon + Duration::minutes(5)).daypoint,
            Daypoint::Noon
        );
        assert_eq!(
            nearest_daypoint(&schedule, sunset + Duration::hours(2)).daypoint,
            Daypoint::Sunset
        );
        let midpoint = noon + (sunset - noon) / 2;
        assert_eq!(nearest_daypoint(&schedule, midpoint).daypoint, Daypoint::Noon);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_schedules_all_three() {
        let (_clock, recorder, scheduler) = scheduler(summer_day(), Location::default());
        let nearest = scheduler.enable().unwrap();

        assert_eq!(scheduler.mode(), AutoBrightness::On);
        assert_eq!(nearest.daypoint, Daypoint::Sunrise);
        assert_eq!(
            *recorder.0.lock(),
            vec![EnclosureCommand::EyesBrightness(nearest.level)]
        );
        assert_eq!(
            scheduler.inner.timers.pending_names(),
            vec!["Noon".to_string(), "Sunrise".to_string(), "Sunset".to_string()]
        );

        // Sunrise has already passed at 08:00
        let sunrise = scheduler.compute().unwrap().get(Daypoint::Sunrise).at;
        let deadline = scheduler.inner.timers.deadline("Sunrise").unwrap();
        assert_eq!(deadline - sunrise, Duration::hours(24));
        assert!(deadline > summer_day());

        scheduler.disable();
        assert_eq!(scheduler.mode(), AutoBrightness::Off);
        assert!(scheduler.inner.timers.pending_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_with_bad_location_is_atomic() {
        let (_clock, recorder, scheduler) =
            scheduler(summer_day(), Location::new("Nowhere/Special", 10.0, 10.0));

        assert!(matches!(scheduler.enable(), Err(Error::Configuration(_))));
        assert_eq!(scheduler.mode(), AutoBrightness::Off);
        assert!(scheduler.inner.timers.pending_names().is_empty());
        assert!(recorder.0.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_firing_applies_level_and_reschedules() {
        let location = Location::default();
        let noon = compute_daypoints(&location, summer_day())
            .unwrap()
            .get(Daypoint::Noon)
            .at;
        let (_clock, recorder, scheduler) = scheduler(noon - Duration::seconds(10), location);

        scheduler.enable().unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(11)).await;

        let commands = recorder.0.lock().clone();
        let level = Daypoint::Noon.level();
        assert_eq!(
            commands,
            vec![
                EnclosureCommand::EyesBrightness(level),
                EnclosureCommand::EyesBrightness(level)
            ]
        );
        let next = scheduler.inner.timers.deadline("Noon").unwrap();
        assert_eq!(next - noon, Duration::hours(24));
    }

    #[tokio::test(start_paused = true)]
    async fn test_firing_after_disable_does_nothing() {
        let location = Location::default();
        let noon = compute_daypoints(&location, summer_day())
            .unwrap()
            .get(Daypoint::Noon)
            .at;
        let (_clock, recorder, scheduler) = scheduler(noon - Duration::seconds(10), location);

        scheduler.enable().unwrap();
        *scheduler.inner.mode.lock() = AutoBrightness::Off;
        tokio::time::sleep(std::time::Duration::from_secs(11)).await;

        assert_eq!(recorder.0.lock().len(), 1);
        assert!(!scheduler.inner.timers.is_pending("Noon"));
    }
}
