/*!
 # Solar events

 Sunrise, solar noon and sunset for a location and calendar date. The
 sunrise and sunset instants come from the `sunrise` crate; solar noon is
 their midpoint.
*/

use chrono::{DateTime, Datelike, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{Error, Result};

/// Where the faceplate lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// IANA timezone name, e.g. `America/Chicago`
    pub timezone: String,
    /// Degrees north (-90 to 90)
    pub latitude: f64,
    /// Degrees east (-180 to 180)
    pub longitude: f64,
}

impl Default for Location {
    fn default() -> Self {
        // Lawrence, Kansas
        Self {
            timezone: "America/Chicago".to_string(),
            latitude: 38.971669,
            longitude: -95.23525,
        }
    }
}

impl Location {
    pub fn new(timezone: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            timezone: timezone.to_string(),
            latitude,
            longitude,
        }
    }

    /// Parsed timezone, or a configuration error for an unknown name
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            Error::Configuration(format!("unknown timezone {:?}", self.timezone))
        })
    }

    /// Checks coordinates and timezone
    pub fn validate(&self) -> Result<Tz> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::Configuration(format!(
                "latitude {} outside -90..90",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::Configuration(format!(
                "longitude {} outside -180..180",
                self.longitude
            )));
        }
        self.tz()
    }

    /// Offset from UTC in seconds at the given instant
    pub fn utc_offset_seconds(&self, at: DateTime<Utc>) -> Result<i32> {
        let tz = self.tz()?;
        Ok(tz
            .offset_from_utc_datetime(&at.naive_utc())
            .fix()
            .local_minus_utc())
    }

    /// Calendar date at the location for an instant
    pub fn local_date(&self, at: DateTime<Utc>) -> Result<NaiveDate> {
        Ok(at.with_timezone(&self.tz()?).date_naive())
    }
}

/// Solar events of one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarDay {
    pub date: NaiveDate,
    pub sunrise: DateTime<Utc>,
    pub noon: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

fn from_timestamp(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| Error::Configuration(format!("timestamp {seconds} out of range")))
}

/// Computes sunrise, solar noon and sunset
///
/// # Arguments
///
/// * `location` - Coordinates and timezone (validated)
/// * `date` - Calendar date at the location
///
/// Fails with a configuration error for bad coordinates, an unknown timezone
/// or a date on which the sun does not rise or set.
#[instrument]
pub fn solar_day(location: &Location, date: NaiveDate) -> Result<SolarDay> {
    location.validate()?;

    let (rise, set) = sunrise::sunrise_sunset(
        location.latitude,
        location.longitude,
        date.year(),
        date.month(),
        date.day(),
    );
    // Polar day and night come back as degenerate timestamps
    if rise >= set {
        warn!("No sunrise/sunset at {:?} on {}", location, date);
        return Err(Error::Configuration(format!(
            "the sun does not rise or set at latitude {} on {date}",
            location.latitude
        )));
    }

    let day = SolarDay {
        date,
        sunrise: from_timestamp(rise)?,
        noon: from_timestamp(rise + (set - rise) / 2)?,
        sunset: from_timestamp(set)?,
    };
    debug!(
        "Solar day {}: sunrise {} noon {} sunset {}",
        date, day.sunrise, day.noon, day.sunset
    );
    Ok(day)
}
