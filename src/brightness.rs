/*!
 # Brightness levels

 The faceplate accepts brightness levels from 0 to 30. Users speak in
 percentages or words ("full", "half"), so this module converts between the
 two and parses free text into a [`BrightnessRequest`].
*/

use std::fmt;
use std::path::Path;

use tracing::{debug, instrument, trace};

use crate::color::normalize;
use crate::{Error, Result};

/// Built-in English brightness words
const BUILTIN_LEVELS: &str = include_str!("../locale/en-us/brightness.levels.value");

/// Table value that selects automatic brightness
const AUTO_MARKER: i32 = -1;

/// Hardware brightness level (0-30)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BrightnessLevel(u8);

impl BrightnessLevel {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 30;

    /// Returns an error if value is outside 0-30
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(Error::ValueOutOfRange(
                value as i64,
                Self::MIN as i64,
                Self::MAX as i64,
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Equivalent percentage (0-100)
    pub fn percent(&self) -> u8 {
        level_to_percent(*self)
    }
}

impl fmt::Display for BrightnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// Converts a percentage to the nearest hardware level
///
/// # Arguments
///
/// * `percent` - Brightness percentage (0-100)
pub fn percent_to_level(percent: u8) -> Result<BrightnessLevel> {
    if percent > 100 {
        return Err(Error::InvalidBrightness(format!(
            "{percent}% is above 100%"
        )));
    }
    let level = (percent as u32 * BrightnessLevel::MAX as u32 + 50) / 100;
    Ok(BrightnessLevel(level as u8))
}

/// Converts a hardware level to the nearest percentage
pub fn level_to_percent(level: BrightnessLevel) -> u8 {
    let max = BrightnessLevel::MAX as u32;
    ((level.0 as u32 * 100 + max / 2) / max) as u8
}

/// What the user asked the brightness to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessRequest {
    /// Fixed brightness as a percentage
    Percent(u8),
    /// Follow the sun
    Auto,
}

/// Word to percentage table, e.g. "half" -> 50
#[derive(Debug, Clone, Default)]
pub struct BrightnessTable {
    entries: Vec<(String, i32)>,
}

impl BrightnessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The English words shipped with the crate
    pub fn builtin() -> Self {
        Self::from_values(BUILTIN_LEVELS).unwrap_or_default()
    }

    /// Loads `<locale_dir>/<lang>/brightness.levels.value`
    #[instrument]
    pub fn load(locale_dir: &Path, lang: &str) -> Result<Self> {
        let path = locale_dir.join(lang).join("brightness.levels.value");
        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let table = Self::from_values(&text)?;
        debug!("Loaded {} brightness words from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parses `name,percent` lines. Lines starting with `#` are comments.
    pub fn from_values(text: &str) -> Result<Self> {
        let mut table = Self::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = line
                .split_once(',')
                .and_then(|(name, value)| Some((name, value.trim().parse::<i32>().ok()?)));
            let Some((name, value)) = parsed else {
                return Err(Error::Configuration(format!(
                    "brightness table line {}: expected name,percent",
                    line_no + 1
                )));
            };
            if value != AUTO_MARKER && !(0..=100).contains(&value) {
                return Err(Error::ValueOutOfRange(value as i64, 0, 100));
            }
            table.insert(name, value);
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: &str, percent: i32) {
        let name = normalize(name);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = percent,
            None => self.entries.push((name, percent)),
        }
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_percent(text: &str, original: &str) -> Result<u8> {
    text.trim()
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| Error::InvalidBrightness(original.to_string()))
}

/// Parses spoken or typed brightness
///
/// Accepts a word from `table`, a percentage ("40%", "40 percent") or a
/// plain number. Plain numbers below 30 are hardware levels, 30 and above
/// are percentages.
#[instrument(skip(table))]
pub fn parse_brightness(text: &str, table: &BrightnessTable) -> Result<BrightnessRequest> {
    let name = normalize(text);
    if let Some(value) = table.get(&name) {
        trace!("Brightness word {:?} = {}", name, value);
        return Ok(if value == AUTO_MARKER {
            BrightnessRequest::Auto
        } else {
            BrightnessRequest::Percent(value as u8)
        });
    }

    if name.contains('%') {
        return parse_percent(&name.replace('%', ""), text).map(BrightnessRequest::Percent);
    }
    if name.contains("percent") {
        return parse_percent(&name.replace("percent", ""), text).map(BrightnessRequest::Percent);
    }

    let value: i64 = name
        .parse()
        .map_err(|_| Error::InvalidBrightness(text.to_string()))?;
    if !(0..=100).contains(&value) {
        return Err(Error::InvalidBrightness(text.to_string()));
    }

    if value < BrightnessLevel::MAX as i64 {
        // A small plain number is a hardware level
        Ok(BrightnessRequest::Percent((value * 100 / 30) as u8))
    } else {
        Ok(BrightnessRequest::Percent(value as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_percent_round_trip() {
        for level in 0..=BrightnessLevel::MAX {
            let level = BrightnessLevel::new(level).unwrap();
            assert_eq!(percent_to_level(level_to_percent(level)).unwrap(), level);
        }
    }

    #[test]
    fn test_percent_to_level_rounds() {
        assert_eq!(percent_to_level(0).unwrap().value(), 0);
        assert_eq!(percent_to_level(50).unwrap().value(), 15);
        assert_eq!(percent_to_level(5).unwrap().value(), 2);
        assert_eq!(percent_to_level(100).unwrap().value(), 30);
        assert!(matches!(
            percent_to_level(101),
            Err(Error::InvalidBrightness(_))
        ));
    }

    #[test]
    fn test_level_bounds() {
        assert!(BrightnessLevel::new(30).is_ok());
        assert!(matches!(
            BrightnessLevel::new(31),
            Err(Error::ValueOutOfRange(31, 0, 30))
        ));
    }

    #[test]
    fn test_parse_words() {
        let table = BrightnessTable::builtin();
        assert_eq!(
            parse_brightness("Full", &table).unwrap(),
            BrightnessRequest::Percent(100)
        );
        assert_eq!(
            parse_brightness("the half", &table).unwrap(),
            BrightnessRequest::Percent(50)
        );
        assert_eq!(
            parse_brightness("auto", &table).unwrap(),
            BrightnessRequest::Auto
        );
    }

    #[test]
    fn test_parse_numbers() {
        let table = BrightnessTable::new();
        assert_eq!(
            parse_brightness("40%", &table).unwrap(),
            BrightnessRequest::Percent(40)
        );
        assert_eq!(
            parse_brightness("75 percent", &table).unwrap(),
            BrightnessRequest::Percent(75)
        );
        assert_eq!(
            parse_brightness("15", &table).unwrap(),
            BrightnessRequest::Percent(50)
        );
        assert_eq!(
            parse_brightness("60", &table).unwrap(),
            BrightnessRequest::Percent(60)
        );
    }

    #[test]
    fn test_parse_rejects() {
        let table = BrightnessTable::builtin();
        for bad in ["", "bright-ish", "150", "-3", "120%", "lots percent"] {
            assert!(
                matches!(parse_brightness(bad, &table), Err(Error::InvalidBrightness(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_table_rejects_out_of_range() {
        assert!(BrightnessTable::from_values("blinding,200\n").is_err());
        assert!(BrightnessTable::from_values("nonsense\n").is_err());
    }
}
