/*!
 # Color resolution

 Turns user supplied color descriptors into validated RGB values. A
 descriptor is a color name from a [`ColorTable`], an `(r,g,b)` tuple or a
 six digit hex code with an optional leading `#`.
*/

use std::fmt;
use std::path::Path;

use tracing::{debug, instrument, trace};

use crate::{Error, Result};

/// Built-in English color vocabulary
const BUILTIN_COLORS: &str = include_str!("../locale/en-us/colors.value");

/// Minimum similarity a fuzzy match must exceed to be accepted
pub const FUZZY_THRESHOLD: f64 = 0.8;

/// Words dropped from spoken input before matching
const ARTICLES: [&str; 3] = ["a", "an", "the"];

/// An RGB color with red, green and blue components (0-255 each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Eye color used when nothing else has been configured
pub const DEFAULT_EYE_COLOR: Rgb = Rgb::new(34, 167, 240);

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Lowercase `#rrggbb` form
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Same hue at half intensity
    pub fn darker(&self) -> Self {
        Self::new(self.red / 2, self.green / 2, self.blue / 2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.red, self.green, self.blue)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

/// Value stored against a color name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorValue {
    /// Hex code as written in the vocabulary file
    Hex(String),
    /// Literal components
    Rgb(Rgb),
}

impl ColorValue {
    /// Decodes the stored value
    pub fn to_rgb(&self) -> Result<Rgb> {
        match self {
            ColorValue::Hex(hex) => hex_to_rgb(hex),
            ColorValue::Rgb(rgb) => Ok(*rgb),
        }
    }
}

/// Ordered vocabulary of named colors.
///
/// Names are stored lowercase. Iteration follows insertion order, which is
/// also the tie-break order of [`fuzzy_match`].
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    entries: Vec<(String, ColorValue)>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The English vocabulary shipped with the crate
    pub fn builtin() -> Self {
        // Embedded and covered by tests
        Self::from_values(BUILTIN_COLORS).unwrap_or_default()
    }

    /// Loads `<locale_dir>/<lang>/colors.value`
    #[instrument]
    pub fn load(locale_dir: &Path, lang: &str) -> Result<Self> {
        let path = locale_dir.join(lang).join("colors.value");
        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let table = Self::from_values(&text)?;
        debug!("Loaded {} colors from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parses `name,value` lines. Lines starting with `#` are comments.
    pub fn from_values(text: &str) -> Result<Self> {
        let mut table = Self::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, value) = line.split_once(',').ok_or_else(|| {
                Error::Configuration(format!(
                    "color table line {}: expected name,value",
                    line_no + 1
                ))
            })?;
            let value = value.trim();
            let value = match parse_tuple(value) {
                Some(Ok(rgb)) => ColorValue::Rgb(rgb),
                Some(Err(e)) => return Err(e),
                None => ColorValue::Hex(value.to_string()),
            };
            table.insert(name, value);
        }
        Ok(table)
    }

    /// Adds or replaces a color, keeping the position of an existing name
    pub fn insert(&mut self, name: &str, value: ColorValue) {
        let name = name.trim().to_lowercase();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Case-insensitive exact lookup
    pub fn get(&self, name: &str) -> Option<&ColorValue> {
        let name = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColorValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Converts a hex color code to RGB
///
/// # Arguments
///
/// * `hex` - Six hex digits, optionally prefixed with `#` (e.g. `#ff12ff` or `ff12ff`)
pub fn hex_to_rgb(hex: &str) -> Result<Rgb> {
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits).trim();
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidHex(hex.to_string()));
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| Error::InvalidHex(hex.to_string()))
    };
    Ok(Rgb::new(component(0..2)?, component(2..4)?, component(4..6)?))
}

/// Parses `(r,g,b)`, `[r,g,b]` or `r,g,b`.
///
/// Returns `None` when the text is not a three integer tuple at all, and
/// `Some(Err)` when it is one but a component lies outside 0-255.
fn parse_tuple(text: &str) -> Option<Result<Rgb>> {
    let inner = text.trim();
    let inner = inner
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .or_else(|| inner.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
        .unwrap_or(inner);

    let parts: Vec<i64> = inner
        .split(',')
        .map(|c| c.trim().parse::<i64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if parts.len() != 3 {
        return None;
    }

    let component = |v: i64| u8::try_from(v).ok();
    Some(
        match (component(parts[0]), component(parts[1]), component(parts[2])) {
            (Some(r), Some(g), Some(b)) => Ok(Rgb::new(r, g, b)),
            _ => Err(Error::InvalidColor(format!(
                "{text}: components must be between 0 and 255"
            ))),
        },
    )
}

/// Resolves a color descriptor to RGB
///
/// Tries, in order: a case-insensitive name in `table`, an `(r,g,b)` tuple,
/// and a hex code like `#0000cc` or `0000cc`.
#[instrument(skip(table))]
pub fn parse_to_rgb(descriptor: &str, table: &ColorTable) -> Result<Rgb> {
    if descriptor.trim().is_empty() {
        return Err(Error::InvalidColor("empty color".to_string()));
    }

    if let Some(value) = table.get(descriptor) {
        trace!("Resolved {:?} from color table", descriptor);
        return value
            .to_rgb()
            .map_err(|e| Error::InvalidColor(format!("{descriptor}: {e}")));
    }

    if let Some(parsed) = parse_tuple(descriptor) {
        trace!("Resolved {:?} as tuple", descriptor);
        return parsed;
    }

    hex_to_rgb(descriptor).map_err(|_| Error::InvalidColor(descriptor.to_string()))
}

/// Lowercases, collapses whitespace and drops articles from spoken input
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?'))
                .to_lowercase()
        })
        .filter(|w| !w.is_empty() && !ARTICLES.contains(&w.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds the closest color name in `table`
///
/// Returns `None` unless the best similarity exceeds [`FUZZY_THRESHOLD`].
/// The first name in table order wins ties.
#[instrument(skip(table))]
pub fn fuzzy_match<'a>(input: &str, table: &'a ColorTable) -> Option<&'a str> {
    let needle = normalize(input);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<(&str, f64)> = None;
    for name in table.names() {
        let score = similarity(&needle, name);
        trace!("{:?} vs {:?}: {:.3}", needle, name, score);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((name, score));
        }
    }

    match best {
        Some((name, score)) if score > FUZZY_THRESHOLD => {
            debug!("Matched {:?} to {:?} ({:.3})", input, name, score);
            Some(name)
        }
        _ => {
            debug!("No color close enough to {:?}", input);
            None
        }
    }
}

/// Similarity in [0, 1] between two strings.
///
/// The better of the block matching ratio and a vowel tolerant edit
/// similarity. Transcribed speech often gets vowels wrong ("rad" for "red").
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    block_ratio(&a, &b).max(edit_similarity(&a, &b))
}

/// `2 * M / T` where M counts characters in matching blocks
fn block_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(a, b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Longest common substring as `(start_a, start_b, len)`, earliest first
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                row[j + 1] = prev[j] + 1;
                if row[j + 1] > best.2 {
                    best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
                }
            }
        }
        prev = row;
    }
    best
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// `1 - d / max(len)` over an optimal string alignment distance counted
/// in half steps: vowel-for-vowel substitution costs one half step, every
/// other edit (including adjacent transposition) costs two.
fn edit_similarity(a: &[char], b: &[char]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    let (n, m) = (a.len(), b.len());
    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = 2 * i;
    }
    for j in 0..=m {
        d[0][j] = 2 * j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let substitution = if a[i - 1] == b[j - 1] {
                0
            } else if is_vowel(a[i - 1]) && is_vowel(b[j - 1]) {
                1
            } else {
                2
            };
            let mut cost = (d[i - 1][j] + 2)
                .min(d[i][j - 1] + 2)
                .min(d[i - 1][j - 1] + substitution);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                cost = cost.min(d[i - 2][j - 2] + 2);
            }
            d[i][j] = cost;
        }
    }

    1.0 - d[n][m] as f64 / (2 * longest) as f64
}
