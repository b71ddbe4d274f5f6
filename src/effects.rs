/*!
 # Eye animations and dialogs

 Pixel layouts and timings for the idle animations, plus the set of
 dialogs the skill can speak.
*/

use std::ops::Range;
use std::time::Duration;

/// Pixel layout of the eye rings
#[derive(Debug, Clone)]
pub struct EyePixels {
    /// Total pixels across both eyes
    pub count: u8,
    /// Pixels left lit when the eyes droop
    pub lowered: [u8; 4],
    /// Pixels switched off for the inattentive look
    pub inattentive_off: [Range<u8>; 3],
    /// Pixels kept at the darker color for the inattentive look
    pub inattentive_lit: [Range<u8>; 2],
}

/// Eye ring layout of the faceplate
pub const EYE_PIXELS: EyePixels = EyePixels {
    count: 24,
    lowered: [3, 8, 15, 20],
    inattentive_off: [0..3, 9..15, 21..24],
    inattentive_lit: [3..9, 15..21],
};

/// Delay before the first idle check
pub const IDLE_CHECK_DELAY: Duration = Duration::from_secs(60);
/// Time between idle checks
pub const IDLE_CHECK_FREQUENCY: Duration = Duration::from_secs(6);
/// Idle checks before the eyes droop
pub const IDLE_DROOP_COUNT: u32 = 2;
/// Lets the look-down animation finish before pixels are overwritten
pub const LOOK_DOWN_SETTLE: Duration = Duration::from_millis(500);
/// Gap between pixel commands so the serial link keeps up
pub const PIXEL_COMMAND_DELAY: Duration = Duration::from_millis(50);
/// How long a handler may run silently before the mouth shows "thinking"
pub const THINK_DELAY: Duration = Duration::from_millis(250);

/// Everything the skill can say
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    SetColorSuccess,
    ErrorSetColor,
    ColorNotExist,
    ColorNeed,
    SetCustomColor,
    GetRValue,
    GetGValue,
    GetBValue,
    ErrorRgbValue,
    BrightnessSet { percent: u8 },
    BrightnessNotFound,
    BrightnessNotFoundFinal,
    AutoBrightnessFailed,
}

impl Dialog {
    /// Dialog file name used by the host's localisation
    pub fn key(&self) -> &'static str {
        match self {
            Dialog::SetColorSuccess => "set.color.success",
            Dialog::ErrorSetColor => "error.set.color",
            Dialog::ColorNotExist => "color.not.exist",
            Dialog::ColorNeed => "color.need",
            Dialog::SetCustomColor => "set.custom.color",
            Dialog::GetRValue => "get.r.value",
            Dialog::GetGValue => "get.g.value",
            Dialog::GetBValue => "get.b.value",
            Dialog::ErrorRgbValue => "error.rgbvalue",
            Dialog::BrightnessSet { .. } => "brightness.set",
            Dialog::BrightnessNotFound => "brightness.not.found",
            Dialog::BrightnessNotFoundFinal => "brightness.not.found.final",
            Dialog::AutoBrightnessFailed => "auto.brightness.failed",
        }
    }

    /// English rendering
    pub fn text(&self) -> String {
        match self {
            Dialog::SetColorSuccess => "I've changed my eye color.".to_string(),
            Dialog::ErrorSetColor => "I couldn't set that eye color.".to_string(),
            Dialog::ColorNotExist => "I don't know that color.".to_string(),
            Dialog::ColorNeed => "What color would you like?".to_string(),
            Dialog::SetCustomColor => "Let's make a custom color.".to_string(),
            Dialog::GetRValue => "How much red, from 0 to 255?".to_string(),
            Dialog::GetGValue => "How much green?".to_string(),
            Dialog::GetBValue => "And how much blue?".to_string(),
            Dialog::ErrorRgbValue => "That needs to be a number from 0 to 255.".to_string(),
            Dialog::BrightnessSet { percent } => format!("Brightness set to {percent}%."),
            Dialog::BrightnessNotFound => "What brightness would you like?".to_string(),
            Dialog::BrightnessNotFoundFinal => "I didn't understand that brightness.".to_string(),
            Dialog::AutoBrightnessFailed => {
                "I can't work out sunrise and sunset for your location.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inattentive_covers_every_pixel_once() {
        let mut seen = vec![0u8; EYE_PIXELS.count as usize];
        for range in EYE_PIXELS
            .inattentive_off
            .iter()
            .chain(EYE_PIXELS.inattentive_lit.iter())
        {
            for idx in range.clone() {
                seen[idx as usize] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_brightness_dialog_text() {
        let dialog = Dialog::BrightnessSet { percent: 67 };
        assert_eq!(dialog.key(), "brightness.set");
        assert_eq!(dialog.text(), "Brightness set to 67%.");
    }
}
