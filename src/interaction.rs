//! Multi-turn conversations.
//!
//! When the skill asks a question, the answer arrives as a separate
//! utterance. [`PendingInteraction`] records what is being waited for and
//! [`handle_utterance`] turns the next utterance into an [`Effect`] for the
//! skill to carry out. Nothing here touches hardware or speech.

use tracing::{debug, instrument};

use crate::brightness::{parse_brightness, BrightnessRequest, BrightnessTable};
use crate::color::{normalize, Rgb};
use crate::effects::Dialog;

/// Retries allowed for each custom color component
pub const RGB_RETRIES: u8 = 2;

/// Words that abandon any pending question
const CANCEL_WORDS: [&str; 4] = ["cancel", "stop", "nevermind", "never mind"];

/// What the skill is waiting for
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingInteraction {
    #[default]
    None,
    /// A color name after "color.need"
    AwaitingColor,
    /// A brightness after "brightness.not.found"
    AwaitingBrightness,
    /// One component of a custom RGB color
    AwaitingCustomComponent {
        /// 0 = red, 1 = green, 2 = blue
        index: usize,
        collected: [u8; 3],
        retries_left: u8,
    },
}

impl PendingInteraction {
    /// Start of the custom color conversation
    pub fn custom_color() -> Self {
        PendingInteraction::AwaitingCustomComponent {
            index: 0,
            collected: [0; 3],
            retries_left: RGB_RETRIES,
        }
    }

    pub fn is_pending(&self) -> bool {
        !matches!(self, PendingInteraction::None)
    }
}

/// What the skill should do with an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Ask the next question
    Prompt(Dialog),
    /// Set the eyes to a named (possibly misheard) color
    SetColor(String),
    SetRgb(Rgb),
    SetBrightness(BrightnessRequest),
    /// Give up and tell the user why
    Reject(Dialog),
}

fn component_prompt(index: usize) -> Dialog {
    match index {
        0 => Dialog::GetRValue,
        1 => Dialog::GetGValue,
        _ => Dialog::GetBValue,
    }
}

fn parse_component(text: &str) -> Option<u8> {
    normalize(text).parse::<u8>().ok()
}

fn is_cancel(text: &str) -> bool {
    let text = normalize(text);
    CANCEL_WORDS.contains(&text.as_str())
}

/// Advances a pending conversation with the user's answer
#[instrument(skip(brightness))]
pub fn handle_utterance(
    state: PendingInteraction,
    text: &str,
    brightness: &BrightnessTable,
) -> (PendingInteraction, Effect) {
    if state.is_pending() && is_cancel(text) {
        debug!("Conversation cancelled");
        return (PendingInteraction::None, Effect::None);
    }

    match state {
        PendingInteraction::None => (PendingInteraction::None, Effect::None),

        PendingInteraction::AwaitingColor => {
            let name = normalize(text);
            if name.is_empty() {
                (PendingInteraction::None, Effect::Reject(Dialog::ColorNotExist))
            } else {
                (PendingInteraction::None, Effect::SetColor(name))
            }
        }

        PendingInteraction::AwaitingBrightness => match parse_brightness(text, brightness) {
            Ok(request) => (PendingInteraction::None, Effect::SetBrightness(request)),
            Err(e) => {
                debug!("Brightness answer rejected: {}", e);
                (
                    PendingInteraction::None,
                    Effect::Reject(Dialog::BrightnessNotFoundFinal),
                )
            }
        },

        PendingInteraction::AwaitingCustomComponent {
            index,
            mut collected,
            retries_left,
        } => match parse_component(text) {
            Some(value) => {
                collected[index] = value;
                if index >= 2 {
                    let [red, green, blue] = collected;
                    (PendingInteraction::None, Effect::SetRgb(Rgb::new(red, green, blue)))
                } else {
                    (
                        PendingInteraction::AwaitingCustomComponent {
                            index: index + 1,
                            collected,
                            retries_left: RGB_RETRIES,
                        },
                        Effect::Prompt(component_prompt(index + 1)),
                    )
                }
            }
            None if retries_left > 0 => (
                PendingInteraction::AwaitingCustomComponent {
                    index,
                    collected,
                    retries_left: retries_left - 1,
                },
                Effect::Prompt(Dialog::ErrorRgbValue),
            ),
            None => {
                debug!("Out of retries for component {}", index);
                (PendingInteraction::None, Effect::Reject(Dialog::ErrorRgbValue))
            }
        },
    }
}
