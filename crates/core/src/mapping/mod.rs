use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ParameterStore, RawEvent};

const MIDI_VALUE_MAX: f32 = 127.0;

/// Render parameter a controller is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterTarget {
    Red,
    Green,
    Blue,
    Size,
}

impl ParameterTarget {
    pub const ALL: [ParameterTarget; 4] = [Self::Red, Self::Green, Self::Blue, Self::Size];

    /// Fixed controller table: CC 13-16 drive red, green, blue and size.
    pub fn for_controller(controller: u8) -> Option<Self> {
        match controller {
            13 => Some(Self::Red),
            14 => Some(Self::Green),
            15 => Some(Self::Blue),
            16 => Some(Self::Size),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Size => "size",
        }
    }
}

impl fmt::Display for ParameterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a 7-bit controller value onto `[0.0, 1.0]`.
pub fn normalize(value: u8) -> f32 {
    f32::from(value.min(127)) / MIDI_VALUE_MAX
}

/// Concrete value routed to a render parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub target: ParameterTarget,
    pub value: f32,
}

impl ParameterUpdate {
    /// Translates a decoded event. Unmapped controllers yield `None`.
    pub fn from_event(event: &RawEvent) -> Option<Self> {
        ParameterTarget::for_controller(event.controller).map(|target| Self {
            target,
            value: normalize(event.value),
        })
    }
}

/// Applies one event to the shared store and returns the update it made.
///
/// The field is replaced inside the store's critical section, so inputs
/// registered from several sources never overwrite each other's fields with
/// stale values. Unmapped controllers are accepted and leave the store
/// untouched.
pub fn apply_event(event: &RawEvent, store: &ParameterStore) -> Option<ParameterUpdate> {
    let update = ParameterUpdate::from_event(event)?;
    store.update(|set| set.with(update.target, update.value));
    Some(update)
}
