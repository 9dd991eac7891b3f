use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{midi::StatusFilter, MidiVizError, ParameterSet, Result};

const MAX_FRAMES_PER_SECOND: u32 = 1000;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub midi: MidiConfig,
    pub render: RenderConfig,
    /// Parameters in effect before the first controller moves.
    pub initial: ParameterSet,
}

impl AppConfig {
    pub fn live_defaults() -> Self {
        Self::default()
    }

    /// Loads a JSON configuration file. Missing sections fall back to their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        let initial = self.initial;
        if initial.clamped() != initial {
            return Err(MidiVizError::Config(format!(
                "initial parameters must lie in [0, 1], got {initial:?}"
            )));
        }
        Ok(())
    }
}

/// Configuration specific to the MIDI input side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub client_name: String,
    pub port_name: String,
    /// Only connect sources whose name contains this, case-insensitively.
    /// Without a filter every available source is connected.
    pub port_filter: Option<String>,
    pub status_filter: StatusFilter,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: "midi-visualiser".to_string(),
            port_name: "midi-visualiser-in".to_string(),
            port_filter: None,
            status_filter: StatusFilter::ControlChange,
        }
    }
}

impl MidiConfig {
    pub fn accepts_port(&self, name: &str) -> bool {
        match &self.port_filter {
            Some(filter) => name.to_lowercase().contains(&filter.to_lowercase()),
            None => true,
        }
    }
}

/// Configuration for the frame loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub frames_per_second: u32,
    /// Log the published uniforms every this many frames. Zero disables it.
    pub report_interval_frames: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 60,
            report_interval_frames: 60,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frames_per_second == 0 || self.frames_per_second > MAX_FRAMES_PER_SECOND {
            return Err(MidiVizError::Config(format!(
                "frames_per_second must be between 1 and {MAX_FRAMES_PER_SECOND}, got {}",
                self.frames_per_second
            )));
        }
        Ok(())
    }
}
