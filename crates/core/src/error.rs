/// Result alias that carries the custom [`MidiVizError`] type.
pub type Result<T> = std::result::Result<T, MidiVizError>;

/// Common error type for the core crate.
///
/// Only setup and offline operations produce these. The packet and frame
/// paths swallow malformed input instead of reporting it.
#[derive(Debug, thiserror::Error)]
pub enum MidiVizError {
    /// Free-form message, mostly used to carry backend failures from the
    /// application layer.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A packet file line could not be parsed.
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    /// Configuration values that parsed but make no sense.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Malformed JSON configuration.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl MidiVizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}

impl From<&str> for MidiVizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for MidiVizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
