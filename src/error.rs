//! Error types for playback orchestration

use std::time::Duration;

use thiserror::Error;

/// Failures the player recovers from locally
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Non-200 response, or no usable url in the song-url payload
    #[error("could not resolve stream for track {track_id}: {reason}")]
    ResolutionFailure { track_id: i64, reason: String },

    /// The resolved stream is neither mp3 nor flac
    #[error("unsupported stream format `{format}` for track {track_id}")]
    UnsupportedFormat { track_id: i64, format: String },

    /// Playback ran past the declared duration by more than the allowed slack
    #[error("stream stuck at {elapsed:?} for a {declared:?} track")]
    StuckStream { elapsed: Duration, declared: Duration },

    /// The operation needs a logged-in session
    #[error("login required")]
    AuthRequired,

    /// The recommendation service returned a non-success code
    #[error("recommendation service returned code {code}")]
    RecommendationFailure { code: i64 },

    /// Transport or decoding failure talking to the remote service
    #[error("remote service error: {0}")]
    Transport(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
