//! Core type definitions for the player

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A playable song with the metadata shown while it plays
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub name: String,
    pub duration_ms: u64,
    pub artists: Vec<String>,
    pub album: String,
}

impl Track {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn artist_line(&self) -> String {
        self.artists.join(",")
    }
}

/// Policy used to pick the next/previous track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayMode {
    #[default]
    ListLoop,
    Order,
    SingleLoop,
    Random,
    Intelligent,
}

impl PlayMode {
    /// Manual mode cycle. Intelligent is never entered from here.
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::ListLoop => PlayMode::Order,
            PlayMode::Order => PlayMode::SingleLoop,
            PlayMode::SingleLoop => PlayMode::Random,
            PlayMode::Random => PlayMode::ListLoop,
            PlayMode::Intelligent => PlayMode::ListLoop,
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlayMode::ListLoop => "List",
            PlayMode::Order => "Order",
            PlayMode::SingleLoop => "Single",
            PlayMode::Random => "Random",
            PlayMode::Intelligent => "Intelligent",
        };
        f.write_str(label)
    }
}

/// Direction of a track transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Playback state reported by the audio engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// Stream container formats the engine can decode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamFormat {
    Mp3,
    Flac,
}

impl StreamFormat {
    /// Parses a format string from the song-url service, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "mp3" => Some(StreamFormat::Mp3),
            "flac" => Some(StreamFormat::Flac),
            _ => None,
        }
    }
}

/// Persisted playback position
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub cursor: usize,
    pub playlist: Vec<Track>,
}

/// Seed for the recommendation service: a track and the playlist it came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntelligenceSeed {
    pub track: Track,
    pub playlist_id: i64,
}

/// Read-only view of the player, used for rendering
#[derive(Clone, Debug, Default)]
pub struct PlayerStatus {
    pub cursor: usize,
    pub playlist_len: usize,
    pub current: Option<Track>,
    /// Time played of the current track
    pub passed: Duration,
    pub mode: PlayMode,
    pub state: PlaybackState,
    pub error_streak: u32,
    pub playing_menu_key: String,
}
