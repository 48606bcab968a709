//! Model module - Player data types, remote service, and persistence
//!
//! - `types`: Core type definitions (tracks, modes, states, snapshots)
//! - `netease_client`: Remote music service trait and its HTTP client
//! - `store`: Keyed persistence of the playback snapshot and play mode

mod types;
mod netease_client;
mod store;

pub use types::{
    Direction, IntelligenceSeed, PlayMode, PlaybackSnapshot, PlaybackState, PlayerStatus,
    StreamFormat, Track,
};

pub use netease_client::{
    CodeType, IntelligenceResponse, LyricResponse, MusicService, NeteaseClient,
    PlaylistTracksResponse, SongUrlEntry, SongUrlResponse,
};

pub use store::{JsonFileStore, SnapshotStore};
