//! Interfaces the player needs from the presentation layer, the playing
//! menu, the OS media controls, and the login session

use std::time::Duration;

use async_trait::async_trait;

use crate::lyric::LyricWindow;
use crate::model::{Direction, IntelligenceSeed, PlaybackState, Track};

/// Presentation layer as seen by the player
pub trait UiContext: Send + Sync {
    /// Fire-and-forget refresh request
    fn request_render(&self);
    fn notify_now_playing(&self, track: &Track);
    fn show_lyrics(&self, window: &LyricWindow, index: usize);

    /// Key of the menu currently on screen
    fn active_menu_key(&self) -> String;
    /// Song list of the menu on screen, if it lists songs
    fn displayed_tracks(&self) -> Option<Vec<Track>>;
    /// True when moving the selection in `direction` would run off the list
    fn selection_at_edge(&self, direction: Direction) -> bool;
    fn move_selection(&self, direction: Direction);
    /// Brings the song at `index` into view and selects it
    fn locate(&self, index: usize);
    /// Selected song of a playlist detail view, with that playlist's id
    fn intelligence_seed(&self) -> Option<IntelligenceSeed>;
}

/// Mutation a menu may apply when playback runs off its list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaylistChange {
    Append(Vec<Track>),
    Prepend(Vec<Track>),
}

/// The menu whose song list is playing
#[async_trait]
pub trait PlayingMenu: Send + Sync {
    fn menu_key(&self) -> String;

    async fn on_boundary_reached(&self, _direction: Direction) -> Option<PlaylistChange> {
        None
    }
}

/// What the player publishes to the OS media controls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayingInfo {
    pub total: Duration,
    pub passed: Duration,
    pub state: PlaybackState,
}

pub trait MediaControls: Send + Sync {
    fn set_playing_info(&self, info: PlayingInfo);
    fn release(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    LoggedIn,
    NeedLogin,
}

#[async_trait]
pub trait Session: Send + Sync {
    async fn status(&self) -> AuthStatus;
    /// Runs the login flow; true when the session is usable afterwards.
    async fn login(&self) -> bool;
}
