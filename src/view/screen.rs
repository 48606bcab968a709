//! Screen state the player writes into and the renderer reads from

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::lyric::LyricWindow;
use crate::model::{Direction, IntelligenceSeed, Track};
use crate::player::UiContext;

#[derive(Clone, Debug, Default)]
pub struct ScreenState {
    pub menu_key: String,
    pub menu_title: String,
    /// Set when the menu is a playlist detail view
    pub playlist_id: Option<i64>,
    pub tracks: Vec<Track>,
    pub selected: usize,
    pub now_playing: Option<Track>,
    pub lyrics: LyricWindow,
}

/// `UiContext` backed by a shared `ScreenState`.
///
/// Render requests are coalesced into a single pending wake-up.
#[derive(Default)]
pub struct TerminalUi {
    state: Mutex<ScreenState>,
    render: Notify,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_menu(&self, key: &str, title: &str, playlist_id: Option<i64>, tracks: Vec<Track>) {
        {
            let mut state = self.lock();
            state.menu_key = key.to_string();
            state.menu_title = title.to_string();
            state.playlist_id = playlist_id;
            state.tracks = tracks;
            state.selected = 0;
        }
        self.request_render();
    }

    /// Adds tracks below the list, keeping the selection.
    pub fn extend_menu(&self, key: &str, tracks: &[Track]) {
        {
            let mut state = self.lock();
            if state.menu_key != key {
                return;
            }
            state.tracks.extend_from_slice(tracks);
        }
        self.request_render();
    }

    pub fn snapshot(&self) -> ScreenState {
        self.lock().clone()
    }

    /// Resolves once a render was requested since the last call.
    pub async fn render_requested(&self) {
        self.render.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, ScreenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UiContext for TerminalUi {
    fn request_render(&self) {
        self.render.notify_one();
    }

    fn notify_now_playing(&self, track: &Track) {
        self.lock().now_playing = Some(track.clone());
        self.request_render();
    }

    fn show_lyrics(&self, window: &LyricWindow, _index: usize) {
        self.lock().lyrics = window.clone();
    }

    fn active_menu_key(&self) -> String {
        self.lock().menu_key.clone()
    }

    fn displayed_tracks(&self) -> Option<Vec<Track>> {
        let state = self.lock();
        (!state.tracks.is_empty()).then(|| state.tracks.clone())
    }

    fn selection_at_edge(&self, direction: Direction) -> bool {
        let state = self.lock();
        match direction {
            Direction::Next => state.selected + 1 >= state.tracks.len(),
            Direction::Previous => state.selected == 0,
        }
    }

    fn move_selection(&self, direction: Direction) {
        let mut state = self.lock();
        let len = state.tracks.len();
        if len == 0 {
            return;
        }
        state.selected = match direction {
            Direction::Next => (state.selected + 1) % len,
            Direction::Previous => (state.selected + len - 1) % len,
        };
    }

    fn locate(&self, index: usize) {
        let mut state = self.lock();
        if index < state.tracks.len() {
            state.selected = index;
        }
    }

    fn intelligence_seed(&self) -> Option<IntelligenceSeed> {
        let state = self.lock();
        let playlist_id = state.playlist_id?;
        let track = state.tracks.get(state.selected)?.clone();
        Some(IntelligenceSeed { track, playlist_id })
    }
}
