//! Menus whose song lists can be handed to the player

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::model::{Direction, MusicService, Track};
use crate::player::{PlayingMenu, PlaylistChange};
use crate::view::TerminalUi;

pub const RESTORED_MENU_KEY: &str = "restored";

/// Menu with a fixed song list, such as the restored playlist
pub struct StaticMenu {
    key: String,
}

impl StaticMenu {
    pub fn new(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { key: key.into() })
    }
}

#[async_trait]
impl PlayingMenu for StaticMenu {
    fn menu_key(&self) -> String {
        self.key.clone()
    }
}

#[derive(Default)]
struct PageCursor {
    offset: usize,
    exhausted: bool,
}

/// Playlist detail view loaded page by page.
///
/// When playback runs off the end of the loaded songs the next page is
/// appended to both the player and the screen.
pub struct PlaylistMenu {
    playlist_id: i64,
    page_size: usize,
    service: Arc<dyn MusicService>,
    ui: Arc<TerminalUi>,
    cursor: Mutex<PageCursor>,
}

impl PlaylistMenu {
    pub fn new(
        playlist_id: i64,
        page_size: usize,
        service: Arc<dyn MusicService>,
        ui: Arc<TerminalUi>,
    ) -> Arc<Self> {
        Arc::new(Self {
            playlist_id,
            page_size,
            service,
            ui,
            cursor: Mutex::new(PageCursor::default()),
        })
    }

    pub fn key_for(playlist_id: i64) -> String {
        format!("playlist:{playlist_id}")
    }

    /// Fetches the page after the last one loaded; empty once the playlist
    /// is exhausted.
    pub async fn next_page(&self) -> Result<Vec<Track>> {
        let mut cursor = self.cursor.lock().await;
        if cursor.exhausted {
            return Ok(Vec::new());
        }

        let response = self
            .service
            .playlist_tracks(self.playlist_id, cursor.offset, self.page_size)
            .await?;
        if response.code != 200 {
            bail!("playlist {} returned code {}", self.playlist_id, response.code);
        }

        let tracks = response.tracks();
        cursor.offset += tracks.len();
        cursor.exhausted = tracks.len() < self.page_size;
        tracing::debug!(
            playlist_id = self.playlist_id,
            count = tracks.len(),
            offset = cursor.offset,
            exhausted = cursor.exhausted,
            "Playlist page loaded"
        );
        Ok(tracks)
    }
}

#[async_trait]
impl PlayingMenu for PlaylistMenu {
    fn menu_key(&self) -> String {
        Self::key_for(self.playlist_id)
    }

    async fn on_boundary_reached(&self, direction: Direction) -> Option<PlaylistChange> {
        if direction != Direction::Next {
            return None;
        }
        match self.next_page().await {
            Ok(tracks) if tracks.is_empty() => None,
            Ok(tracks) => {
                self.ui.extend_menu(&self.menu_key(), &tracks);
                Some(PlaylistChange::Append(tracks))
            }
            Err(e) => {
                tracing::warn!(playlist_id = self.playlist_id, error = %e, "Failed to load next playlist page");
                None
            }
        }
    }
}
