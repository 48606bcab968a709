//! Playback control methods

use anyhow::Result;

use super::AppController;
use crate::media_control::{self, MediaButton};

impl AppController {
    /// Same path as an OS media button.
    pub async fn press(&self, button: MediaButton) -> Result<()> {
        let state = self.player.status().await?.state;
        media_control::dispatch(&self.player, button, state).await
    }

    /// Hands the list on screen to the player, starting at the selection.
    pub async fn play_selected(&self) -> Result<()> {
        let screen = self.ui.snapshot();
        if screen.tracks.is_empty() {
            tracing::debug!("Nothing selected to play");
            return Ok(());
        }

        tracing::info!(
            menu = %screen.menu_key,
            selected = screen.selected,
            count = screen.tracks.len(),
            "Playing selection"
        );
        self.player
            .load_playlist(screen.tracks, screen.selected, self.menu.clone())
            .await
    }

    pub async fn cycle_mode(&self) -> Result<()> {
        self.player.set_mode(None).await
    }

    pub async fn start_intelligent(&self, append: bool) -> Result<()> {
        tracing::debug!(append, "Starting intelligent mode");
        self.player.intelligent(append).await
    }
}
