//! OS media-control bridge
//!
//! Publishes the playing info and turns media buttons into player commands.
//! The default bridge only records what it would publish in the log; a
//! platform integration plugs in through the same `MediaControls` trait.

use std::sync::Mutex;

use anyhow::Result;

use crate::model::PlaybackState;
use crate::player::{MediaControls, PlayerHandle, PlayingInfo};

/// Buttons an OS media surface can press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaButton {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
}

/// Forwards a media button to the player.
///
/// `Toggle` needs the current state, which the caller passes in.
pub async fn dispatch(player: &PlayerHandle, button: MediaButton, state: PlaybackState) -> Result<()> {
    tracing::debug!(?button, ?state, "Media button pressed");
    match button {
        MediaButton::Play => player.resume().await,
        MediaButton::Pause => player.pause().await,
        MediaButton::Toggle if state == PlaybackState::Playing => player.pause().await,
        MediaButton::Toggle => player.resume().await,
        MediaButton::Next => player.next().await,
        MediaButton::Previous => player.previous().await,
    }
}

/// Media-control bridge that logs published state
#[derive(Default)]
pub struct LoggingControls {
    last: Mutex<Option<PlayingInfo>>,
}

impl LoggingControls {
    pub fn last_info(&self) -> Option<PlayingInfo> {
        self.last.lock().ok().and_then(|last| *last)
    }
}

impl MediaControls for LoggingControls {
    fn set_playing_info(&self, info: PlayingInfo) {
        tracing::debug!(
            total_ms = info.total.as_millis() as u64,
            passed_ms = info.passed.as_millis() as u64,
            state = ?info.state,
            "Media controls updated"
        );
        if let Ok(mut last) = self.last.lock() {
            *last = Some(info);
        }
    }

    fn release(&self) {
        tracing::debug!("Media controls released");
        if let Ok(mut last) = self.last.lock() {
            *last = None;
        }
    }
}
