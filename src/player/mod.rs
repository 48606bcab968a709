//! Player module - playback orchestration
//!
//! - `actor`: the event loop owning playlist, cursor and mode
//! - `transition`: cursor arithmetic per play mode
//! - `resolver`: track id to stream lookup
//! - `context`: interfaces to the UI, menus, media controls and session

mod actor;
mod context;
mod resolver;
mod transition;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};

pub use actor::{
    Collaborators, Command, PlaybackActor, PlayerSettings, INTELLIGENT_MENU_KEY, MAX_ERROR_STREAK,
    STUCK_STREAM_SLACK,
};
pub use context::{
    AuthStatus, MediaControls, PlayingInfo, PlayingMenu, PlaylistChange, Session, UiContext,
};
pub use resolver::{PlaybackResolver, ResolvedStream};

use crate::audio::AudioEvents;
use crate::model::{PlayMode, PlayerStatus, Track};
use actor::Envelope;

/// Sending side of the player.
///
/// Every call waits until the event loop has applied the command, so a
/// caller can never have two commands in flight.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Envelope>,
}

/// Starts the event loop on the runtime and returns its handle.
pub fn spawn(actor: PlaybackActor, events: AudioEvents) -> PlayerHandle {
    let (commands, command_rx) = mpsc::channel(1);
    tokio::spawn(actor.run(command_rx, events));
    PlayerHandle { commands }
}

impl PlayerHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        let (ack, applied) = oneshot::channel();
        self.commands
            .send(Envelope { command, ack })
            .await
            .map_err(|_| anyhow!("player is not running"))?;
        applied
            .await
            .map_err(|_| anyhow!("player stopped before applying the command"))
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(Command::Resume).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(Command::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.send(Command::Previous).await
    }

    pub async fn set_mode(&self, mode: Option<PlayMode>) -> Result<()> {
        self.send(Command::SetMode(mode)).await
    }

    pub async fn intelligent(&self, append: bool) -> Result<()> {
        self.send(Command::Intelligent { append }).await
    }

    pub async fn load_playlist(
        &self,
        tracks: Vec<Track>,
        index: usize,
        menu: Arc<dyn PlayingMenu>,
    ) -> Result<()> {
        self.send(Command::LoadPlaylist {
            tracks,
            index,
            menu,
        })
        .await
    }

    pub async fn status(&self) -> Result<PlayerStatus> {
        let (reply, status) = oneshot::channel();
        self.send(Command::Status(reply)).await?;
        status
            .await
            .map_err(|_| anyhow!("player dropped the status request"))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}
