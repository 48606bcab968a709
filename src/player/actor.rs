//! The playback actor: owns the playlist, cursor and mode, and serializes
//! every mutation through one event loop

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::context::{
    AuthStatus, MediaControls, PlayingInfo, PlayingMenu, PlaylistChange, Session, UiContext,
};
use super::resolver::PlaybackResolver;
use super::transition;
use crate::audio::{AudioEngine, AudioEvents};
use crate::error::PlaybackError;
use crate::lyric::{LyricListener, LyricTimer, LyricTrack, LyricWindow};
use crate::model::{
    CodeType, Direction, MusicService, PlayMode, PlaybackSnapshot, PlaybackState, PlayerStatus,
    SnapshotStore, Track,
};

/// Consecutive start failures after which auto-advance stops
pub const MAX_ERROR_STREAK: u32 = 3;
/// How far past its declared duration a stream may run
pub const STUCK_STREAM_SLACK: Duration = Duration::from_secs(10);
pub const INTELLIGENT_MENU_KEY: &str = "Intelligent";
/// Number of leading tracks compared when matching a displayed list
const PLAYLIST_COMPARE_DEPTH: usize = 20;

/// Commands accepted by the actor
pub enum Command {
    Pause,
    Resume,
    Previous,
    Next,
    /// `None` cycles through the manual modes
    SetMode(Option<PlayMode>),
    Intelligent { append: bool },
    LoadPlaylist {
        tracks: Vec<Track>,
        index: usize,
        menu: Arc<dyn PlayingMenu>,
    },
    Status(oneshot::Sender<PlayerStatus>),
    Shutdown,
}

pub(crate) struct Envelope {
    pub command: Command,
    pub ack: oneshot::Sender<()>,
}

struct LoadedLyric {
    track_id: i64,
    lyrics: LyricTrack,
}

enum StartOutcome {
    Started,
    Retry,
    Halted,
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerSettings {
    pub bitrate: u32,
    pub show_lyric: bool,
}

/// Everything the actor talks to
pub struct Collaborators {
    pub service: Arc<dyn MusicService>,
    pub engine: Box<dyn AudioEngine>,
    pub media: Arc<dyn MediaControls>,
    pub store: Arc<dyn SnapshotStore>,
    pub session: Arc<dyn Session>,
    pub ui: Arc<dyn UiContext>,
}

pub struct PlaybackActor {
    playlist: Vec<Track>,
    cursor: usize,
    current: Option<Track>,
    mode: PlayMode,
    error_streak: u32,
    state: PlaybackState,
    playing_menu_key: String,
    playing_menu: Option<Arc<dyn PlayingMenu>>,
    intelligence_playlist_id: Option<i64>,
    show_lyric: bool,

    resolver: PlaybackResolver,
    service: Arc<dyn MusicService>,
    engine: Box<dyn AudioEngine>,
    media: Arc<dyn MediaControls>,
    store: Arc<dyn SnapshotStore>,
    session: Arc<dyn Session>,
    ui: Arc<dyn UiContext>,
    rng: StdRng,

    lyric_timer: Option<LyricTimer>,
    /// Song the running lyric timer belongs to
    lyric_track_id: Option<i64>,
    lyric_fetch: Option<JoinHandle<()>>,
    lyric_tx: mpsc::UnboundedSender<LoadedLyric>,
    lyric_rx: Option<mpsc::UnboundedReceiver<LoadedLyric>>,
}

impl PlaybackActor {
    pub fn new(parts: Collaborators, settings: PlayerSettings) -> Self {
        let (lyric_tx, lyric_rx) = mpsc::unbounded_channel();
        Self {
            playlist: Vec::new(),
            cursor: 0,
            current: None,
            mode: PlayMode::default(),
            error_streak: 0,
            state: PlaybackState::Stopped,
            playing_menu_key: String::new(),
            playing_menu: None,
            intelligence_playlist_id: None,
            show_lyric: settings.show_lyric,
            resolver: PlaybackResolver::new(parts.service.clone(), settings.bitrate),
            service: parts.service,
            engine: parts.engine,
            media: parts.media,
            store: parts.store,
            session: parts.session,
            ui: parts.ui,
            rng: StdRng::from_entropy(),
            lyric_timer: None,
            lyric_track_id: None,
            lyric_fetch: None,
            lyric_tx,
            lyric_rx: Some(lyric_rx),
        }
    }

    /// Seeds the playlist and mode from persisted records without playing.
    pub fn restore(mut self, snapshot: Option<PlaybackSnapshot>, mode: Option<PlayMode>) -> Self {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        if let Some(snapshot) = snapshot {
            if !snapshot.playlist.is_empty() {
                self.cursor = snapshot.cursor.min(snapshot.playlist.len() - 1);
                self.current = snapshot.playlist.get(self.cursor).cloned();
                self.playlist = snapshot.playlist;
            }
        }
        tracing::info!(
            cursor = self.cursor,
            playlist_len = self.playlist.len(),
            mode = %self.mode,
            "Player state restored"
        );
        self
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            cursor: self.cursor,
            playlist_len: self.playlist.len(),
            current: self.current.clone(),
            passed: self.engine.passed_time(),
            mode: self.mode,
            state: self.state,
            error_streak: self.error_streak,
            playing_menu_key: self.playing_menu_key.clone(),
        }
    }

    /// Runs until a shutdown command arrives or every source is closed.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<Envelope>,
        mut events: AudioEvents,
    ) {
        let Some(mut lyric_rx) = self.lyric_rx.take() else {
            tracing::error!("Player event loop started twice");
            return;
        };
        tracing::info!("Player event loop started");

        loop {
            tokio::select! {
                Some(envelope) = commands.recv() => {
                    let shutdown = self.handle_command(envelope.command).await;
                    let _ = envelope.ack.send(());
                    if shutdown {
                        break;
                    }
                }
                Some(state) = events.states.recv() => self.on_state_change(state).await,
                Some(elapsed) = events.ticks.recv() => self.on_tick(elapsed).await,
                Some(loaded) = lyric_rx.recv() => self.on_lyric_loaded(loaded),
                else => break,
            }
        }

        tracing::info!("Player event loop finished");
    }

    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(),
            Command::Previous => self.advance(Direction::Previous).await,
            Command::Next => self.advance(Direction::Next).await,
            Command::SetMode(mode) => self.set_mode(mode).await,
            Command::Intelligent { append } => self.enter_intelligent_mode(append).await,
            Command::LoadPlaylist {
                tracks,
                index,
                menu,
            } => self.load_playlist(tracks, index, menu).await,
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown => {
                self.shutdown();
                return true;
            }
        }
        false
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Plays `track`; on failure keeps moving in `direction` until a track
    /// starts or the error streak reaches its cap.
    pub async fn start_track(&mut self, track: Track, direction: Direction) {
        if let StartOutcome::Retry = self.try_start(&track).await {
            self.advance(direction).await;
        }
    }

    pub async fn advance(&mut self, direction: Direction) {
        loop {
            if transition::is_boundary(self.cursor, self.playlist.len()) {
                self.on_boundary(direction).await;
            }

            let Some(cursor) = transition::step(
                self.mode,
                direction,
                self.cursor,
                self.playlist.len(),
                &mut self.rng,
            ) else {
                tracing::debug!(?direction, mode = %self.mode, cursor = self.cursor, "Nothing to play");
                return;
            };

            self.cursor = cursor;
            let track = self.playlist[cursor].clone();
            match self.try_start(&track).await {
                StartOutcome::Retry => continue,
                StartOutcome::Started | StartOutcome::Halted => return,
            }
        }
    }

    async fn try_start(&mut self, track: &Track) -> StartOutcome {
        self.persist_snapshot().await;
        self.current = Some(track.clone());
        self.locate_playing_track();

        match self.resolver.resolve(track.id).await {
            Ok(stream) => {
                self.engine.play(stream.format, &stream.url, track.duration());
                self.error_streak = 0;
                if self.show_lyric {
                    self.refresh_lyrics(track.id);
                }
                tracing::info!(
                    track_id = track.id,
                    name = %track.name,
                    artists = %track.artist_line(),
                    album = %track.album,
                    "Now playing"
                );
                self.ui.notify_now_playing(track);
                StartOutcome::Started
            }
            Err(err) => {
                self.engine.pause();
                self.state = PlaybackState::Paused;
                self.error_streak += 1;
                tracing::warn!(
                    track_id = track.id,
                    error = %err,
                    error_streak = self.error_streak,
                    "Track failed to start"
                );
                if self.error_streak >= MAX_ERROR_STREAK {
                    tracing::warn!(track_id = track.id, "Too many consecutive failures, playback halted");
                    StartOutcome::Halted
                } else {
                    StartOutcome::Retry
                }
            }
        }
    }

    async fn on_boundary(&mut self, direction: Direction) {
        if self.mode == PlayMode::Intelligent {
            self.extend_intelligent().await;
        }

        if self.in_playing_menu() {
            // The menu grows before the selection steps into it.
            if self.ui.selection_at_edge(direction) {
                self.consult_playing_menu(direction).await;
            }
            self.ui.move_selection(direction);
        } else {
            self.consult_playing_menu(direction).await;
        }
    }

    async fn consult_playing_menu(&mut self, direction: Direction) {
        let Some(menu) = self.playing_menu.clone() else {
            return;
        };
        if let Some(change) = menu.on_boundary_reached(direction).await {
            self.apply_change(change);
        }
    }

    fn apply_change(&mut self, change: PlaylistChange) {
        match change {
            PlaylistChange::Append(tracks) => {
                tracing::debug!(count = tracks.len(), "Menu appended tracks");
                self.playlist.extend(tracks);
            }
            PlaylistChange::Prepend(tracks) => {
                tracing::debug!(count = tracks.len(), "Menu prepended tracks");
                let was_empty = self.playlist.is_empty();
                let added = tracks.len();
                self.playlist.splice(0..0, tracks);
                if !was_empty {
                    self.cursor += added;
                }
            }
        }
    }

    pub async fn load_playlist(&mut self, tracks: Vec<Track>, index: usize, menu: Arc<dyn PlayingMenu>) {
        if tracks.is_empty() {
            tracing::debug!("Ignoring empty playlist");
            return;
        }
        self.cursor = index.min(tracks.len() - 1);
        self.playlist = tracks;
        self.playing_menu_key = menu.menu_key();
        self.playing_menu = Some(menu);
        tracing::info!(
            menu = %self.playing_menu_key,
            cursor = self.cursor,
            playlist_len = self.playlist.len(),
            "Playlist loaded"
        );

        let track = self.playlist[self.cursor].clone();
        self.start_track(track, Direction::Next).await;
    }

    // ========================================================================
    // Play mode
    // ========================================================================

    pub async fn set_mode(&mut self, mode: Option<PlayMode>) {
        self.mode = mode.unwrap_or_else(|| self.mode.cycle());
        tracing::info!(mode = %self.mode, "Play mode changed");
        if let Err(e) = self.store.save_play_mode(self.mode).await {
            tracing::warn!(error = %e, "Failed to persist play mode");
        }
        self.ui.request_render();
    }

    pub async fn enter_intelligent_mode(&mut self, append: bool) {
        let Some(seed) = self.ui.intelligence_seed() else {
            tracing::debug!("Intelligent mode needs a selected song in a playlist");
            return;
        };

        if self.session.status().await == AuthStatus::NeedLogin && !self.login().await {
            return;
        }

        let Some(recommended) = self.fetch_recommendations(seed.track.id, seed.playlist_id).await else {
            return;
        };

        if append {
            self.playlist.extend(recommended);
            self.cursor += 1;
        } else {
            let mut playlist = Vec::with_capacity(recommended.len() + 1);
            playlist.push(seed.track.clone());
            playlist.extend(recommended);
            self.playlist = playlist;
            self.cursor = 0;
        }

        if self.cursor >= self.playlist.len() {
            tracing::debug!(cursor = self.cursor, "No recommended track to play");
            self.cursor = self.playlist.len().saturating_sub(1);
            return;
        }

        self.intelligence_playlist_id = Some(seed.playlist_id);
        self.playing_menu_key = INTELLIGENT_MENU_KEY.to_string();
        self.playing_menu = None;
        self.set_mode(Some(PlayMode::Intelligent)).await;

        let track = self.playlist[self.cursor].clone();
        self.start_track(track, Direction::Next).await;
    }

    /// Appends recommendations seeded by the playing track and the playlist
    /// intelligent mode was entered from, whatever menu is on screen.
    async fn extend_intelligent(&mut self) {
        let (Some(track), Some(playlist_id)) = (self.current.as_ref(), self.intelligence_playlist_id)
        else {
            tracing::debug!("No recommendation seed, playlist not extended");
            return;
        };
        let song_id = track.id;

        if let Some(recommended) = self.fetch_recommendations(song_id, playlist_id).await {
            tracing::debug!(count = recommended.len(), "Intelligent playlist extended");
            self.playlist.extend(recommended);
        }
    }

    /// Asks the recommendation service, logging in and retrying once when
    /// the session has expired.
    async fn fetch_recommendations(&self, song_id: i64, playlist_id: i64) -> Option<Vec<Track>> {
        let mut retried = false;
        loop {
            let response = match self.service.intelligence_list(song_id, playlist_id).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(error = %e, song_id, playlist_id, "Recommendation request failed");
                    return None;
                }
            };

            match CodeType::classify(response.code) {
                CodeType::Success => return Some(response.tracks()),
                CodeType::NeedLogin if !retried => {
                    if !self.login().await {
                        return None;
                    }
                    retried = true;
                }
                CodeType::NeedLogin | CodeType::Failure => {
                    let err = PlaybackError::RecommendationFailure {
                        code: response.code,
                    };
                    tracing::debug!(error = %err, song_id, playlist_id, "Recommendations unavailable");
                    return None;
                }
            }
        }
    }

    async fn login(&self) -> bool {
        tracing::info!(error = %PlaybackError::AuthRequired, "Starting login flow");
        let ok = self.session.login().await;
        if !ok {
            tracing::info!("Login did not complete");
        }
        ok
    }

    // ========================================================================
    // Engine events
    // ========================================================================

    pub async fn on_state_change(&mut self, state: PlaybackState) {
        tracing::debug!(?state, "Engine state changed");
        self.state = state;
        self.media.set_playing_info(PlayingInfo {
            total: self.current.as_ref().map(Track::duration).unwrap_or_default(),
            passed: self.engine.passed_time(),
            state,
        });

        if state == PlaybackState::Stopped {
            self.advance(Direction::Next).await;
        }
        self.ui.request_render();
    }

    pub async fn on_tick(&mut self, elapsed: Duration) {
        if let Some(track) = &self.current {
            let declared = track.duration();
            if elapsed > declared + STUCK_STREAM_SLACK {
                let err = PlaybackError::StuckStream { elapsed, declared };
                tracing::warn!(track_id = track.id, error = %err, "Skipping stuck stream");
                self.advance(Direction::Next).await;
                return;
            }
        }

        if let Some(timer) = &self.lyric_timer {
            if !timer.try_feed(elapsed) {
                tracing::trace!(?elapsed, "Lyric timer busy, tick dropped");
            }
        }
        self.ui.request_render();
    }

    // ========================================================================
    // Lyrics
    // ========================================================================

    /// Restarts the running timer when the same song plays again, otherwise
    /// replaces it with a fetch for the new song.
    fn refresh_lyrics(&mut self, track_id: i64) {
        if let Some(timer) = &self.lyric_timer {
            if self.lyric_track_id == Some(track_id) {
                tracing::trace!(track_id, "Restarting lyric timer");
                timer.restart();
                return;
            }
        }
        self.spawn_lyric_fetch(track_id);
    }

    fn spawn_lyric_fetch(&mut self, track_id: i64) {
        if let Some(previous) = self.lyric_fetch.take() {
            previous.abort();
        }
        if let Some(previous) = self.lyric_timer.take() {
            previous.stop();
        }
        self.lyric_track_id = None;
        self.ui.show_lyrics(&LyricWindow::default(), 0);

        let service = self.service.clone();
        let tx = self.lyric_tx.clone();
        self.lyric_fetch = Some(tokio::spawn(async move {
            let lyrics = match service.lyric(track_id).await {
                Ok(response) => response
                    .lrc_text()
                    .map(LyricTrack::parse)
                    .filter(|track| !track.is_empty())
                    .unwrap_or_else(LyricTrack::placeholder),
                Err(e) => {
                    tracing::debug!(track_id, error = %e, "Lyric request failed, using placeholder");
                    LyricTrack::placeholder()
                }
            };
            let _ = tx.send(LoadedLyric { track_id, lyrics });
        }));
    }

    fn on_lyric_loaded(&mut self, loaded: LoadedLyric) {
        if self.current.as_ref().map(|t| t.id) != Some(loaded.track_id) {
            tracing::trace!(track_id = loaded.track_id, "Dropping lyrics of a previous track");
            return;
        }

        if let Some(previous) = self.lyric_timer.take() {
            previous.stop();
        }

        let ui = self.ui.clone();
        let listener: LyricListener = Arc::new(move |window: &LyricWindow, index: usize| {
            ui.show_lyrics(window, index);
            ui.request_render();
        });
        tracing::debug!(track_id = loaded.track_id, lines = loaded.lyrics.len(), "Lyric timer started");
        self.lyric_timer = Some(LyricTimer::start(loaded.lyrics, listener));
        self.lyric_track_id = Some(loaded.track_id);
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn persist_snapshot(&self) {
        let snapshot = PlaybackSnapshot {
            cursor: self.cursor,
            playlist: self.playlist.clone(),
        };
        if let Err(e) = self.store.save_snapshot(&snapshot).await {
            tracing::warn!(error = %e, "Failed to persist playback snapshot");
        }
    }

    /// True when the UI shows the menu this playlist came from, listing the
    /// same songs.
    fn in_playing_menu(&self) -> bool {
        if self.ui.active_menu_key() != self.playing_menu_key {
            return false;
        }
        let Some(displayed) = self.ui.displayed_tracks() else {
            return false;
        };
        displayed.len() == self.playlist.len()
            && displayed
                .iter()
                .zip(&self.playlist)
                .take(PLAYLIST_COMPARE_DEPTH)
                .all(|(a, b)| a.id == b.id)
    }

    fn locate_playing_track(&self) {
        if self.in_playing_menu() {
            self.ui.locate(self.cursor);
        }
    }

    fn shutdown(&mut self) {
        tracing::info!("Shutting down player");
        self.media.release();
        if let Some(fetch) = self.lyric_fetch.take() {
            fetch.abort();
        }
        if let Some(timer) = self.lyric_timer.take() {
            timer.stop();
        }
        self.engine.close();
    }

    #[cfg(test)]
    pub(crate) fn seed_for_test(&mut self, playlist: Vec<Track>, cursor: usize, mode: PlayMode) {
        self.current = playlist.get(cursor).cloned();
        self.playlist = playlist;
        self.cursor = cursor;
        self.mode = mode;
    }

    #[cfg(test)]
    pub(crate) fn set_intelligence_playlist(&mut self, playlist_id: i64) {
        self.intelligence_playlist_id = Some(playlist_id);
    }

    #[cfg(test)]
    pub(crate) fn install_lyric_timer(&mut self, timer: LyricTimer) {
        self.lyric_timer = Some(timer);
    }

    #[cfg(test)]
    pub(crate) fn set_playing_menu(&mut self, menu: Arc<dyn PlayingMenu>) {
        self.playing_menu_key = menu.menu_key();
        self.playing_menu = Some(menu);
    }
}
