//! In-memory collaborators for player tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use super::actor::{Collaborators, PlaybackActor, PlayerSettings};
use super::context::{
    AuthStatus, MediaControls, PlayingInfo, PlayingMenu, PlaylistChange, Session, UiContext,
};
use crate::audio::{AudioEngine, AudioEvents};
use crate::lyric::LyricWindow;
use crate::model::{
    Direction, IntelligenceResponse, IntelligenceSeed, LyricResponse, MusicService, PlayMode,
    PlaybackSnapshot, PlaybackState, PlaylistTracksResponse, SnapshotStore, SongUrlEntry,
    SongUrlResponse, StreamFormat, Track,
};

pub fn track(id: i64, secs: u64) -> Track {
    Track {
        id,
        name: format!("song {id}"),
        duration_ms: secs * 1000,
        artists: vec![format!("artist {id}")],
        album: format!("album {id}"),
    }
}

/// A track encoded the way the service sends song info.
fn song_json(t: &Track) -> serde_json::Value {
    json!({
        "id": t.id,
        "name": t.name,
        "dt": t.duration_ms,
        "ar": t.artists.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
        "al": { "name": t.album },
    })
}

/// Builds a recommendation payload the way the service encodes it.
pub fn intelligence_response(code: i64, tracks: &[Track]) -> IntelligenceResponse {
    let data: Vec<_> = tracks
        .iter()
        .map(|t| json!({ "songInfo": song_json(t) }))
        .collect();
    serde_json::from_value(json!({ "code": code, "data": data }))
        .expect("recommendation payload is well formed")
}

// ============================================================================
// Music service
// ============================================================================

enum SongOutcome {
    Response(SongUrlResponse),
    Transport,
}

#[derive(Default)]
struct ServiceState {
    songs: HashMap<i64, SongOutcome>,
    lyrics: HashMap<i64, String>,
    recommendations: VecDeque<IntelligenceResponse>,
    playlists: HashMap<i64, Vec<Track>>,
    song_requests: Vec<(i64, u32)>,
    intelligence_requests: Vec<(i64, i64)>,
}

/// Songs resolve to `http://cdn/{id}.mp3` unless configured otherwise.
#[derive(Clone, Default)]
pub struct FakeService {
    state: Arc<Mutex<ServiceState>>,
}

impl FakeService {
    pub fn set_song(&self, id: i64, code: i64, url: Option<&str>, format: Option<&str>) {
        let response = SongUrlResponse {
            code,
            data: Some(vec![SongUrlEntry {
                url: url.map(str::to_string),
                format: format.map(str::to_string),
            }]),
        };
        self.lock().songs.insert(id, SongOutcome::Response(response));
    }

    pub fn set_empty_song(&self, id: i64) {
        let response = SongUrlResponse {
            code: 200,
            data: Some(Vec::new()),
        };
        self.lock().songs.insert(id, SongOutcome::Response(response));
    }

    pub fn fail_transport(&self, id: i64) {
        self.lock().songs.insert(id, SongOutcome::Transport);
    }

    pub fn set_lyric(&self, id: i64, lrc: &str) {
        self.lock().lyrics.insert(id, lrc.to_string());
    }

    /// Queues one recommendation response; an empty queue answers 200 with no songs.
    pub fn push_recommendations(&self, response: IntelligenceResponse) {
        self.lock().recommendations.push_back(response);
    }

    pub fn set_playlist(&self, id: i64, tracks: Vec<Track>) {
        self.lock().playlists.insert(id, tracks);
    }

    pub fn requested_bitrates(&self) -> Vec<u32> {
        self.lock().song_requests.iter().map(|(_, b)| *b).collect()
    }

    pub fn requested_songs(&self) -> Vec<i64> {
        self.lock().song_requests.iter().map(|(id, _)| *id).collect()
    }

    pub fn intelligence_requests(&self) -> Vec<(i64, i64)> {
        self.lock().intelligence_requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServiceState> {
        self.state.lock().expect("service state poisoned")
    }
}

#[async_trait]
impl MusicService for FakeService {
    async fn song_url(&self, track_id: i64, bitrate: u32) -> Result<SongUrlResponse> {
        let mut state = self.lock();
        state.song_requests.push((track_id, bitrate));
        match state.songs.get(&track_id) {
            Some(SongOutcome::Response(response)) => Ok(response.clone()),
            Some(SongOutcome::Transport) => Err(anyhow!("connection reset")),
            None => Ok(SongUrlResponse {
                code: 200,
                data: Some(vec![SongUrlEntry {
                    url: Some(format!("http://cdn/{track_id}.mp3")),
                    format: Some("mp3".to_string()),
                }]),
            }),
        }
    }

    async fn lyric(&self, track_id: i64) -> Result<LyricResponse> {
        let lrc = self.lock().lyrics.get(&track_id).cloned();
        let body = json!({ "code": 200, "lrc": lrc.map(|lyric| json!({ "lyric": lyric })) });
        Ok(serde_json::from_value(body)?)
    }

    async fn intelligence_list(&self, song_id: i64, playlist_id: i64) -> Result<IntelligenceResponse> {
        let mut state = self.lock();
        state.intelligence_requests.push((song_id, playlist_id));
        Ok(state
            .recommendations
            .pop_front()
            .unwrap_or_else(|| intelligence_response(200, &[])))
    }

    async fn playlist_tracks(
        &self,
        playlist_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<PlaylistTracksResponse> {
        let Some(tracks) = self.lock().playlists.get(&playlist_id).cloned() else {
            return Ok(PlaylistTracksResponse {
                code: 404,
                songs: None,
            });
        };
        let songs: Vec<_> = tracks.iter().skip(offset).take(limit).map(song_json).collect();
        Ok(serde_json::from_value(json!({ "code": 200, "songs": songs }))?)
    }
}

// ============================================================================
// Audio engine
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    Play {
        url: String,
        format: StreamFormat,
        duration: Duration,
    },
    Pause,
    Resume,
    Close,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("engine log poisoned").clone()
    }

    pub fn played_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Play { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().expect("engine log poisoned").push(call);
    }
}

impl AudioEngine for FakeEngine {
    fn play(&mut self, format: StreamFormat, url: &str, duration: Duration) {
        self.record(EngineCall::Play {
            url: url.to_string(),
            format,
            duration,
        });
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
    }

    fn resume(&mut self) {
        self.record(EngineCall::Resume);
    }

    fn close(&mut self) {
        self.record(EngineCall::Close);
    }

    fn passed_time(&self) -> Duration {
        Duration::from_secs(1)
    }
}

// ============================================================================
// Presentation layer
// ============================================================================

#[derive(Default)]
struct UiState {
    active_menu_key: String,
    displayed: Option<Vec<Track>>,
    seed: Option<IntelligenceSeed>,
    now_playing: Vec<i64>,
    lyrics: Vec<(LyricWindow, usize)>,
    moves: Vec<Direction>,
    locates: Vec<usize>,
    at_edge: bool,
}

#[derive(Default)]
pub struct FakeUi {
    state: Mutex<UiState>,
    renders: AtomicUsize,
}

impl FakeUi {
    pub fn show_menu(&self, key: &str, tracks: Option<Vec<Track>>) {
        let mut state = self.lock();
        state.active_menu_key = key.to_string();
        state.displayed = tracks;
    }

    pub fn set_at_edge(&self, at_edge: bool) {
        self.lock().at_edge = at_edge;
    }

    pub fn select_seed(&self, track: Track, playlist_id: i64) {
        self.lock().seed = Some(IntelligenceSeed { track, playlist_id });
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn now_playing(&self) -> Vec<i64> {
        self.lock().now_playing.clone()
    }

    pub fn lyrics(&self) -> Vec<(LyricWindow, usize)> {
        self.lock().lyrics.clone()
    }

    pub fn moves(&self) -> Vec<Direction> {
        self.lock().moves.clone()
    }

    pub fn locates(&self) -> Vec<usize> {
        self.lock().locates.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, UiState> {
        self.state.lock().expect("ui state poisoned")
    }
}

impl UiContext for FakeUi {
    fn request_render(&self) {
        self.renders.fetch_add(1, Ordering::SeqCst);
    }

    fn notify_now_playing(&self, track: &Track) {
        self.lock().now_playing.push(track.id);
    }

    fn show_lyrics(&self, window: &LyricWindow, index: usize) {
        self.lock().lyrics.push((window.clone(), index));
    }

    fn active_menu_key(&self) -> String {
        self.lock().active_menu_key.clone()
    }

    fn displayed_tracks(&self) -> Option<Vec<Track>> {
        self.lock().displayed.clone()
    }

    fn selection_at_edge(&self, _direction: Direction) -> bool {
        self.lock().at_edge
    }

    fn move_selection(&self, direction: Direction) {
        self.lock().moves.push(direction);
    }

    fn locate(&self, index: usize) {
        self.lock().locates.push(index);
    }

    fn intelligence_seed(&self) -> Option<IntelligenceSeed> {
        self.lock().seed.clone()
    }
}

// ============================================================================
// Media controls, store, session, menu
// ============================================================================

#[derive(Default)]
pub struct FakeMedia {
    infos: Mutex<Vec<PlayingInfo>>,
    released: AtomicBool,
}

impl FakeMedia {
    pub fn infos(&self) -> Vec<PlayingInfo> {
        self.infos.lock().expect("media log poisoned").clone()
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl MediaControls for FakeMedia {
    fn set_playing_info(&self, info: PlayingInfo) {
        self.infos.lock().expect("media log poisoned").push(info);
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    snapshots: Mutex<Vec<PlaybackSnapshot>>,
    modes: Mutex<Vec<PlayMode>>,
}

impl MemoryStore {
    pub fn snapshots(&self) -> Vec<PlaybackSnapshot> {
        self.snapshots.lock().expect("store poisoned").clone()
    }

    pub fn modes(&self) -> Vec<PlayMode> {
        self.modes.lock().expect("store poisoned").clone()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn save_snapshot(&self, snapshot: &PlaybackSnapshot) -> Result<()> {
        self.snapshots.lock().expect("store poisoned").push(snapshot.clone());
        Ok(())
    }

    async fn save_play_mode(&self, mode: PlayMode) -> Result<()> {
        self.modes.lock().expect("store poisoned").push(mode);
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<PlaybackSnapshot>> {
        Ok(self.snapshots().pop())
    }

    async fn load_play_mode(&self) -> Result<Option<PlayMode>> {
        Ok(self.modes().pop())
    }
}

/// Logged in by default; `login` succeeds according to `login_succeeds`.
pub struct FakeSession {
    logged_in: AtomicBool,
    login_succeeds: AtomicBool,
    logins: AtomicUsize,
}

impl Default for FakeSession {
    fn default() -> Self {
        Self {
            logged_in: AtomicBool::new(true),
            login_succeeds: AtomicBool::new(true),
            logins: AtomicUsize::new(0),
        }
    }
}

impl FakeSession {
    pub fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.store(logged_in, Ordering::SeqCst);
    }

    pub fn set_login_succeeds(&self, succeeds: bool) {
        self.login_succeeds.store(succeeds, Ordering::SeqCst);
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn status(&self) -> AuthStatus {
        if self.logged_in.load(Ordering::SeqCst) {
            AuthStatus::LoggedIn
        } else {
            AuthStatus::NeedLogin
        }
    }

    async fn login(&self) -> bool {
        self.logins.fetch_add(1, Ordering::SeqCst);
        let ok = self.login_succeeds.load(Ordering::SeqCst);
        if ok {
            self.logged_in.store(true, Ordering::SeqCst);
        }
        ok
    }
}

/// Menu answering the first boundary with a preset change.
pub struct FakeMenu {
    key: String,
    change: Mutex<Option<PlaylistChange>>,
    calls: Mutex<Vec<Direction>>,
}

impl FakeMenu {
    pub fn new(key: &str, change: Option<PlaylistChange>) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            change: Mutex::new(change),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Direction> {
        self.calls.lock().expect("menu log poisoned").clone()
    }
}

#[async_trait]
impl PlayingMenu for FakeMenu {
    fn menu_key(&self) -> String {
        self.key.clone()
    }

    async fn on_boundary_reached(&self, direction: Direction) -> Option<PlaylistChange> {
        self.calls.lock().expect("menu log poisoned").push(direction);
        self.change.lock().expect("menu log poisoned").take()
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Shared handles on every fake an actor is built from.
#[derive(Clone, Default)]
pub struct Harness {
    pub service: FakeService,
    pub engine: FakeEngine,
    pub ui: Arc<FakeUi>,
    pub media: Arc<FakeMedia>,
    pub store: Arc<MemoryStore>,
    pub session: Arc<FakeSession>,
}

pub const QUIET: PlayerSettings = PlayerSettings {
    bitrate: 320_000,
    show_lyric: false,
};

pub const WITH_LYRICS: PlayerSettings = PlayerSettings {
    bitrate: 320_000,
    show_lyric: true,
};

impl Harness {
    pub fn actor(&self, settings: PlayerSettings) -> PlaybackActor {
        self.actor_with_ui(settings, self.ui.clone())
    }

    /// Same fakes, but the player talks to `ui` instead of the fake UI.
    pub fn actor_with_ui(&self, settings: PlayerSettings, ui: Arc<dyn UiContext>) -> PlaybackActor {
        PlaybackActor::new(
            Collaborators {
                service: Arc::new(self.service.clone()),
                engine: Box::new(self.engine.clone()),
                media: self.media.clone(),
                store: self.store.clone(),
                session: self.session.clone(),
                ui,
            },
            settings,
        )
    }

    /// Engine event channels fed by the test instead of an engine.
    pub fn events() -> (
        mpsc::UnboundedSender<PlaybackState>,
        mpsc::UnboundedSender<Duration>,
        AudioEvents,
    ) {
        let (state_tx, states) = mpsc::unbounded_channel();
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        (state_tx, tick_tx, AudioEvents { states, ticks })
    }
}
