//! Remote music service: wire types, the service trait, and the HTTP client

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use tokio::sync::RwLock;

use super::types::Track;
use crate::{log_api_request, log_api_result};

/// How the service classified a response code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeType {
    Success,
    NeedLogin,
    Failure,
}

impl CodeType {
    pub fn classify(code: i64) -> Self {
        match code {
            200 => CodeType::Success,
            301 | 302 => CodeType::NeedLogin,
            _ => CodeType::Failure,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SongUrlResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Option<Vec<SongUrlEntry>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SongUrlEntry {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "type", default)]
    pub format: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LyricResponse {
    pub code: i64,
    #[serde(default)]
    pub lrc: Option<LyricBody>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LyricBody {
    #[serde(default)]
    pub lyric: String,
}

impl LyricResponse {
    /// Raw LRC payload, when the service returned a non-empty one.
    pub fn lrc_text(&self) -> Option<&str> {
        if self.code != 200 {
            return None;
        }
        self.lrc
            .as_ref()
            .map(|body| body.lyric.as_str())
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct IntelligenceResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Option<Vec<IntelligenceEntry>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IntelligenceEntry {
    #[serde(rename = "songInfo", default)]
    pub song_info: Option<SongInfo>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SongInfo {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dt: u64,
    #[serde(default)]
    pub ar: Vec<NamedRef>,
    #[serde(default)]
    pub al: Option<NamedRef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
}

impl From<SongInfo> for Track {
    fn from(song: SongInfo) -> Self {
        Track {
            id: song.id,
            name: song.name,
            duration_ms: song.dt,
            artists: song.ar.into_iter().filter_map(|a| a.name).collect(),
            album: song.al.and_then(|al| al.name).unwrap_or_default(),
        }
    }
}

impl IntelligenceResponse {
    /// Recommended tracks in service order, skipping entries without song info.
    pub fn tracks(self) -> Vec<Track> {
        self.data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.song_info)
            .map(Track::from)
            .collect()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlaylistTracksResponse {
    pub code: i64,
    #[serde(default)]
    pub songs: Option<Vec<SongInfo>>,
}

impl PlaylistTracksResponse {
    pub fn tracks(self) -> Vec<Track> {
        self.songs
            .unwrap_or_default()
            .into_iter()
            .map(Track::from)
            .collect()
    }
}

/// The remote endpoints the player depends on
#[async_trait]
pub trait MusicService: Send + Sync {
    async fn song_url(&self, track_id: i64, bitrate: u32) -> Result<SongUrlResponse>;
    async fn lyric(&self, track_id: i64) -> Result<LyricResponse>;
    async fn intelligence_list(&self, song_id: i64, playlist_id: i64) -> Result<IntelligenceResponse>;
    /// One page of a playlist's songs
    async fn playlist_tracks(
        &self,
        playlist_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<PlaylistTracksResponse>;
}

/// HTTP client for a NeteaseCloudMusicApi-compatible server
#[derive(Clone)]
pub struct NeteaseClient {
    http: reqwest::Client,
    base_url: String,
    cookie: Arc<RwLock<Option<String>>>,
}

impl NeteaseClient {
    pub fn new(base_url: impl Into<String>, cookie: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("musicfox-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie: Arc::new(RwLock::new(cookie)),
        })
    }

    pub async fn set_cookie(&self, cookie: Option<String>) {
        *self.cookie.write().await = cookie;
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query);
        if let Some(cookie) = self.cookie.read().await.as_deref() {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        // The service reports failures through the body's `code`, so the
        // HTTP status is not checked here.
        let response = request.send().await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MusicService for NeteaseClient {
    async fn song_url(&self, track_id: i64, bitrate: u32) -> Result<SongUrlResponse> {
        log_api_request!("song_url", track_id, bitrate);
        let result = self
            .get_json(
                "/song/url",
                &[("id", track_id.to_string()), ("br", bitrate.to_string())],
            )
            .await;
        log_api_result!("song_url", result);
        result
    }

    async fn lyric(&self, track_id: i64) -> Result<LyricResponse> {
        log_api_request!("lyric", track_id);
        let result = self.get_json("/lyric", &[("id", track_id.to_string())]).await;
        log_api_result!("lyric", result);
        result
    }

    async fn intelligence_list(&self, song_id: i64, playlist_id: i64) -> Result<IntelligenceResponse> {
        log_api_request!("intelligence_list", song_id, playlist_id);
        let result = self
            .get_json(
                "/playmode/intelligence/list",
                &[
                    ("id", song_id.to_string()),
                    ("pid", playlist_id.to_string()),
                    ("sid", song_id.to_string()),
                ],
            )
            .await;
        log_api_result!("intelligence_list", result);
        result
    }

    async fn playlist_tracks(
        &self,
        playlist_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<PlaylistTracksResponse> {
        log_api_request!("playlist_tracks", playlist_id, offset, limit);
        let result = self
            .get_json(
                "/playlist/track/all",
                &[
                    ("id", playlist_id.to_string()),
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await;
        log_api_result!("playlist_tracks", result);
        result
    }
}
