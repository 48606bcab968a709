//! Turns a track id into a playable stream

use std::sync::Arc;

use crate::error::{PlaybackError, Result};
use crate::model::{MusicService, StreamFormat};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedStream {
    pub url: String,
    pub format: StreamFormat,
}

/// Single request/response lookup; retrying is the caller's business.
#[derive(Clone)]
pub struct PlaybackResolver {
    service: Arc<dyn MusicService>,
    bitrate: u32,
}

impl PlaybackResolver {
    pub fn new(service: Arc<dyn MusicService>, bitrate: u32) -> Self {
        Self { service, bitrate }
    }

    pub async fn resolve(&self, track_id: i64) -> Result<ResolvedStream> {
        let response = self.service.song_url(track_id, self.bitrate).await?;

        if response.code != 200 {
            return Err(PlaybackError::ResolutionFailure {
                track_id,
                reason: format!("service returned code {}", response.code),
            });
        }

        let Some(entry) = response.data.unwrap_or_default().into_iter().next() else {
            return Err(PlaybackError::ResolutionFailure {
                track_id,
                reason: "no stream candidates".to_string(),
            });
        };

        let url = entry.url.filter(|url| !url.is_empty()).ok_or_else(|| {
            PlaybackError::ResolutionFailure {
                track_id,
                reason: "missing url".to_string(),
            }
        })?;

        let raw_format = entry.format.ok_or_else(|| PlaybackError::ResolutionFailure {
            track_id,
            reason: "missing type".to_string(),
        })?;

        let format = StreamFormat::parse(&raw_format).ok_or_else(|| {
            PlaybackError::UnsupportedFormat {
                track_id,
                format: raw_format.to_lowercase(),
            }
        })?;

        tracing::debug!(track_id, ?format, "Stream resolved");
        Ok(ResolvedStream { url, format })
    }
}
