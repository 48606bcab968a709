//! Keyed persistence for the playback snapshot and play mode

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::types::{PlayMode, PlaybackSnapshot};

const SNAPSHOT_KEY: &str = "player_snapshot";
const PLAY_MODE_KEY: &str = "play_mode";

/// Storage for state that must survive a restart
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save_snapshot(&self, snapshot: &PlaybackSnapshot) -> Result<()>;
    async fn save_play_mode(&self, mode: PlayMode) -> Result<()>;
    async fn load_snapshot(&self) -> Result<Option<PlaybackSnapshot>>;
    async fn load_play_mode(&self) -> Result<Option<PlayMode>>;
}

#[derive(Serialize, Deserialize)]
struct Record<T> {
    saved_at: DateTime<Utc>,
    value: T,
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        if !self.dir.exists() {
            tokio::fs::create_dir_all(&self.dir).await?;
        }
        let record = Record {
            saved_at: Utc::now(),
            value,
        };
        let content = serde_json::to_string(&record)?;
        tokio::fs::write(self.path_for(key), content).await?;
        tracing::trace!(key, "Record persisted");
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        if !Path::new(&path).exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let record: Record<T> = serde_json::from_str(&content)?;
        tracing::debug!(key, saved_at = %record.saved_at, "Record loaded");
        Ok(Some(record.value))
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn save_snapshot(&self, snapshot: &PlaybackSnapshot) -> Result<()> {
        self.write(SNAPSHOT_KEY, snapshot).await
    }

    async fn save_play_mode(&self, mode: PlayMode) -> Result<()> {
        self.write(PLAY_MODE_KEY, &mode).await
    }

    async fn load_snapshot(&self) -> Result<Option<PlaybackSnapshot>> {
        self.read(SNAPSHOT_KEY).await
    }

    async fn load_play_mode(&self) -> Result<Option<PlayMode>> {
        self.read(PLAY_MODE_KEY).await
    }
}
