//! Synchronized lyrics: LRC parsing and the per-track lyric timer

mod lrc;
mod timer;

pub use lrc::{LyricFragment, LyricTrack, LyricWindow, ACTIVE_SLOT, WINDOW_SIZE};
pub use timer::{LyricListener, LyricTimer};
