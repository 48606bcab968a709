//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `screen`: Screen state shared with the player (`TerminalUi`)
//! - `utils`: Shared utility functions (formatting, scrollable lists)
//! - `content`: Track list of the menu on screen
//! - `lyrics`: Lyric window
//! - `progress`: Progress bar rendering

mod content;
mod lyrics;
mod progress;
mod screen;
mod utils;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub use screen::{ScreenState, TerminalUi};

use crate::lyric::WINDOW_SIZE;
use crate::model::PlayerStatus;

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, screen: &ScreenState, status: &PlayerStatus, show_lyric: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // Track list
                Constraint::Length(3), // Progress bar with playback info
            ])
            .split(frame.area());

        let playing_id = status.current.as_ref().map(|track| track.id);

        if show_lyric {
            let main_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(0),
                    Constraint::Length(WINDOW_SIZE as u16 + 2),
                ])
                .split(chunks[0]);
            content::render_track_list(frame, main_chunks[0], screen, playing_id);
            lyrics::render_lyrics(frame, main_chunks[1], &screen.lyrics);
        } else {
            content::render_track_list(frame, chunks[0], screen, playing_id);
        }

        progress::render_progress_bar(frame, chunks[1], status);
    }
}
