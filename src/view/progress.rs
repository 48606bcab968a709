//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use super::utils::format_duration;
use crate::model::{PlaybackState, PlayerStatus};

pub fn render_progress_bar(frame: &mut Frame, area: Rect, status: &PlayerStatus) {
    let status_text = match (&status.current, status.state) {
        (None, _) => " No track playing".to_string(),
        (Some(track), PlaybackState::Playing) => {
            format!(" ▶ {} | {} ({})", track.name, track.artist_line(), track.album)
        }
        (Some(track), _) => {
            format!(" ⏸ {} | {} ({})", track.name, track.artist_line(), track.album)
        }
    };

    let total = status
        .current
        .as_ref()
        .map(|track| track.duration())
        .unwrap_or_default();
    let time_str = format!("{} / {}", format_duration(status.passed), format_duration(total));

    let progress_ratio = if total.is_zero() {
        0.0
    } else {
        (status.passed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
    };

    let mut controls_info = format!(" Mode: {} | {}/{} ", status.mode, status.cursor + 1, status.playlist_len);
    if status.error_streak > 0 {
        controls_info.push_str(&format!("| Failed: {} ", status.error_streak));
    }

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
