//! Lyric window rendering

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::lyric::{LyricWindow, ACTIVE_SLOT};

pub fn render_lyrics(frame: &mut Frame, area: Rect, window: &LyricWindow) {
    let lines: Vec<Line> = window
        .lines()
        .iter()
        .enumerate()
        .map(|(slot, text)| {
            let style = if slot == ACTIVE_SLOT {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::styled(text.clone(), style)
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .centered()
        .block(Block::default().borders(Borders::ALL).title(" Lyrics "));
    frame.render_widget(paragraph, area);
}
