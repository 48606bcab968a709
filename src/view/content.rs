//! Track list of the menu on screen

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Padding, Paragraph},
    Frame,
};

use super::screen::ScreenState;
use super::utils::{calculate_num_width, format_duration, render_scrollable_list, truncate_string};

pub fn render_track_list(frame: &mut Frame, area: Rect, screen: &ScreenState, playing_id: Option<i64>) {
    let title = if screen.menu_title.is_empty() {
        " Tracks ".to_string()
    } else {
        format!(" {} ", screen.menu_title)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Green));

    if screen.tracks.is_empty() {
        let hint = Paragraph::new(
            "No tracks loaded\n\nSet `playlist_id` in the config file\nor pass a playlist id on the command line",
        )
        .style(Style::default().fg(Color::DarkGray))
        .block(block.padding(Padding::horizontal(1)));
        frame.render_widget(hint, area);
        return;
    }

    let content_width = area.width.saturating_sub(2) as usize;
    let num_width = calculate_num_width(screen.tracks.len());
    let duration_width = 7;
    let text_width = content_width.saturating_sub(num_width + duration_width + 4);
    let title_width = text_width * 55 / 100;
    let artist_width = text_width.saturating_sub(title_width);

    let items: Vec<ListItem> = screen
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_selected = i == screen.selected;
            let is_playing = playing_id == Some(track.id);

            let mut style = Style::default();
            if is_playing {
                style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
            }
            if is_selected {
                style = style.bg(Color::DarkGray);
            }

            let marker = if is_playing { "▶" } else { " " };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}{:>width$} ", marker, i + 1, width = num_width), style),
                Span::styled(truncate_string(&track.name, title_width), style),
                Span::styled(" ", style),
                Span::styled(truncate_string(&track.artist_line(), artist_width), style),
                Span::styled(format!(" {:>6}", format_duration(track.duration())), style),
            ]))
        })
        .collect();

    render_scrollable_list(frame, area, items, screen.selected, block);
}
