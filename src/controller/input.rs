//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MediaKeyCode};

use super::AppController;
use crate::media_control::MediaButton;
use crate::model::Direction;
use crate::player::UiContext;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.set_should_quit(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.ui.move_selection(Direction::Previous);
                self.ui.request_render();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.ui.move_selection(Direction::Next);
                self.ui.request_render();
            }
            KeyCode::Enter => self.play_selected().await?,
            // Play/Pause toggle
            KeyCode::Char(' ') => self.press(MediaButton::Toggle).await?,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Right => {
                self.press(MediaButton::Next).await?
            }
            KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Left => {
                self.press(MediaButton::Previous).await?
            }
            KeyCode::Char('m') | KeyCode::Char('M') => self.cycle_mode().await?,
            KeyCode::Char('i') => self.start_intelligent(false).await?,
            KeyCode::Char('I') => self.start_intelligent(true).await?,
            KeyCode::Media(media) => {
                if let Some(button) = media_button(media) {
                    self.press(button).await?;
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn media_button(key: MediaKeyCode) -> Option<MediaButton> {
    match key {
        MediaKeyCode::Play => Some(MediaButton::Play),
        MediaKeyCode::Pause | MediaKeyCode::Stop => Some(MediaButton::Pause),
        MediaKeyCode::PlayPause => Some(MediaButton::Toggle),
        MediaKeyCode::TrackNext => Some(MediaButton::Next),
        MediaKeyCode::TrackPrevious => Some(MediaButton::Previous),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::menu::StaticMenu;
    use crate::model::PlayMode;
    use crate::player::spawn;
    use crate::player::testing::{track, EngineCall, Harness, QUIET};
    use crate::view::TerminalUi;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn keys_drive_the_player() {
        let h = Harness::default();
        let (_states, _ticks, events) = Harness::events();
        let player = spawn(h.actor(QUIET), events);
        let ui = Arc::new(TerminalUi::new());
        ui.show_menu("album", "Album", None, vec![track(1, 100), track(2, 100), track(3, 100)]);
        let controller = AppController::new(player.clone(), ui.clone(), StaticMenu::new("album"));

        controller.handle_key_event(press(KeyCode::Down)).await.unwrap();
        controller.handle_key_event(press(KeyCode::Enter)).await.unwrap();
        assert_eq!(player.status().await.unwrap().cursor, 1);
        assert_eq!(h.engine.played_urls(), vec!["http://cdn/2.mp3".to_string()]);

        controller.handle_key_event(press(KeyCode::Char(' '))).await.unwrap();
        assert_eq!(h.engine.calls().last(), Some(&EngineCall::Resume));

        controller.handle_key_event(press(KeyCode::Char('n'))).await.unwrap();
        controller
            .handle_key_event(press(KeyCode::Media(MediaKeyCode::TrackNext)))
            .await
            .unwrap();
        assert_eq!(player.status().await.unwrap().cursor, 0);

        controller.handle_key_event(press(KeyCode::Char('m'))).await.unwrap();
        assert_eq!(player.status().await.unwrap().mode, PlayMode::Order);

        let release = KeyEvent::new_with_kind(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        controller.handle_key_event(release).await.unwrap();
        assert!(!controller.should_quit());
        controller.handle_key_event(press(KeyCode::Char('q'))).await.unwrap();
        assert!(controller.should_quit());

        player.shutdown().await.unwrap();
    }

    #[test]
    fn media_keys_map_to_buttons() {
        assert_eq!(media_button(MediaKeyCode::PlayPause), Some(MediaButton::Toggle));
        assert_eq!(media_button(MediaKeyCode::TrackPrevious), Some(MediaButton::Previous));
        assert_eq!(media_button(MediaKeyCode::Record), None);
    }
}
