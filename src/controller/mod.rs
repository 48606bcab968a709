//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input
//! and forwards it to the player. It is organized into submodules by
//! responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Playback control methods

mod input;
mod playback;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::player::{PlayerHandle, PlayingMenu};
use crate::view::TerminalUi;

#[derive(Clone)]
pub struct AppController {
    pub(crate) player: PlayerHandle,
    pub(crate) ui: Arc<TerminalUi>,
    /// Menu whose songs are on screen
    pub(crate) menu: Arc<dyn PlayingMenu>,
    should_quit: Arc<AtomicBool>,
}

impl AppController {
    pub fn new(player: PlayerHandle, ui: Arc<TerminalUi>, menu: Arc<dyn PlayingMenu>) -> Self {
        Self {
            player,
            ui,
            menu,
            should_quit: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit.load(Ordering::SeqCst)
    }

    pub(crate) fn set_should_quit(&self) {
        tracing::info!("Quit requested");
        self.should_quit.store(true, Ordering::SeqCst);
    }
}
