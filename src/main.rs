mod audio;
mod auth;
mod config;
mod controller;
mod error;
mod logging;
mod lyric;
mod media_control;
mod menu;
mod model;
mod player;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};

use audio::ClockEngine;
use auth::CookieSession;
use config::AppConfig;
use controller::AppController;
use media_control::LoggingControls;
use menu::{PlaylistMenu, StaticMenu, RESTORED_MENU_KEY};
use model::{JsonFileStore, MusicService, NeteaseClient, PlaybackSnapshot, SnapshotStore};
use player::{Collaborators, PlaybackActor, PlayerHandle, PlayerSettings, PlayingMenu, UiContext};
use view::{AppView, TerminalUi};

/// Redraw period for the progress bar when nothing else happens
const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== musicfox-rs starting ===");
    tracing::debug!(?config, "Configuration loaded");

    let cookie = CookieSession::load_cookie(&config.cookie_file).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not read cookie file, continuing logged out");
        None
    });
    let client = NeteaseClient::new(&config.api_base_url, cookie)?;
    let service: Arc<dyn MusicService> = Arc::new(client.clone());

    let store = Arc::new(JsonFileStore::new(&config.data_dir));
    let snapshot = store.load_snapshot().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not load playback snapshot");
        None
    });
    let mode = store.load_play_mode().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not load play mode");
        None
    });

    let ui = Arc::new(TerminalUi::new());
    let (engine, audio_events) = ClockEngine::new();

    let actor = PlaybackActor::new(
        Collaborators {
            service: service.clone(),
            engine: Box::new(engine),
            media: Arc::new(LoggingControls::default()),
            store,
            session: Arc::new(CookieSession::new(&config.cookie_file, client)),
            ui: ui.clone(),
        },
        PlayerSettings {
            bitrate: config.bitrate,
            show_lyric: config.show_lyric,
        },
    )
    .restore(snapshot.clone(), mode);
    let player = player::spawn(actor, audio_events);

    let menu = open_start_menu(&config, service, &ui, snapshot).await;
    let controller = AppController::new(player.clone(), ui.clone(), menu);

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &controller, &player, &ui, config.show_lyric).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    if let Err(e) = player.shutdown().await {
        tracing::warn!(error = %e, "Player was already stopped");
    }

    tracing::info!("musicfox-rs shutting down");
    Ok(())
}

/// Shows the configured playlist, or the restored one when none is set.
///
/// A playlist id given as the first argument overrides the config file.
async fn open_start_menu(
    config: &AppConfig,
    service: Arc<dyn MusicService>,
    ui: &Arc<TerminalUi>,
    snapshot: Option<PlaybackSnapshot>,
) -> Arc<dyn PlayingMenu> {
    let playlist_id = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<i64>().ok())
        .or(config.playlist_id);

    if let Some(playlist_id) = playlist_id {
        let menu = PlaylistMenu::new(playlist_id, config.page_size, service, ui.clone());
        let tracks = menu.next_page().await.unwrap_or_else(|e| {
            tracing::error!(playlist_id, error = %e, "Failed to load playlist");
            Vec::new()
        });
        ui.show_menu(
            &menu.menu_key(),
            &format!("Playlist {playlist_id}"),
            Some(playlist_id),
            tracks,
        );
        return menu;
    }

    let snapshot = snapshot.unwrap_or_default();
    ui.show_menu(RESTORED_MENU_KEY, "Last session", None, snapshot.playlist);
    ui.locate(snapshot.cursor);
    StaticMenu::new(RESTORED_MENU_KEY)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &AppController,
    player: &PlayerHandle,
    ui: &TerminalUi,
    show_lyric: bool,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut refresh = tokio::time::interval(REFRESH_INTERVAL);

    loop {
        let status = player.status().await?;
        let screen = ui.snapshot();

        terminal.draw(|f| {
            AppView::render(f, &screen, &status, show_lyric);
        })?;

        if controller.should_quit() {
            break;
        }

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if let Err(e) = controller.handle_key_event(key).await {
                        tracing::error!(error = %e, "Key handling failed");
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            _ = ui.render_requested() => {}
            _ = refresh.tick() => {}
        }
    }

    Ok(())
}
