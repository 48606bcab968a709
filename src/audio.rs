use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::model::{PlaybackState, StreamFormat};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Event streams produced by an audio engine
pub struct AudioEvents {
    pub states: mpsc::UnboundedReceiver<PlaybackState>,
    pub ticks: mpsc::UnboundedReceiver<Duration>,
}

/// Decode/output backend driven by the player
pub trait AudioEngine: Send + Sync {
    fn play(&mut self, format: StreamFormat, url: &str, duration: Duration);
    fn pause(&mut self);
    fn resume(&mut self);
    fn close(&mut self);
    /// Time played of the current stream
    fn passed_time(&self) -> Duration;
}

enum EngineCommand {
    Play { duration: Duration },
    Pause,
    Resume,
    Close,
}

/// Engine that keeps playback time for a stream without producing sound.
///
/// It reports the same state changes and ticks as a decoding backend, which
/// lets the player run headless.
pub struct ClockEngine {
    commands: mpsc::UnboundedSender<EngineCommand>,
    passed_ms: Arc<AtomicU64>,
}

impl ClockEngine {
    pub fn new() -> (Self, AudioEvents) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, states) = mpsc::unbounded_channel();
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let passed_ms = Arc::new(AtomicU64::new(0));

        tokio::spawn(drive(command_rx, state_tx, tick_tx, passed_ms.clone()));

        (Self { commands, passed_ms }, AudioEvents { states, ticks })
    }
}

impl AudioEngine for ClockEngine {
    fn play(&mut self, format: StreamFormat, url: &str, duration: Duration) {
        tracing::info!(?format, url, duration_ms = duration.as_millis() as u64, "Engine: play");
        let _ = self.commands.send(EngineCommand::Play { duration });
    }

    fn pause(&mut self) {
        let _ = self.commands.send(EngineCommand::Pause);
    }

    fn resume(&mut self) {
        let _ = self.commands.send(EngineCommand::Resume);
    }

    fn close(&mut self) {
        tracing::debug!("Engine: close");
        let _ = self.commands.send(EngineCommand::Close);
    }

    fn passed_time(&self) -> Duration {
        Duration::from_millis(self.passed_ms.load(Ordering::Relaxed))
    }
}

async fn drive(
    mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    states: mpsc::UnboundedSender<PlaybackState>,
    ticks: mpsc::UnboundedSender<Duration>,
    passed_ms: Arc<AtomicU64>,
) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut state = PlaybackState::Stopped;
    let mut declared = Duration::ZERO;
    let mut elapsed = Duration::ZERO;

    let set_state = |new_state: PlaybackState, state: &mut PlaybackState| {
        if *state != new_state {
            *state = new_state;
            let _ = states.send(new_state);
        }
    };

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(EngineCommand::Play { duration }) => {
                    declared = duration;
                    elapsed = Duration::ZERO;
                    passed_ms.store(0, Ordering::Relaxed);
                    // A new stream always announces itself, even over a playing one.
                    state = PlaybackState::Paused;
                    set_state(PlaybackState::Playing, &mut state);
                }
                Some(EngineCommand::Pause) => {
                    if state == PlaybackState::Playing {
                        set_state(PlaybackState::Paused, &mut state);
                    }
                }
                Some(EngineCommand::Resume) => {
                    if state == PlaybackState::Paused {
                        set_state(PlaybackState::Playing, &mut state);
                    }
                }
                Some(EngineCommand::Close) | None => break,
            },
            _ = interval.tick() => {
                if state != PlaybackState::Playing {
                    continue;
                }
                elapsed += TICK_INTERVAL;
                passed_ms.store(elapsed.as_millis() as u64, Ordering::Relaxed);
                let _ = ticks.send(elapsed);
                if elapsed >= declared {
                    set_state(PlaybackState::Stopped, &mut state);
                }
            }
        }
    }

    tracing::debug!("Clock engine stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_to_the_end_of_the_stream() {
        let (mut engine, mut events) = ClockEngine::new();
        engine.play(StreamFormat::Mp3, "http://example.invalid/a.mp3", Duration::from_secs(1));

        assert_eq!(events.states.recv().await, Some(PlaybackState::Playing));
        assert_eq!(events.states.recv().await, Some(PlaybackState::Stopped));

        let mut last = Duration::ZERO;
        while let Ok(tick) = events.ticks.try_recv() {
            assert!(tick > last);
            last = tick;
        }
        assert_eq!(last, Duration::from_secs(1));
        assert_eq!(engine.passed_time(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_report_state() {
        let (mut engine, mut events) = ClockEngine::new();
        engine.play(StreamFormat::Flac, "http://example.invalid/a.flac", Duration::from_secs(60));
        assert_eq!(events.states.recv().await, Some(PlaybackState::Playing));

        engine.pause();
        assert_eq!(events.states.recv().await, Some(PlaybackState::Paused));
        engine.resume();
        assert_eq!(events.states.recv().await, Some(PlaybackState::Playing));

        engine.close();
    }
}
