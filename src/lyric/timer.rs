//! Drives the lyric window from playback ticks

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::lrc::{LyricTrack, LyricWindow};

/// Called with the new window and the raw fragment index whenever the
/// active fragment changes.
pub type LyricListener = Arc<dyn Fn(&LyricWindow, usize) + Send + Sync>;

enum Control {
    Restart,
}

/// Background task tracking the active lyric fragment of one track.
///
/// Ticks are fed with [`LyricTimer::try_feed`] through a single-slot channel:
/// a tick arriving while the previous one is still pending is dropped.
pub struct LyricTimer {
    feed: mpsc::Sender<Duration>,
    control: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
}

impl LyricTimer {
    pub fn start(track: LyricTrack, listener: LyricListener) -> Self {
        let (feed, mut feed_rx) = mpsc::channel::<Duration>(1);
        let (control, mut control_rx) = mpsc::unbounded_channel::<Control>();

        let task = tokio::spawn(async move {
            let mut active: Option<usize> = None;

            loop {
                tokio::select! {
                    biased;
                    Some(ctrl) = control_rx.recv() => match ctrl {
                        Control::Restart => {
                            active = None;
                            listener(&LyricWindow::default(), 0);
                        }
                    },
                    Some(elapsed) = feed_rx.recv() => {
                        let Some(index) = track.locate(elapsed) else {
                            continue;
                        };
                        if active != Some(index) {
                            active = Some(index);
                            listener(&track.window(index), index);
                        }
                    }
                    else => break,
                }
            }

            tracing::trace!("Lyric timer finished");
        });

        Self {
            feed,
            control,
            task,
        }
    }

    /// Offers a tick without waiting. Returns false when it was dropped.
    pub fn try_feed(&self, elapsed: Duration) -> bool {
        self.feed.try_send(elapsed).is_ok()
    }

    pub fn restart(&self) {
        let _ = self.control.send(Control::Restart);
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for LyricTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyric::lrc::PLACEHOLDER_LYRIC;

    fn recording_listener() -> (LyricListener, mpsc::UnboundedReceiver<(LyricWindow, usize)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener: LyricListener = Arc::new(move |window: &LyricWindow, index: usize| {
            let _ = tx.send((window.clone(), index));
        });
        (listener, rx)
    }

    async fn feed(timer: &LyricTimer, elapsed: Duration) {
        // Retry while the previous tick is still in the slot.
        for _ in 0..100 {
            if timer.try_feed(elapsed) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("lyric timer never accepted the tick");
    }

    async fn next_event(
        rx: &mut mpsc::UnboundedReceiver<(LyricWindow, usize)>,
    ) -> (LyricWindow, usize) {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("listener was not called")
            .expect("listener channel closed")
    }

    #[tokio::test]
    async fn notifies_only_when_active_fragment_changes() {
        let track = LyricTrack::parse("[00:01.00]one\n[00:03.00]two\n[00:05.00]three");
        let (listener, mut rx) = recording_listener();
        let timer = LyricTimer::start(track, listener);

        feed(&timer, Duration::from_millis(1_200)).await;
        let (window, index) = next_event(&mut rx).await;
        assert_eq!(index, 0);
        assert_eq!(window.active(), "one");

        feed(&timer, Duration::from_millis(1_800)).await;
        feed(&timer, Duration::from_millis(3_100)).await;
        let (window, index) = next_event(&mut rx).await;
        assert_eq!(index, 1);
        assert_eq!(window.lines()[1], "one");
        assert_eq!(window.active(), "two");
        assert_eq!(window.lines()[3], "three");

        timer.stop();
    }

    #[tokio::test]
    async fn restart_clears_window_and_renotifies() {
        let (listener, mut rx) = recording_listener();
        let timer = LyricTimer::start(LyricTrack::placeholder(), listener);

        feed(&timer, Duration::from_secs(2)).await;
        let (window, _) = next_event(&mut rx).await;
        assert_eq!(window.active(), PLACEHOLDER_LYRIC);

        timer.restart();
        let (window, _) = next_event(&mut rx).await;
        assert_eq!(window, LyricWindow::default());

        feed(&timer, Duration::from_secs(3)).await;
        let (window, index) = next_event(&mut rx).await;
        assert_eq!(index, 0);
        assert_eq!(window.active(), PLACEHOLDER_LYRIC);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn ticks_offered_while_busy_are_dropped() {
        let track = LyricTrack::parse("[00:00.00]one\n[00:01.00]two\n[00:02.00]three");
        let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();
        let gate_rx = std::sync::Mutex::new(gate_rx);
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        // Holds the timer inside the listener until the gate opens.
        let listener: LyricListener = Arc::new(move |_: &LyricWindow, index: usize| {
            let _ = seen_tx.send(index);
            let _ = gate_rx.lock().map(|rx| rx.recv());
        });
        let timer = LyricTimer::start(track, listener);

        assert!(timer.try_feed(Duration::from_millis(500)));
        let first = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv()).await;
        assert_eq!(first.ok().flatten(), Some(0));

        assert!(timer.try_feed(Duration::from_millis(1_500)));
        assert!(!timer.try_feed(Duration::from_millis(2_500)));

        gate_tx.send(()).unwrap();
        let second = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv()).await;
        assert_eq!(second.ok().flatten(), Some(1));

        gate_tx.send(()).unwrap();
        let third = tokio::time::timeout(Duration::from_millis(100), seen_rx.recv()).await;
        assert!(third.is_err(), "dropped tick was delivered");

        timer.stop();
        drop(gate_tx);
    }

    #[tokio::test]
    async fn stopped_timer_rejects_ticks() {
        let (listener, _rx) = recording_listener();
        let timer = LyricTimer::start(LyricTrack::placeholder(), listener);
        timer.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!timer.try_feed(Duration::from_secs(1)));
    }
}
