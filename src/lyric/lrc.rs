//! LRC parsing and the 5-line lyric window

use std::time::Duration;

/// Number of lines in the rolling lyric window
pub const WINDOW_SIZE: usize = 5;
/// Slot holding the active line
pub const ACTIVE_SLOT: usize = WINDOW_SIZE / 2;

pub const PLACEHOLDER_LYRIC: &str = "No lyrics available";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LyricFragment {
    pub start: Duration,
    pub text: String,
}

/// Lines shown around the active fragment; missing neighbors are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LyricWindow(pub [String; WINDOW_SIZE]);

impl LyricWindow {
    pub fn active(&self) -> &str {
        &self.0[ACTIVE_SLOT]
    }

    pub fn lines(&self) -> &[String; WINDOW_SIZE] {
        &self.0
    }
}

/// Timestamp-sorted lyric fragments of one track
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LyricTrack {
    fragments: Vec<LyricFragment>,
}

impl LyricTrack {
    pub fn new(mut fragments: Vec<LyricFragment>) -> Self {
        fragments.sort_by_key(|f| f.start);
        Self { fragments }
    }

    /// Single line shown when a track has no lyrics.
    pub fn placeholder() -> Self {
        Self::new(vec![LyricFragment {
            start: Duration::ZERO,
            text: PLACEHOLDER_LYRIC.to_string(),
        }])
    }

    /// Parses `[mm:ss.cc]text` lines. A line may carry several time tags;
    /// metadata tags and untagged lines are ignored.
    pub fn parse(content: &str) -> Self {
        let mut fragments = Vec::new();

        for line in content.lines() {
            let mut rest = line.trim();
            let mut starts = Vec::new();

            while rest.starts_with('[') {
                let Some(close) = rest.find(']') else {
                    break;
                };
                if let Some(start) = parse_timestamp(&rest[1..close]) {
                    starts.push(start);
                }
                rest = &rest[close + 1..];
            }

            if starts.is_empty() {
                if !line.trim().is_empty() {
                    tracing::trace!(line, "Skipping LRC line without time tag");
                }
                continue;
            }

            let text = rest.trim();
            for start in starts {
                fragments.push(LyricFragment {
                    start,
                    text: text.to_string(),
                });
            }
        }

        Self::new(fragments)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragment(&self, index: isize) -> Option<&LyricFragment> {
        usize::try_from(index).ok().and_then(|i| self.fragments.get(i))
    }

    /// Index of the fragment whose time window contains `elapsed`, i.e. the
    /// last fragment starting at or before it.
    pub fn locate(&self, elapsed: Duration) -> Option<usize> {
        let after = self.fragments.partition_point(|f| f.start <= elapsed);
        after.checked_sub(1)
    }

    pub fn window(&self, index: usize) -> LyricWindow {
        let mut window = LyricWindow::default();
        let center = index as isize;
        for (slot, line) in window.0.iter_mut().enumerate() {
            let offset = slot as isize - ACTIVE_SLOT as isize;
            if let Some(fragment) = self.fragment(center + offset) {
                line.clone_from(&fragment.text);
            }
        }
        window
    }
}

fn parse_timestamp(tag: &str) -> Option<Duration> {
    let (minutes, seconds) = tag.split_once(':')?;
    let minutes: u64 = minutes.trim().parse().ok()?;

    let (whole, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (seconds, ""),
    };
    let whole: u64 = whole.trim().parse().ok()?;
    if whole >= 60 {
        return None;
    }

    let millis = match fraction.len() {
        0 => 0,
        1..=3 if fraction.bytes().all(|b| b.is_ascii_digit()) => {
            let value: u64 = fraction.parse().ok()?;
            value * 10u64.pow(3 - fraction.len() as u32)
        }
        _ => return None,
    };

    Some(Duration::from_millis((minutes * 60 + whole) * 1000 + millis))
}
