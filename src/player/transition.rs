//! Cursor arithmetic for each play mode

use rand::Rng;

use crate::model::{Direction, PlayMode};

/// True when the cursor sits on the last element, where boundary side
/// effects run before moving in either direction.
pub fn is_boundary(cursor: usize, len: usize) -> bool {
    len == 0 || cursor >= len - 1
}

/// Cursor to play after moving in `direction`, or `None` when nothing
/// should be played.
pub fn step<R: Rng + ?Sized>(
    mode: PlayMode,
    direction: Direction,
    cursor: usize,
    len: usize,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let next = match (mode, direction) {
        (PlayMode::ListLoop | PlayMode::Intelligent, Direction::Next) => (cursor + 1) % len,
        (PlayMode::ListLoop | PlayMode::Intelligent, Direction::Previous) => {
            (cursor + len - 1) % len
        }
        (PlayMode::SingleLoop, _) => cursor,
        // The pick never lands on the last index.
        (PlayMode::Random, _) => {
            if len == 1 {
                0
            } else {
                rng.gen_range(0..len - 1)
            }
        }
        (PlayMode::Order, Direction::Next) => {
            if cursor >= len - 1 {
                return None;
            }
            cursor + 1
        }
        (PlayMode::Order, Direction::Previous) => {
            if cursor == 0 {
                return None;
            }
            cursor - 1
        }
    };

    (next < len).then_some(next)
}
