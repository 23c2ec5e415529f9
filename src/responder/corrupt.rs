//! Response corruption
//!
//! Truncates an encoded answer in place. A truncated answer is deliberately
//! no longer a well-formed DNS message.

use crate::chaos::ChaosEngine;

/// Shortest encoding that can be truncated; below this the cut range is empty
pub const MIN_TRUNCATABLE_LEN: usize = 3;

/// What the corruptor did to an encoded answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Truncation was not triggered
    Untouched,
    /// Cut from `original` bytes down to `kept` bytes
    Truncated { original: usize, kept: usize },
    /// Triggered but the encoding was too short to cut
    TooShort { len: usize },
}

impl Truncation {
    /// Whether bytes were removed
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

/// Pick how many leading bytes of an `encoded_len`-byte answer to keep
///
/// The result lies in `[1, encoded_len - 2]`. Returns `None` when
/// `encoded_len < 3`, where that range is empty.
pub fn cut_point(engine: &ChaosEngine, encoded_len: usize) -> Option<usize> {
    if encoded_len < MIN_TRUNCATABLE_LEN {
        return None;
    }
    let width = i32::try_from(encoded_len - 2).ok()?;
    usize::try_from(engine.ranged_i32(1, width)).ok()
}

/// Truncate `encoded` with likelihood `truncate_percent / 100`
///
/// Draws once for the decision and, when it fires on a long enough answer,
/// once more for the cut point.
pub fn maybe_truncate(
    engine: &ChaosEngine,
    truncate_percent: u8,
    encoded: &mut Vec<u8>,
) -> Truncation {
    if !engine.percent_chance(truncate_percent) {
        return Truncation::Untouched;
    }

    let original = encoded.len();
    match cut_point(engine, original) {
        Some(kept) => {
            encoded.truncate(kept);
            Truncation::Truncated { original, kept }
        }
        None => Truncation::TooShort { len: original },
    }
}
