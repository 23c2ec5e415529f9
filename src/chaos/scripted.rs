//! Replayed randomness
//!
//! A [`RandomSource`] that hands out a fixed list of values, cycling when it
//! runs out. Pins every decision of the pipeline in unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::source::RandomSource;

/// Source that replays a fixed sequence and counts draws
#[derive(Debug)]
pub struct ScriptedSource {
    values: Vec<i32>,
    cursor: AtomicUsize,
}

impl ScriptedSource {
    /// Create a source replaying `values`
    ///
    /// Negative values are clamped to 0. An empty script always yields 0.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.max(0)).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of values drawn so far
    #[must_use]
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl RandomSource for ScriptedSource {
    fn next_non_negative_i32(&self) -> i32 {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        if self.values.is_empty() {
            return 0;
        }
        self.values[index % self.values.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_and_cycles() {
        let source = ScriptedSource::new([3, 1, 4]);
        let drawn: Vec<i32> = (0..5).map(|_| source.next_non_negative_i32()).collect();
        assert_eq!(drawn, vec![3, 1, 4, 3, 1]);
        assert_eq!(source.draws(), 5);
    }

    #[test]
    fn test_empty_and_negative() {
        let source = ScriptedSource::new([]);
        assert_eq!(source.next_non_negative_i32(), 0);

        let source = ScriptedSource::new([-5]);
        assert_eq!(source.next_non_negative_i32(), 0);
    }
}
