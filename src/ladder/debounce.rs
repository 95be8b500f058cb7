//! Consensus filter over recent classification results.

/// Result of classifying one sample: a table index, or `None` for no match.
pub type Reading = Option<usize>;

/// Fixed-length ring of the latest readings of one channel.
///
/// A reading is accepted once at least `eq_readings` slots of the ring hold
/// the same value as the newest one. The ring starts filled with no-match, so
/// no table entry is accepted before `eq_readings` samples have been taken,
/// while a no-match can reach consensus straight from the initial fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceWindow {
    readings: Vec<Reading>,
    cursor: usize,
    eq_readings: usize,
}

impl DebounceWindow {
    /// `max_readings` must be at least 1 and `eq_readings` within `1..=max_readings`;
    /// both are checked by [`crate::config::Config::validate`].
    pub fn new(max_readings: usize, eq_readings: usize) -> Self {
        let max_readings = max_readings.max(1);
        Self {
            readings: vec![None; max_readings],
            cursor: 0,
            eq_readings: eq_readings.clamp(1, max_readings),
        }
    }

    /// Record a reading, overwriting the oldest slot.
    ///
    /// Returns true if the reading now has consensus.
    pub fn push(&mut self, reading: Reading) -> bool {
        self.readings[self.cursor] = reading;
        self.cursor = (self.cursor + 1) % self.readings.len();
        self.agreeing(reading) >= self.eq_readings
    }

    /// Number of slots holding `reading`.
    pub fn agreeing(&self, reading: Reading) -> usize {
        self.readings.iter().filter(|r| **r == reading).count()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn eq_readings(&self) -> usize {
        self.eq_readings
    }
}
