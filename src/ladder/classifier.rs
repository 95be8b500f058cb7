//! Nearest-entry classification of live analog samples.

use super::model::VoltageTable;

/// Maps a sample to the closest entry of a voltage table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    /// Maximum distance (millivolts) for an entry to be considered a match
    v_acc: f64,
}

impl Classifier {
    pub fn new(v_acc: f64) -> Self {
        Self { v_acc }
    }

    pub fn v_acc(&self) -> f64 {
        self.v_acc
    }

    /// Index of the entry closest to `millivolts`, or `None` if no entry lies
    /// within the acceptance distance.
    ///
    /// Ties go to the earlier entry, so an exact tie with the idle entry
    /// classifies as idle.
    pub fn classify(&self, table: &VoltageTable, millivolts: f64) -> Option<usize> {
        if !millivolts.is_finite() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, entry) in table.entries().iter().enumerate() {
            let distance = (millivolts - entry.millivolts).abs();
            if distance < self.v_acc && best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::model::Divider;

    /// idle at 0 mV, then 1650 mV, 1100 mV and 1980 mV
    fn table() -> VoltageTable {
        let mut table = VoltageTable::new(Divider::new(100.0, 3.3));
        table.insert(&[100.0], vec![0]);
        table.insert(&[200.0], vec![1]);
        table.insert(&[100.0, 200.0], vec![0, 1]);
        table
    }

    #[test]
    fn test_exact_sample_selects_entry() {
        let table = table();
        let classifier = Classifier::new(80.0);
        for (index, entry) in table.entries().iter().enumerate() {
            assert_eq!(classifier.classify(&table, entry.millivolts), Some(index));
        }
    }

    #[test]
    fn test_nearest_within_tolerance_wins() {
        let table = table();
        let classifier = Classifier::new(300.0);
        assert_eq!(classifier.classify(&table, 1200.0), Some(2));
        // 150 from the single press, 180 from the pair
        assert_eq!(classifier.classify(&table, 1800.0), Some(1));
        assert_eq!(classifier.classify(&table, 1850.0), Some(3));
    }

    #[test]
    fn test_idle_sample_classifies_as_idle() {
        let table = table();
        let classifier = Classifier::new(80.0);
        assert_eq!(classifier.classify(&table, 0.0), Some(0));
        assert_eq!(classifier.classify(&table, 42.0), Some(0));
    }

    #[test]
    fn test_sample_outside_tolerance_is_no_match() {
        let table = table();
        let classifier = Classifier::new(80.0);
        assert_eq!(classifier.classify(&table, 600.0), None);
        assert_eq!(classifier.classify(&table, 3000.0), None);
        // exactly V_acc away is not accepted
        assert_eq!(classifier.classify(&table, 80.0), None);
    }

    #[test]
    fn test_tie_goes_to_earlier_entry() {
        let mut table = VoltageTable::new(Divider::new(100.0, 3.3));
        // Two buttons with the same resistance are indistinguishable
        table.insert(&[470.0], vec![0]);
        table.insert(&[470.0], vec![1]);
        let classifier = Classifier::new(80.0);
        let v = table.entries()[1].millivolts;
        assert_eq!(table.entries()[2].millivolts, v);
        assert_eq!(classifier.classify(&table, v), Some(1));
        assert_eq!(classifier.classify(&table, v + 10.0), Some(1));
    }

    #[test]
    fn test_tie_with_idle_goes_to_idle() {
        let mut table = VoltageTable::new(Divider::new(100.0, 3.3));
        table.insert(&[1000.0], vec![0]);
        let pressed = table.entries()[1].millivolts;
        let classifier = Classifier::new(pressed);
        // Exactly halfway, both within tolerance
        let halfway = pressed / 2.0;
        assert_eq!(halfway - table.entries()[0].millivolts, pressed - halfway);
        assert_eq!(classifier.classify(&table, halfway), Some(0));
    }

    #[test]
    fn test_non_finite_sample_is_no_match() {
        let table = table();
        let classifier = Classifier::new(80.0);
        assert_eq!(classifier.classify(&table, f64::NAN), None);
        assert_eq!(classifier.classify(&table, f64::INFINITY), None);
    }
}
