//! Expected-voltage tables for resistor-ladder channels.
//!
//! Every button sits in series with its own resistor between the analog
//! input and the supply, and the input is tied to ground through a reference
//! resistor `R0`. Pressing buttons puts their resistors in parallel, so each
//! combination of pressed buttons produces its own divider voltage. This
//! module precomputes those voltages once at startup.

use crate::config::{ButtonConfig, Config};
use crate::error::ConfigError;
use log::{error, info, warn};
use std::time::Duration;

/// Resistance used for "no button pressed".
pub const OPEN_CIRCUIT_OHMS: f64 = 1e20;

/// Largest group expanded into combinations (2^16 table entries).
pub const MAX_GROUP_SIZE: usize = 16;

/// Resistor divider formed by the reference resistor and the pressed buttons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divider {
    /// Reference resistor (ohms)
    pub r0: f64,
    /// Nominal supply voltage (volts)
    pub v_nom: f64,
}

impl Divider {
    pub fn new(r0: f64, v_nom: f64) -> Self {
        Self { r0, v_nom }
    }

    /// Expected input voltage in millivolts for an effective resistance.
    pub fn millivolts(&self, r: f64) -> f64 {
        let v = (1.0 - r / (self.r0 + r)) * self.v_nom;
        v.clamp(0.0, self.v_nom) * 1000.0
    }

    /// Expected voltage for a set of resistors wired in parallel.
    pub fn millivolts_parallel(&self, resistances: &[f64]) -> f64 {
        self.millivolts(parallel_resistance(resistances))
    }
}

/// Effective resistance of resistors in parallel.
///
/// An empty slice is an open circuit.
pub fn parallel_resistance(resistances: &[f64]) -> f64 {
    match resistances {
        [] => OPEN_CIRCUIT_OHMS,
        [r] => *r,
        rs => 1.0 / rs.iter().map(|r| 1.0 / r).sum::<f64>(),
    }
}

/// One row of a voltage table.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    /// Expected input voltage (millivolts)
    pub millivolts: f64,
    /// Channel-local indices of the buttons held down, ascending
    pub down: Vec<usize>,
}

impl Combination {
    pub fn is_idle(&self) -> bool {
        self.down.is_empty()
    }

    pub fn contains(&self, button: usize) -> bool {
        self.down.binary_search(&button).is_ok()
    }
}

/// Ordered table of expected voltages for one channel.
///
/// Index 0 is always the idle entry.
#[derive(Debug, Clone, PartialEq)]
pub struct VoltageTable {
    divider: Divider,
    entries: Vec<Combination>,
}

impl VoltageTable {
    /// Create a table holding only the idle entry.
    pub fn new(divider: Divider) -> Self {
        Self {
            divider,
            entries: vec![Combination {
                millivolts: divider.millivolts(OPEN_CIRCUIT_OHMS),
                down: Vec::new(),
            }],
        }
    }

    /// Add a combination of channel-local buttons with their resistances.
    ///
    /// Returns the new index, or `None` if an entry with the same buttons
    /// already exists.
    pub fn insert(&mut self, resistances: &[f64], mut down: Vec<usize>) -> Option<usize> {
        down.sort_unstable();
        down.dedup();
        if self.entries.iter().any(|e| e.down == down) {
            return None;
        }
        self.entries.push(Combination {
            millivolts: self.divider.millivolts_parallel(resistances),
            down,
        });
        Some(self.entries.len() - 1)
    }

    pub fn entries(&self) -> &[Combination] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Combination> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn divider(&self) -> Divider {
        self.divider
    }

    /// Smallest voltage gap between any two entries, with their indices.
    pub fn closest_pair(&self) -> Option<(usize, usize, f64)> {
        let mut sorted: Vec<(usize, f64)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, e.millivolts))
            .collect();
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
        sorted
            .windows(2)
            .map(|w| (w[0].0.min(w[1].0), w[0].0.max(w[1].0), (w[1].1 - w[0].1).abs()))
            .min_by(|a, b| a.2.total_cmp(&b.2))
    }
}

/// A configured button after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonSpec {
    pub id: String,
    pub name: String,
    pub unique_id: String,
    pub channel: String,
    /// Series resistance (ohms)
    pub resistance: f64,
    /// Dwell time that turns a press into a hold; `None` disables long press
    pub long_press: Option<Duration>,
}

/// Buttons and voltage table of one analog input.
#[derive(Debug, Clone)]
pub struct ChannelLayout {
    pub id: String,
    pub buttons: Vec<ButtonSpec>,
    pub table: VoltageTable,
}

impl ChannelLayout {
    fn new(id: String, divider: Divider) -> Self {
        Self {
            id,
            buttons: Vec::new(),
            table: VoltageTable::new(divider),
        }
    }

    fn position(&self, button_id: &str) -> Option<usize> {
        self.buttons.iter().position(|b| b.id == button_id)
    }

    /// Human-readable list of the buttons in a combination.
    pub fn describe(&self, combination: &Combination) -> String {
        match combination.down.as_slice() {
            [] => "no buttons are".to_string(),
            [b] => format!("button {} is", self.buttons[*b].id),
            many => format!(
                "buttons {} are",
                many.iter()
                    .map(|b| self.buttons[*b].id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    fn log_entry(&self, index: usize) {
        if let Some(entry) = self.table.get(index) {
            info!(
                "[Ladder] Expect {:0.3}V on channel {} when {} pressed",
                entry.millivolts * 0.001,
                self.id,
                self.describe(entry)
            );
        }
    }
}

/// Every channel built from a configuration, plus the entries that were skipped.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub channels: Vec<ChannelLayout>,
    pub skipped: Vec<ConfigError>,
}

impl Layout {
    /// Build the voltage tables for every channel in the configuration.
    ///
    /// Channels appear in the order their first button is configured. Each
    /// table starts with the idle entry, followed by one entry per button and
    /// then every combination of two or more buttons from each group.
    /// Invalid buttons and groups are logged and skipped.
    pub fn build(config: &Config) -> Self {
        let divider = Divider::new(config.ladder.r0, config.ladder.v_nom);
        let mut layout = Layout::default();

        for button in &config.buttons {
            if let Err(e) = layout.add_button(config, button, divider) {
                error!("[Ladder] Skipping button: {}", e);
                layout.skipped.push(e);
            }
        }

        for group in &config.groups {
            if let Err(e) = layout.add_group(group) {
                error!("[Ladder] Skipping group: {}", e);
                layout.skipped.push(e);
            }
        }

        for channel in &layout.channels {
            if let Some((a, b, gap)) = channel.table.closest_pair()
                && gap < 2.0 * config.ladder.v_acc
            {
                warn!(
                    "[Ladder] Channel {}: entries for {} pressed and {} pressed are only {:.0}mV apart, readings may be ambiguous",
                    channel.id,
                    channel.describe(&channel.table.entries()[a]),
                    channel.describe(&channel.table.entries()[b]),
                    gap
                );
            }
        }

        layout
    }

    fn channel_mut(&mut self, id: &str, divider: Divider) -> &mut ChannelLayout {
        let index = match self.channels.iter().position(|c| c.id == id) {
            Some(index) => index,
            None => {
                let channel = ChannelLayout::new(id.to_string(), divider);
                channel.log_entry(0);
                self.channels.push(channel);
                self.channels.len() - 1
            }
        };
        &mut self.channels[index]
    }

    fn find_button(&self, id: &str) -> Option<(usize, usize)> {
        self.channels
            .iter()
            .enumerate()
            .find_map(|(c, channel)| channel.position(id).map(|b| (c, b)))
    }

    fn add_button(
        &mut self,
        config: &Config,
        button: &ButtonConfig,
        divider: Divider,
    ) -> Result<(), ConfigError> {
        if button.id.is_empty() {
            return Err(ConfigError::EmptyButtonId);
        }
        if button.channel.is_empty() {
            return Err(ConfigError::EmptyChannel(button.id.clone()));
        }
        if !(button.r.is_finite() && button.r > 0.0) {
            return Err(ConfigError::InvalidResistance {
                id: button.id.clone(),
                r: button.r,
            });
        }
        if self.find_button(&button.id).is_some() {
            return Err(ConfigError::DuplicateButton(button.id.clone()));
        }

        let spec = ButtonSpec {
            id: button.id.clone(),
            name: button.display_name().to_string(),
            unique_id: button.unique_id(&config.unique_id_suffix),
            channel: button.channel.clone(),
            resistance: button.r,
            long_press: button.long_press_threshold(config.long_press),
        };

        let channel = self.channel_mut(&button.channel, divider);
        channel.buttons.push(spec);
        let local = channel.buttons.len() - 1;
        if let Some(index) = channel.table.insert(&[button.r], vec![local]) {
            channel.log_entry(index);
        }
        Ok(())
    }

    fn add_group(&mut self, group: &[String]) -> Result<(), ConfigError> {
        let mut members = Vec::with_capacity(group.len());
        for (i, id) in group.iter().enumerate() {
            if group[..i].contains(id) {
                return Err(ConfigError::DuplicateGroupMember {
                    group: group.to_vec(),
                    button: id.clone(),
                });
            }
            match self.find_button(id) {
                Some(found) => members.push(found),
                None => {
                    return Err(ConfigError::UnknownButton {
                        group: group.to_vec(),
                        button: id.clone(),
                    });
                }
            }
        }

        let Some(&(channel_index, _)) = members.first() else {
            return Ok(());
        };
        if members.iter().any(|(c, _)| *c != channel_index) {
            let mut channels: Vec<String> = Vec::new();
            for (c, _) in &members {
                let id = &self.channels[*c].id;
                if !channels.contains(id) {
                    channels.push(id.clone());
                }
            }
            return Err(ConfigError::GroupSpansChannels {
                group: group.to_vec(),
                channels,
            });
        }
        if members.len() > MAX_GROUP_SIZE {
            return Err(ConfigError::GroupTooLarge {
                group: group.to_vec(),
                max: MAX_GROUP_SIZE,
            });
        }

        let channel = &mut self.channels[channel_index];
        let locals: Vec<usize> = members.iter().map(|(_, b)| *b).collect();
        for size in 2..=locals.len() {
            for combo in combinations(&locals, size) {
                let resistances: Vec<f64> =
                    combo.iter().map(|b| channel.buttons[*b].resistance).collect();
                if let Some(index) = channel.table.insert(&resistances, combo) {
                    channel.log_entry(index);
                }
            }
        }
        Ok(())
    }
}

/// All `size`-element subsets of `items`, in lexicographic order of position.
fn combinations(items: &[usize], size: usize) -> Vec<Vec<usize>> {
    fn collect(
        items: &[usize],
        size: usize,
        start: usize,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for i in start..items.len() {
            current.push(items[i]);
            collect(items, size, i + 1, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    if size <= items.len() {
        collect(items, size, 0, &mut Vec::with_capacity(size), &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn button(id: &str, r: f64, channel: &str) -> ButtonConfig {
        ButtonConfig {
            id: id.to_string(),
            r,
            channel: channel.to_string(),
            name: None,
            long_press: None,
            unique_id: None,
        }
    }

    fn config(buttons: Vec<ButtonConfig>, groups: Vec<Vec<&str>>) -> Config {
        Config {
            buttons,
            groups: groups
                .into_iter()
                .map(|g| g.into_iter().map(String::from).collect())
                .collect(),
            ..Config::default()
        }
    }

    fn formula(r: f64, r0: f64, v_nom: f64) -> f64 {
        ((1.0 - r / (r0 + r)) * v_nom).clamp(0.0, v_nom) * 1000.0
    }

    #[test]
    fn test_parallel_resistance() {
        assert_eq!(parallel_resistance(&[1000.0]), 1000.0);
        assert!((parallel_resistance(&[1000.0, 2000.0]) - 2000.0 / 3.0).abs() < 1e-9);
        assert!((parallel_resistance(&[300.0, 300.0, 300.0]) - 100.0).abs() < 1e-9);
        assert_eq!(parallel_resistance(&[]), OPEN_CIRCUIT_OHMS);
    }

    #[test]
    fn test_idle_entry_is_open_circuit() {
        let divider = Divider::new(100.0, 3.365);
        let table = VoltageTable::new(divider);
        assert_eq!(table.len(), 1);
        assert!(table.entries()[0].is_idle());
        assert_eq!(
            table.entries()[0].millivolts,
            formula(OPEN_CIRCUIT_OHMS, 100.0, 3.365)
        );
        assert!(table.entries()[0].millivolts < 1e-9);
    }

    #[test]
    fn test_singleton_matches_divider_formula() {
        let layout = Layout::build(&config(
            vec![
                button("a", 470.0, "AIn_1"),
                button("b", 1000.0, "AIn_1"),
                button("c", 2200.0, "AIn_2"),
            ],
            vec![],
        ));

        assert!(layout.skipped.is_empty());
        assert_eq!(layout.channels.len(), 2);

        let ch1 = &layout.channels[0];
        assert_eq!(ch1.id, "AIn_1");
        assert_eq!(ch1.table.len(), 3);
        assert!(ch1.table.entries()[0].is_idle());
        assert_eq!(ch1.table.entries()[1].down, vec![0]);
        assert!((ch1.table.entries()[1].millivolts - formula(470.0, 100.0, 3.365)).abs() < 1e-9);
        assert!((ch1.table.entries()[2].millivolts - formula(1000.0, 100.0, 3.365)).abs() < 1e-9);

        let ch2 = &layout.channels[1];
        assert_eq!(ch2.table.len(), 2);
        assert!((ch2.table.entries()[1].millivolts - formula(2200.0, 100.0, 3.365)).abs() < 1e-9);
    }

    #[test]
    fn test_pair_voltage_uses_parallel_resistance() {
        let layout = Layout::build(&config(
            vec![button("a", 1000.0, "AIn_1"), button("b", 2000.0, "AIn_1")],
            vec![vec!["a", "b"]],
        ));
        let table = &layout.channels[0].table;
        assert_eq!(table.len(), 4);

        let pair = &table.entries()[3];
        assert_eq!(pair.down, vec![0, 1]);
        let r = 1.0 / (1.0 / 1000.0 + 1.0 / 2000.0);
        assert!((pair.millivolts - formula(r, 100.0, 3.365)).abs() < 1e-6);
        assert!((r - 666.67).abs() < 0.01);
    }

    #[test]
    fn test_group_produces_every_subset_once() {
        let layout = Layout::build(&config(
            vec![
                button("a", 1000.0, "AIn_1"),
                button("b", 2000.0, "AIn_1"),
                button("c", 4700.0, "AIn_1"),
                button("d", 10000.0, "AIn_1"),
                button("solo", 22000.0, "AIn_1"),
            ],
            vec![vec!["a", "b", "c", "d"]],
        ));
        let channel = &layout.channels[0];
        let non_idle: Vec<&Combination> =
            channel.table.entries().iter().filter(|e| !e.is_idle()).collect();

        // 2^4 - 1 subsets of the group plus the ungrouped singleton
        assert_eq!(non_idle.len(), 15 + 1);

        let sets: HashSet<Vec<usize>> = non_idle.iter().map(|e| e.down.clone()).collect();
        assert_eq!(sets.len(), non_idle.len());

        let solo = channel.position("solo").unwrap();
        assert!(
            non_idle
                .iter()
                .filter(|e| e.contains(solo))
                .all(|e| e.down.len() == 1)
        );
    }

    #[test]
    fn test_overlapping_groups_do_not_duplicate_entries() {
        let layout = Layout::build(&config(
            vec![
                button("a", 1000.0, "AIn_1"),
                button("b", 2000.0, "AIn_1"),
                button("c", 4700.0, "AIn_1"),
            ],
            vec![vec!["a", "b"], vec!["a", "b", "c"]],
        ));
        let table = &layout.channels[0].table;
        // idle + 2^3 - 1
        assert_eq!(table.len(), 8);
        assert!(layout.skipped.is_empty());
    }

    #[test]
    fn test_voltage_rises_as_resistance_falls() {
        let layout = Layout::build(&config(
            vec![
                button("a", 1000.0, "AIn_1"),
                button("b", 2000.0, "AIn_1"),
                button("c", 4700.0, "AIn_1"),
            ],
            vec![vec!["a", "b", "c"]],
        ));
        let channel = &layout.channels[0];
        let mut by_resistance: Vec<(f64, f64)> = channel
            .table
            .entries()
            .iter()
            .map(|e| {
                let rs: Vec<f64> = e.down.iter().map(|b| channel.buttons[*b].resistance).collect();
                (parallel_resistance(&rs), e.millivolts)
            })
            .collect();
        by_resistance.sort_by(|a, b| b.0.total_cmp(&a.0));
        assert!(by_resistance.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_group_spanning_channels_is_skipped() {
        let layout = Layout::build(&config(
            vec![
                button("a", 1000.0, "AIn_1"),
                button("b", 2000.0, "AIn_2"),
                button("c", 4700.0, "AIn_1"),
            ],
            vec![vec!["a", "b"], vec!["a", "c"]],
        ));
        assert_eq!(layout.skipped.len(), 1);
        assert!(matches!(
            &layout.skipped[0],
            ConfigError::GroupSpansChannels { channels, .. } if channels == &vec!["AIn_1".to_string(), "AIn_2".to_string()]
        ));
        // The valid group still produced its pair
        assert_eq!(layout.channels[0].table.len(), 4);
        assert_eq!(layout.channels[1].table.len(), 2);
    }

    #[test]
    fn test_spanning_group_lists_each_channel_once() {
        let layout = Layout::build(&config(
            vec![
                button("a", 1000.0, "AIn_1"),
                button("b", 2000.0, "AIn_2"),
                button("c", 4700.0, "AIn_1"),
            ],
            vec![vec!["a", "b", "c"]],
        ));
        assert_eq!(
            layout.skipped,
            vec![ConfigError::GroupSpansChannels {
                group: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                channels: vec!["AIn_1".to_string(), "AIn_2".to_string()],
            }]
        );
    }

    #[test]
    fn test_invalid_buttons_are_skipped() {
        let layout = Layout::build(&config(
            vec![
                button("a", 1000.0, "AIn_1"),
                button("a", 2000.0, "AIn_1"),
                button("neg", -5.0, "AIn_1"),
                button("nan", f64::NAN, "AIn_1"),
                button("", 100.0, "AIn_1"),
                button("nochan", 100.0, ""),
            ],
            vec![],
        ));
        assert_eq!(layout.skipped.len(), 5);
        assert_eq!(layout.skipped[0], ConfigError::DuplicateButton("a".to_string()));
        assert_eq!(layout.channels.len(), 1);
        assert_eq!(layout.channels[0].buttons.len(), 1);
        assert_eq!(layout.channels[0].buttons[0].resistance, 1000.0);
    }

    #[test]
    fn test_group_with_unknown_or_repeated_button_is_skipped() {
        let layout = Layout::build(&config(
            vec![button("a", 1000.0, "AIn_1"), button("b", 2000.0, "AIn_1")],
            vec![vec!["a", "ghost"], vec!["a", "a"]],
        ));
        assert_eq!(layout.skipped.len(), 2);
        assert!(matches!(
            &layout.skipped[0],
            ConfigError::UnknownButton { button, .. } if button == "ghost"
        ));
        assert!(matches!(
            &layout.skipped[1],
            ConfigError::DuplicateGroupMember { button, .. } if button == "a"
        ));
        assert_eq!(layout.channels[0].table.len(), 3);
    }

    #[test]
    fn test_closest_pair() {
        let mut table = VoltageTable::new(Divider::new(100.0, 3.3));
        table.insert(&[100.0], vec![0]);
        table.insert(&[105.0], vec![1]);
        table.insert(&[1000.0], vec![2]);
        let (a, b, gap) = table.closest_pair().unwrap();
        assert_eq!((a, b), (1, 2));
        let expected = table.entries()[1].millivolts - table.entries()[2].millivolts;
        assert!((gap - expected).abs() < 1e-9);
    }

    #[test]
    fn test_combinations_order() {
        assert_eq!(
            combinations(&[0, 1, 2], 2),
            vec![vec![0, 1], vec![0, 2], vec![1, 2]]
        );
        assert_eq!(combinations(&[0, 1, 2], 3), vec![vec![0, 1, 2]]);
        assert!(combinations(&[0], 2).is_empty());
    }
}
