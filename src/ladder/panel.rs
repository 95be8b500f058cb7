//! Runtime state of every channel and the per-cycle processing pipeline.

use super::classifier::Classifier;
use super::debounce::{DebounceWindow, Reading};
use super::model::{ButtonSpec, Layout, VoltageTable};
use super::state_machine::{ButtonEvent, ButtonMachine, ButtonState};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::input::Sampler;
use log::{Level, debug, info, log_enabled, warn};
use std::time::Instant;

/// One analog input with its buttons, table and debounce ring.
#[derive(Debug, Clone)]
pub struct Channel {
    id: String,
    buttons: Vec<ButtonSpec>,
    machines: Vec<ButtonMachine>,
    table: VoltageTable,
    window: DebounceWindow,
    read_failing: bool,
}

impl Channel {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn buttons(&self) -> &[ButtonSpec] {
        &self.buttons
    }

    pub fn table(&self) -> &VoltageTable {
        &self.table
    }

    /// Runtime state of a button by id.
    pub fn button_state(&self, button_id: &str) -> Option<ButtonState> {
        self.buttons
            .iter()
            .position(|b| b.id == button_id)
            .map(|i| self.machines[i].state())
    }

    /// Feed one sample through classification, debounce and the button
    /// state machines. `None` stands for a failed read.
    fn process(
        &mut self,
        classifier: &Classifier,
        millivolts: Option<f64>,
        now: Instant,
        events: &mut Vec<ButtonEvent>,
    ) {
        let reading: Reading = millivolts.and_then(|v| classifier.classify(&self.table, v));

        if let (Some(v), Some(index)) = (millivolts, reading)
            && log_enabled!(Level::Debug)
        {
            let entry = &self.table.entries()[index];
            if !entry.is_idle() {
                debug!(
                    "[Ladder] On channel {} read value {}, closest buttons: {}",
                    self.id,
                    v,
                    entry
                        .down
                        .iter()
                        .map(|b| self.buttons[*b].id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }

        if !self.window.push(reading) {
            return;
        }
        let Some(index) = reading else {
            return;
        };
        let combination = &self.table.entries()[index];

        for (i, machine) in self.machines.iter_mut().enumerate() {
            for kind in machine.update(combination.contains(i), now) {
                debug!("[Ladder] Button {}: {:?}", self.buttons[i].id, kind);
                events.push(ButtonEvent::new(self.buttons[i].id.clone(), kind));
            }
        }
    }
}

/// All channels of the bridge, built once from the configuration.
#[derive(Debug, Clone)]
pub struct ButtonPanel {
    channels: Vec<Channel>,
    classifier: Classifier,
    skipped: Vec<ConfigError>,
}

impl ButtonPanel {
    /// Build voltage tables and initial button state.
    ///
    /// Fails only on settings that affect every channel. Invalid buttons
    /// and groups are skipped and reported by [`ButtonPanel::skipped`].
    pub fn initialize(config: &Config) -> Result<Self> {
        config.validate()?;

        let layout = Layout::build(config);
        let channels: Vec<Channel> = layout
            .channels
            .into_iter()
            .map(|c| Channel {
                machines: c
                    .buttons
                    .iter()
                    .map(|b| ButtonMachine::new(b.long_press))
                    .collect(),
                id: c.id,
                buttons: c.buttons,
                table: c.table,
                window: DebounceWindow::new(
                    config.ladder.max_readings,
                    config.ladder.eq_readings,
                ),
                read_failing: false,
            })
            .collect();

        if !layout.skipped.is_empty() {
            warn!(
                "[Ladder] {} configuration entr{} skipped",
                layout.skipped.len(),
                if layout.skipped.len() == 1 { "y" } else { "ies" }
            );
        }
        info!(
            "[Ladder] {} button(s) on {} channel(s)",
            channels.iter().map(|c| c.buttons.len()).sum::<usize>(),
            channels.len()
        );

        Ok(Self {
            channels,
            classifier: Classifier::new(config.ladder.v_acc),
            skipped: layout.skipped,
        })
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Every configured button, channel by channel.
    pub fn buttons(&self) -> impl Iterator<Item = &ButtonSpec> {
        self.channels.iter().flat_map(|c| c.buttons.iter())
    }

    /// Configuration entries rejected during initialization.
    pub fn skipped(&self) -> &[ConfigError] {
        &self.skipped
    }

    pub fn button_state(&self, button_id: &str) -> Option<ButtonState> {
        self.channels
            .iter()
            .find_map(|c| c.button_state(button_id))
    }

    /// Sample and process every channel once.
    pub fn tick<S: Sampler + ?Sized>(&mut self, sampler: &mut S) -> Vec<ButtonEvent> {
        self.tick_at(sampler, Instant::now())
    }

    /// Like [`ButtonPanel::tick`], with an explicit timestamp for long-press timing.
    pub fn tick_at<S: Sampler + ?Sized>(
        &mut self,
        sampler: &mut S,
        now: Instant,
    ) -> Vec<ButtonEvent> {
        let mut events = Vec::new();
        for channel in &mut self.channels {
            let sample = match sampler.sample(&channel.id) {
                Ok(v) => {
                    if channel.read_failing {
                        info!("[Ladder] Channel {} readable again", channel.id);
                        channel.read_failing = false;
                    }
                    Some(v)
                }
                Err(e) => {
                    if !channel.read_failing {
                        warn!("[Ladder] Channel {}: {}", channel.id, e);
                        channel.read_failing = true;
                    }
                    None
                }
            };
            channel.process(&self.classifier, sample, now, &mut events);
        }
        events
    }
}
