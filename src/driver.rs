//! One sampling cycle: read every channel, decode, publish.

use crate::input::Sampler;
use crate::ladder::{ButtonEvent, ButtonPanel};
use crate::output::{Availability, Publisher, forward};
use std::time::Instant;

/// Owns the panel, the analog input and the publisher for the cycle task.
pub struct CycleDriver<S, P> {
    panel: ButtonPanel,
    sampler: S,
    publisher: P,
}

impl<S: Sampler, P: Publisher> CycleDriver<S, P> {
    pub fn new(panel: ButtonPanel, sampler: S, publisher: P) -> Self {
        Self {
            panel,
            sampler,
            publisher,
        }
    }

    /// Run one cycle now and publish whatever it produced.
    pub fn run_cycle(&mut self) -> Vec<ButtonEvent> {
        self.run_cycle_at(Instant::now())
    }

    pub fn run_cycle_at(&mut self, now: Instant) -> Vec<ButtonEvent> {
        let events = self.panel.tick_at(&mut self.sampler, now);
        for event in &events {
            forward(&mut self.publisher, event);
        }
        events
    }

    /// Publish the same availability for every button.
    pub fn announce(&mut self, availability: Availability) {
        for button in self.panel.buttons() {
            self.publisher.publish_availability(&button.id, availability);
        }
    }

    pub fn panel(&self) -> &ButtonPanel {
        &self.panel
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }
}
