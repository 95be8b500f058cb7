//! Event sinks.
//!
//! The cycle hands every [`ButtonEvent`] to a [`Publisher`]. Publishing is
//! fire-and-forget: implementations report their own failures and never
//! hand them back to the decoding pipeline.

pub mod mqtt;

use crate::ladder::{ButtonEvent, ClickType, SwitchState};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Payload of the availability topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Availability {
    Online,
    Offline,
}

/// Destination for button state, clicks and availability.
pub trait Publisher {
    fn publish_state(&mut self, button: &str, state: SwitchState);

    fn publish_click(&mut self, button: &str, click: ClickType);

    fn publish_availability(&mut self, button: &str, availability: Availability);
}

/// Forward one event as a state update or a click.
pub fn forward<P: Publisher + ?Sized>(publisher: &mut P, event: &ButtonEvent) {
    if let Some(state) = event.kind.switch_state() {
        publisher.publish_state(&event.button, state);
    }
    if let Some(click) = event.kind.click() {
        publisher.publish_click(&event.button, click);
    }
}

/// A publish call captured by [`RecordingPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    State(String, SwitchState),
    Click(String, ClickType),
    Availability(String, Availability),
}

/// Publisher that keeps everything in memory, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    pub published: Vec<Published>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return and clear everything recorded so far.
    pub fn take(&mut self) -> Vec<Published> {
        std::mem::take(&mut self.published)
    }
}

impl Publisher for RecordingPublisher {
    fn publish_state(&mut self, button: &str, state: SwitchState) {
        self.published
            .push(Published::State(button.to_string(), state));
    }

    fn publish_click(&mut self, button: &str, click: ClickType) {
        self.published
            .push(Published::Click(button.to_string(), click));
    }

    fn publish_availability(&mut self, button: &str, availability: Availability) {
        self.published
            .push(Published::Availability(button.to_string(), availability));
    }
}
