//! Per-button press/release and click detection.
//!
//! A button is driven only by accepted combinations. Buttons without a
//! long-press threshold report a click the moment they go down. Buttons with
//! a threshold report a click on release if they were let go in time, or a
//! hold once the threshold elapses while still down.

use std::time::{Duration, Instant};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Runtime state of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Up,
    /// Down with long press disabled
    DownUntimed,
    /// Down since the given instant, long press pending
    DownTimed(Instant),
    /// Down and the long press has already been reported
    DownFired,
}

impl ButtonState {
    pub fn is_down(&self) -> bool {
        !matches!(self, ButtonState::Up)
    }
}

/// Payload of the state topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SwitchState {
    Down,
    Up,
}

/// Payload of the click topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ClickType {
    /// Short press
    Click,
    /// Long press
    Hold,
}

/// What happened to a button during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Pressed,
    Released,
    ShortClick,
    LongClick,
}

impl EventKind {
    /// State topic payload for press/release events.
    pub fn switch_state(&self) -> Option<SwitchState> {
        match self {
            EventKind::Pressed => Some(SwitchState::Down),
            EventKind::Released => Some(SwitchState::Up),
            _ => None,
        }
    }

    /// Click topic payload for click events.
    pub fn click(&self) -> Option<ClickType> {
        match self {
            EventKind::ShortClick => Some(ClickType::Click),
            EventKind::LongClick => Some(ClickType::Hold),
            _ => None,
        }
    }
}

/// An event for a specific button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: String,
    pub kind: EventKind,
}

impl ButtonEvent {
    pub fn new(button: impl Into<String>, kind: EventKind) -> Self {
        Self {
            button: button.into(),
            kind,
        }
    }
}

/// Click state machine of a single button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMachine {
    state: ButtonState,
    long_press: Option<Duration>,
}

impl ButtonMachine {
    pub fn new(long_press: Option<Duration>) -> Self {
        Self {
            state: ButtonState::Up,
            long_press,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn long_press(&self) -> Option<Duration> {
        self.long_press
    }

    /// Advance with the accepted membership of this button.
    ///
    /// Returns the events in the order they should be published.
    pub fn update(&mut self, pressed: bool, now: Instant) -> Vec<EventKind> {
        match (self.state, pressed) {
            (ButtonState::Up, true) => match self.long_press {
                Some(_) => {
                    self.state = ButtonState::DownTimed(now);
                    vec![EventKind::Pressed]
                }
                None => {
                    self.state = ButtonState::DownUntimed;
                    vec![EventKind::Pressed, EventKind::ShortClick]
                }
            },
            (ButtonState::Up, false) => Vec::new(),
            (ButtonState::DownTimed(_), false) => {
                self.state = ButtonState::Up;
                vec![EventKind::Released, EventKind::ShortClick]
            }
            (ButtonState::DownUntimed | ButtonState::DownFired, false) => {
                self.state = ButtonState::Up;
                vec![EventKind::Released]
            }
            (ButtonState::DownTimed(since), true) => match self.long_press {
                Some(threshold) if now.saturating_duration_since(since) >= threshold => {
                    self.state = ButtonState::DownFired;
                    vec![EventKind::LongClick]
                }
                _ => Vec::new(),
            },
            (ButtonState::DownUntimed | ButtonState::DownFired, true) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_payloads() {
        assert_eq!(SwitchState::Down.as_ref(), "down");
        assert_eq!(SwitchState::Up.to_string(), "up");
        assert_eq!(ClickType::Click.as_ref(), "click");
        assert_eq!(ClickType::Hold.as_ref(), "hold");
    }

    #[test]
    fn test_without_long_press_clicks_on_press() {
        let t0 = Instant::now();
        let mut machine = ButtonMachine::new(None);

        assert_eq!(
            machine.update(true, t0),
            vec![EventKind::Pressed, EventKind::ShortClick]
        );
        assert_eq!(machine.state(), ButtonState::DownUntimed);

        assert!(machine.update(true, t0 + ms(5000)).is_empty());

        assert_eq!(machine.update(false, t0 + ms(6000)), vec![EventKind::Released]);
        assert_eq!(machine.state(), ButtonState::Up);
    }

    #[test]
    fn test_hold_past_threshold_fires_once() {
        let t0 = Instant::now();
        let mut machine = ButtonMachine::new(Some(ms(500)));

        assert_eq!(machine.update(true, t0), vec![EventKind::Pressed]);
        assert_eq!(machine.state(), ButtonState::DownTimed(t0));

        assert!(machine.update(true, t0 + ms(15)).is_empty());
        assert!(machine.update(true, t0 + ms(499)).is_empty());
        assert_eq!(machine.update(true, t0 + ms(500)), vec![EventKind::LongClick]);
        assert_eq!(machine.state(), ButtonState::DownFired);
        assert!(machine.update(true, t0 + ms(515)).is_empty());
        assert!(machine.update(true, t0 + ms(5000)).is_empty());

        assert_eq!(machine.update(false, t0 + ms(5015)), vec![EventKind::Released]);
        assert_eq!(machine.state(), ButtonState::Up);
    }

    #[test]
    fn test_release_before_threshold_is_short_click() {
        let t0 = Instant::now();
        let mut machine = ButtonMachine::new(Some(ms(500)));

        assert_eq!(machine.update(true, t0), vec![EventKind::Pressed]);
        assert!(machine.update(true, t0 + ms(200)).is_empty());
        assert_eq!(
            machine.update(false, t0 + ms(300)),
            vec![EventKind::Released, EventKind::ShortClick]
        );
    }

    #[test]
    fn test_idle_button_emits_nothing() {
        let mut machine = ButtonMachine::new(Some(ms(500)));
        assert!(machine.update(false, Instant::now()).is_empty());
        assert_eq!(machine.state(), ButtonState::Up);
    }

    #[test]
    fn test_zero_threshold_holds_on_next_accepted_tick() {
        let t0 = Instant::now();
        let mut machine = ButtonMachine::new(Some(Duration::ZERO));
        assert_eq!(machine.update(true, t0), vec![EventKind::Pressed]);
        assert_eq!(machine.update(true, t0), vec![EventKind::LongClick]);
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(EventKind::Pressed.switch_state(), Some(SwitchState::Down));
        assert_eq!(EventKind::Released.switch_state(), Some(SwitchState::Up));
        assert_eq!(EventKind::ShortClick.switch_state(), None);
        assert_eq!(EventKind::ShortClick.click(), Some(ClickType::Click));
        assert_eq!(EventKind::LongClick.click(), Some(ClickType::Hold));
        assert_eq!(EventKind::Pressed.click(), None);
    }
}
