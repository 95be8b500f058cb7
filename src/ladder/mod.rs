//! Resistor-ladder decoding.
//!
//! Pipeline per channel and cycle: raw sample → [`Classifier`] against the
//! channel's [`VoltageTable`] → [`DebounceWindow`] → (on consensus)
//! [`ButtonMachine`] per button → [`ButtonEvent`]s.

pub mod classifier;
pub mod debounce;
pub mod model;
pub mod panel;
pub mod state_machine;

pub use classifier::Classifier;
pub use debounce::{DebounceWindow, Reading};
pub use model::{ButtonSpec, ChannelLayout, Combination, Divider, Layout, VoltageTable};
pub use panel::{ButtonPanel, Channel};
pub use state_machine::{ButtonEvent, ButtonMachine, ButtonState, ClickType, EventKind, SwitchState};
