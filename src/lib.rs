//! ADC Button Bridge library.
//!
//! Decodes buttons wired as a resistor ladder onto analog inputs and
//! publishes their state and clicks to MQTT with Home Assistant discovery.

pub mod bridge;
pub mod config;
pub mod driver;
pub mod error;
pub mod input;
pub mod instance_lock;
pub mod ladder;
pub mod output;
