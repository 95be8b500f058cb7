//! Analog input sources.
//!
//! - `adc`: the [`Sampler`] trait and the sysfs file reader used on hardware
//! - `simulation`: scripted samples for tests and dry runs

pub mod adc;
pub mod simulation;

pub use adc::{Sampler, SysfsSampler};
pub use simulation::ScriptedSampler;
