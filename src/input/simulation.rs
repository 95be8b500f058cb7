//! Scripted analog input for testing and dry runs.
//!
//! Each channel holds a steady level plus an optional queue of one-shot
//! samples that are returned first.

use super::adc::Sampler;
use crate::error::SampleError;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Default)]
struct ScriptedChannel {
    queued: VecDeque<f64>,
    level: Option<f64>,
}

/// Sampler returning values set by the caller.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    channels: HashMap<String, ScriptedChannel>,
    reads: usize,
}

impl ScriptedSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold a channel at a steady level, dropping any queued samples.
    pub fn set(&mut self, channel: &str, millivolts: f64) {
        let entry = self.channels.entry(channel.to_string()).or_default();
        entry.queued.clear();
        entry.level = Some(millivolts);
    }

    /// Queue a one-shot sample returned before the steady level.
    pub fn push(&mut self, channel: &str, millivolts: f64) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .queued
            .push_back(millivolts);
    }

    /// Make a channel fail its reads.
    pub fn disconnect(&mut self, channel: &str) {
        self.channels.remove(channel);
    }

    /// Total number of samples taken.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Sampler for ScriptedSampler {
    fn sample(&mut self, channel: &str) -> Result<f64, SampleError> {
        self.reads += 1;
        let entry = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| SampleError::UnknownChannel(channel.to_string()))?;
        if let Some(value) = entry.queued.pop_front() {
            return Ok(value);
        }
        entry
            .level
            .ok_or_else(|| SampleError::UnknownChannel(channel.to_string()))
    }
}
