//! MQTT output with Home Assistant discovery.

mod client;
pub mod discovery;
pub mod topics;

pub use client::{MqttClient, MqttPublisher};
pub use discovery::{Discovery, DiscoveryMessage};
pub use topics::Topics;
