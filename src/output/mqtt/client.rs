//! MQTT client wrapper and the publisher used by the cycle.

use super::discovery::DiscoveryMessage;
use super::topics::Topics;
use crate::config::MqttConfig;
use crate::error::Result;
use crate::ladder::{ClickType, SwitchState};
use crate::output::{Availability, Publisher};
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc;

/// Outgoing requests buffered between the cycle and the event loop, on top
/// of the burst sent on every connection.
const REQUEST_CAPACITY: usize = 256;

/// Discovery configs plus availability sent per button on every connection.
const MESSAGES_PER_BUTTON: usize = 4;

/// Request queue size for a bridge with `buttons` buttons.
///
/// The connection burst (`MESSAGES_PER_BUTTON` per button and the bridge
/// availability) always fits next to the regular cycle traffic.
pub fn request_capacity(buttons: usize) -> usize {
    buttons * MESSAGES_PER_BUTTON + 1 + REQUEST_CAPACITY
}

/// MQTT client for the bridge.
pub struct MqttClient {
    client: AsyncClient,
    event_loop: EventLoop,
}

impl MqttClient {
    /// Create a new MQTT client from configuration.
    ///
    /// The bridge availability topic is registered as last will so the broker
    /// marks every button unavailable if the process dies.
    pub fn new(config: &MqttConfig, topics: &Topics, buttons: usize) -> Self {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(60));
        options.set_last_will(LastWill::new(
            topics.bridge(),
            Availability::Offline.as_ref(),
            QoS::AtMostOnce,
            true,
        ));

        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.as_deref().unwrap_or(""));
        }

        let (client, event_loop) = AsyncClient::new(options, request_capacity(buttons));

        Self { client, event_loop }
    }

    /// Run the MQTT event loop, signalling every (re)connection on `connected`.
    ///
    /// This method runs until `connected` is closed.
    pub async fn run(mut self, connected: mpsc::Sender<()>) {
        info!("[MQTT] Starting event loop");

        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("[MQTT] Connected with result code {:?}", ack.code);
                    if connected.send(()).await.is_err() {
                        debug!("[MQTT] Connection listener closed");
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("[MQTT] Connection error: {:?}", e);
                    if connected.is_closed() {
                        break;
                    }
                    // Wait before reconnecting
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    /// Get a clone of the async client for publishing from other tasks.
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }
}

/// [`Publisher`] over MQTT.
///
/// Uses `try_publish` so a slow or absent broker never stalls the cycle;
/// messages that do not fit the request queue are dropped with a warning.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    topics: Topics,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient, topics: Topics) -> Self {
        Self { client, topics }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    fn send(&self, topic: String, payload: &str, retain: bool) {
        debug!(
            "[MQTT] Broadcasting message on topic: {}, value: {}",
            topic, payload
        );
        if let Err(e) = self
            .client
            .try_publish(&topic, QoS::AtMostOnce, retain, payload.as_bytes())
        {
            warn!("[MQTT] Failed to publish to {}: {:?}", topic, e);
        }
    }

    /// Publish the availability of the whole bridge.
    pub fn publish_bridge_availability(&mut self, availability: Availability) {
        self.send(self.topics.bridge(), availability.as_ref(), true);
    }

    /// Publish retained discovery configuration.
    ///
    /// Waits for room in the request queue instead of dropping the message.
    pub async fn publish_discovery(&self, message: &DiscoveryMessage) -> Result<()> {
        debug!("[MQTT] Publishing discovery config to {}", message.topic);
        self.client
            .publish(
                message.topic.as_str(),
                QoS::AtMostOnce,
                true,
                message.payload.as_bytes(),
            )
            .await?;
        Ok(())
    }

    /// Ask the event loop to send DISCONNECT.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            warn!("[MQTT] Failed to disconnect: {:?}", e);
        }
    }
}

impl Publisher for MqttPublisher {
    fn publish_state(&mut self, button: &str, state: SwitchState) {
        self.send(self.topics.state(button), state.as_ref(), false);
    }

    fn publish_click(&mut self, button: &str, click: ClickType) {
        self.send(self.topics.click(button), click.as_ref(), false);
    }

    fn publish_availability(&mut self, button: &str, availability: Availability) {
        self.send(self.topics.availability(button), availability.as_ref(), true);
    }
}
