//! Bridge runtime: MQTT connection, periodic cycle and shutdown.

use crate::config::Config;
use crate::driver::CycleDriver;
use crate::error::Result;
use crate::input::Sampler;
use crate::ladder::ButtonPanel;
use crate::output::Availability;
use crate::output::mqtt::{Discovery, MqttClient, MqttPublisher, Topics};
use log::{info, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Grace period for the event loop to flush the final messages.
const SHUTDOWN_FLUSH: Duration = Duration::from_millis(500);

/// Resolves when the process is asked to stop (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn announce_discovery(
    discovery: &Discovery,
    driver: &mut CycleDriver<impl Sampler, MqttPublisher>,
) {
    let buttons: Vec<_> = driver.panel().buttons().cloned().collect();
    for button in &buttons {
        match discovery.messages(button) {
            Ok(messages) => {
                for message in &messages {
                    if let Err(e) = driver.publisher().publish_discovery(message).await {
                        warn!("[MQTT] Failed to publish discovery for {}: {}", button.id, e);
                    }
                }
            }
            Err(e) => warn!(
                "[MQTT] Failed to build discovery config for {}: {}",
                button.id, e
            ),
        }
    }
    driver.announce(Availability::Online);
    driver
        .publisher_mut()
        .publish_bridge_availability(Availability::Online);
}

/// Run the bridge until a shutdown signal arrives.
///
/// Every cycle samples all channels on the cycle task itself. On each broker
/// connection the discovery configuration and `online` availability are
/// (re)published. On shutdown every button and the bridge go `offline`.
pub async fn run<S: Sampler>(config: &Config, sampler: S) -> Result<()> {
    let panel = ButtonPanel::initialize(config)?;
    let topics = Topics::new(config.topic_prefix.clone());
    let discovery = Discovery::new(config.homeassistant_prefix.clone(), topics.clone());

    info!(
        "[MQTT] Connecting to {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );
    let mqtt_client = MqttClient::new(&config.mqtt, &topics, panel.buttons().count());
    let publisher = MqttPublisher::new(mqtt_client.client(), topics);

    let (connected_tx, mut connected_rx) = mpsc::channel::<()>(4);
    let mqtt_loop = tokio::spawn(async move {
        mqtt_client.run(connected_tx).await;
    });

    let mut driver = CycleDriver::new(panel, sampler, publisher);

    let mut interval = tokio::time::interval(config.cycle_time());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "[Cycle] Running every {}ms, press Ctrl+C to exit",
        config.ladder.cycle_time_ms
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
            Some(()) = connected_rx.recv() => {
                announce_discovery(&discovery, &mut driver).await;
            }
            _ = interval.tick() => {
                driver.run_cycle();
            }
        }
    }

    info!("stopping");
    driver
        .publisher_mut()
        .publish_bridge_availability(Availability::Offline);
    driver.announce(Availability::Offline);
    driver.publisher().disconnect().await;

    tokio::time::sleep(SHUTDOWN_FLUSH).await;
    mqtt_loop.abort();
    info!("stopped");
    Ok(())
}
