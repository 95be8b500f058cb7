//! Home Assistant MQTT discovery payloads.
//!
//! Each button is announced twice: as a `binary_sensor` following the state
//! topic, and as a `device_automation` trigger per click type so automations
//! can react to `click` and `hold`.
//!
//! See <https://www.home-assistant.io/integrations/mqtt/#mqtt-discovery>.

use super::topics::Topics;
use crate::ladder::{ButtonSpec, ClickType, SwitchState};
use serde::Serialize;

const MANUFACTURER: &str = "KUNBUS GmbH";
const MODEL: &str = "RevPi Analog Buttons";
const SW_VERSION: &str = "radcab";

/// A retained discovery message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub payload: String,
}

#[derive(Debug, Clone, Serialize)]
struct DeviceInfo<'a> {
    identifiers: [&'a str; 1],
    manufacturer: &'static str,
    model: &'static str,
    name: String,
    sw_version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct AvailabilityTopic {
    topic: String,
}

#[derive(Debug, Clone, Serialize)]
struct BinarySensorConfig<'a> {
    unique_id: &'a str,
    name: String,
    state_topic: String,
    payload_on: &'static str,
    payload_off: &'static str,
    availability: Vec<AvailabilityTopic>,
    device: DeviceInfo<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct DeviceTriggerConfig<'a> {
    automation_type: &'static str,
    device: DeviceInfo<'a>,
    topic: String,
    payload: &'static str,
    #[serde(rename = "type")]
    trigger_type: &'static str,
    subtype: &'static str,
}

/// Builds discovery messages for buttons.
#[derive(Debug, Clone)]
pub struct Discovery {
    homeassistant_prefix: String,
    topics: Topics,
}

impl Discovery {
    pub fn new(homeassistant_prefix: impl Into<String>, topics: Topics) -> Self {
        Self {
            homeassistant_prefix: homeassistant_prefix.into(),
            topics,
        }
    }

    fn device<'a>(&self, button: &'a ButtonSpec) -> DeviceInfo<'a> {
        DeviceInfo {
            identifiers: [button.unique_id.as_str()],
            manufacturer: MANUFACTURER,
            model: MODEL,
            name: format!("{}_button", button.name),
            sw_version: SW_VERSION,
        }
    }

    /// Binary sensor mirroring the button's down/up state.
    pub fn binary_sensor(&self, button: &ButtonSpec) -> Result<DiscoveryMessage, serde_json::Error> {
        let config = BinarySensorConfig {
            unique_id: &button.unique_id,
            name: format!("{}_button", button.name),
            state_topic: self.topics.state(&button.id),
            payload_on: SwitchState::Down.into(),
            payload_off: SwitchState::Up.into(),
            availability: vec![
                AvailabilityTopic {
                    topic: self.topics.bridge(),
                },
                AvailabilityTopic {
                    topic: self.topics.availability(&button.id),
                },
            ],
            device: self.device(button),
        };
        Ok(DiscoveryMessage {
            topic: format!(
                "{}/binary_sensor/{}/config",
                self.homeassistant_prefix, button.unique_id
            ),
            payload: serde_json::to_string(&config)?,
        })
    }

    /// Device trigger firing on one click type.
    pub fn trigger(
        &self,
        button: &ButtonSpec,
        click: ClickType,
    ) -> Result<DiscoveryMessage, serde_json::Error> {
        let press_type: &'static str = click.into();
        let config = DeviceTriggerConfig {
            automation_type: "trigger",
            device: self.device(button),
            topic: self.topics.click(&button.id),
            payload: press_type,
            trigger_type: "click",
            subtype: press_type,
        };
        Ok(DiscoveryMessage {
            topic: format!(
                "{}/device_automation/{}/{}/config",
                self.homeassistant_prefix, button.unique_id, press_type
            ),
            payload: serde_json::to_string(&config)?,
        })
    }

    /// Every discovery message for a button.
    pub fn messages(&self, button: &ButtonSpec) -> Result<Vec<DiscoveryMessage>, serde_json::Error> {
        Ok(vec![
            self.trigger(button, ClickType::Click)?,
            self.trigger(button, ClickType::Hold)?,
            self.binary_sensor(button)?,
        ])
    }
}
