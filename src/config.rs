use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory and the platform config dir.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = &value[1..value.len() - 1];
            }

            // Env vars already set take precedence
            if std::env::var(key).is_err() {
                // SAFETY: called from main before the tokio runtime is built
                unsafe { std::env::set_var(key, value) };
            }
        }
    }
}

/// Pick the configuration file to load.
///
/// An explicit path always wins. Otherwise `config.json` in the working
/// directory is used if present, then `<config dir>/adc-button-bridge/config.json`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("adc-button-bridge").join(DEFAULT_CONFIG_FILE);
        if candidate.exists() {
            return candidate;
        }
    }

    local
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Prefix of every state/click/availability topic
    pub topic_prefix: String,
    /// Home Assistant discovery prefix
    pub homeassistant_prefix: String,
    /// Appended to every button's unique id
    pub unique_id_suffix: String,
    pub mqtt: MqttConfig,
    pub ladder: LadderConfig,
    /// Default long-press threshold in milliseconds (None or negative disables it)
    pub long_press: Option<i64>,
    pub adc: AdcConfig,
    pub buttons: Vec<ButtonConfig>,
    /// Buttons that can be pressed together, by id
    pub groups: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Electrical and debounce parameters shared by every channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LadderConfig {
    /// Reference resistor of the divider (ohms)
    pub r0: f64,
    /// Nominal supply voltage (volts)
    pub v_nom: f64,
    /// Acceptance distance for a match (millivolts)
    pub v_acc: f64,
    /// Length of the per-channel debounce ring
    pub max_readings: usize,
    /// Agreeing readings required before a combination is accepted
    pub eq_readings: usize,
    /// Sampling period (milliseconds)
    pub cycle_time_ms: u64,
}

/// Where raw analog values are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdcConfig {
    /// File path with `{channel}` replaced by the channel id
    pub path_template: String,
    /// Multiplier turning the raw value into millivolts
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonConfig {
    pub id: String,
    /// Series resistance (ohms)
    pub r: f64,
    pub channel: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Long-press threshold in milliseconds, overrides the global default; -1 disables
    #[serde(default)]
    pub long_press: Option<i64>,
    #[serde(default)]
    pub unique_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic_prefix: "pi/io".to_string(),
            homeassistant_prefix: "homeassistant".to_string(),
            unique_id_suffix: "_radcab".to_string(),
            mqtt: MqttConfig::default(),
            ladder: LadderConfig::default(),
            long_press: None,
            adc: AdcConfig::default(),
            buttons: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: format!(
                "adc-button-bridge-{}",
                gethostname::gethostname().to_string_lossy()
            ),
            username: None,
            password: None,
        }
    }
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            r0: 100.0,
            v_nom: 3.365,
            v_acc: 80.0,
            max_readings: 2,
            eq_readings: 2,
            cycle_time_ms: 15,
        }
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            path_template: "/sys/bus/iio/devices/iio:device0/in_voltage{channel}_raw".to_string(),
            scale: 1.0,
        }
    }
}

impl Config {
    /// Read, parse and validate a configuration file, then apply env overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| BridgeError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Config =
            serde_json::from_str(&content).map_err(|source| BridgeError::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Override MQTT settings from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("MQTT_BROKER_HOST") {
            self.mqtt.broker_host = host;
        }
        if let Ok(port) = std::env::var("MQTT_BROKER_PORT")
            && let Ok(p) = port.parse()
        {
            self.mqtt.broker_port = p;
        }
        if let Ok(client_id) = std::env::var("MQTT_CLIENT_ID") {
            self.mqtt.client_id = client_id;
        }
        if let Ok(username) = std::env::var("MQTT_USERNAME") {
            self.mqtt.username = Some(username);
        }
        if let Ok(password) = std::env::var("MQTT_PASSWORD") {
            self.mqtt.password = Some(password);
        }
    }

    /// Check the settings the whole bridge depends on.
    ///
    /// Problems with individual buttons or groups are not checked here; the
    /// panel skips those entries and keeps going.
    pub fn validate(&self) -> Result<()> {
        let ladder = &self.ladder;
        if !(ladder.r0.is_finite() && ladder.r0 > 0.0) {
            return Err(BridgeError::InvalidConfig(format!(
                "ladder.r0 must be positive, got {}",
                ladder.r0
            )));
        }
        if !(ladder.v_nom.is_finite() && ladder.v_nom > 0.0) {
            return Err(BridgeError::InvalidConfig(format!(
                "ladder.v_nom must be positive, got {}",
                ladder.v_nom
            )));
        }
        if !(ladder.v_acc.is_finite() && ladder.v_acc > 0.0) {
            return Err(BridgeError::InvalidConfig(format!(
                "ladder.v_acc must be positive, got {}",
                ladder.v_acc
            )));
        }
        if ladder.max_readings == 0 {
            return Err(BridgeError::InvalidConfig(
                "ladder.max_readings must be at least 1".to_string(),
            ));
        }
        if ladder.eq_readings == 0 || ladder.eq_readings > ladder.max_readings {
            return Err(BridgeError::InvalidConfig(format!(
                "ladder.eq_readings must be between 1 and max_readings ({}), got {}",
                ladder.max_readings, ladder.eq_readings
            )));
        }
        if ladder.cycle_time_ms == 0 {
            return Err(BridgeError::InvalidConfig(
                "ladder.cycle_time_ms must be at least 1".to_string(),
            ));
        }
        if !(self.adc.scale.is_finite() && self.adc.scale != 0.0) {
            return Err(BridgeError::InvalidConfig(format!(
                "adc.scale must be a non-zero number, got {}",
                self.adc.scale
            )));
        }
        Ok(())
    }

    pub fn cycle_time(&self) -> Duration {
        Duration::from_millis(self.ladder.cycle_time_ms)
    }
}

impl ButtonConfig {
    /// Long-press threshold after applying the global default.
    pub fn long_press_threshold(&self, default: Option<i64>) -> Option<Duration> {
        match self.long_press.or(default) {
            Some(ms) if ms >= 0 => Some(Duration::from_millis(ms as u64)),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Unique id used for discovery, with `/` replaced and the suffix appended.
    pub fn unique_id(&self, suffix: &str) -> String {
        let base = self
            .unique_id
            .clone()
            .unwrap_or_else(|| self.id.replace('/', "_"));
        format!("{}{}", base, suffix)
    }
}
