use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("MQTT client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error(transparent)]
    InstanceLock(#[from] crate::instance_lock::InstanceLockError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

/// A single button or group entry rejected while building the panel.
///
/// These are logged and skipped; the rest of the configuration still loads.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("button {0:?} is defined more than once")]
    DuplicateButton(String),

    #[error("button {id:?} has an invalid resistance {r}")]
    InvalidResistance { id: String, r: f64 },

    #[error("button {0:?} has an empty channel")]
    EmptyChannel(String),

    #[error("a button has an empty id")]
    EmptyButtonId,

    #[error("group {group:?} references unknown button {button:?}")]
    UnknownButton { group: Vec<String>, button: String },

    #[error("group {group:?} lists button {button:?} more than once")]
    DuplicateGroupMember { group: Vec<String>, button: String },

    #[error("group {group:?} has more than {max} buttons")]
    GroupTooLarge { group: Vec<String>, max: usize },

    #[error("all buttons in group {group:?} must share a channel, found {channels:?}")]
    GroupSpansChannels {
        group: Vec<String>,
        channels: Vec<String>,
    },
}

/// Failure reading a raw value from an analog input.
#[derive(ThisError, Debug)]
pub enum SampleError {
    #[error("no analog input for channel {0:?}")]
    UnknownChannel(String),

    #[error("failed to read analog input {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analog input {path} returned a non-numeric value {value:?}")]
    Parse { path: String, value: String },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
