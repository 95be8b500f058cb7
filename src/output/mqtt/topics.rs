//! Topic layout under the configured prefix.

/// Builds the per-button and bridge topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// `down` / `up`
    pub fn state(&self, button: &str) -> String {
        format!("{}/{}/state", self.prefix, button)
    }

    /// `click` / `hold`
    pub fn click(&self, button: &str) -> String {
        format!("{}/{}/click", self.prefix, button)
    }

    /// `online` / `offline`, retained
    pub fn availability(&self, button: &str) -> String {
        format!("{}/{}/availability", self.prefix, button)
    }

    /// Availability of the whole bridge, also the last will
    pub fn bridge(&self) -> String {
        format!("{}/bridge/state", self.prefix)
    }
}
