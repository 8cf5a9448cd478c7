use serde::{Deserialize, Serialize};

const DEFAULT_BATCH_SIZE: usize = 1000;

/// Settings of a send session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SyncConfig {
    /// Maximum number of operations per batch handed to the transport.
    pub batch_size: usize,
    /// Records the source location of every sent op and ships it with the
    /// batch, so a receiver that desynchronizes can name the sending codec.
    pub trace: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, trace: false }
    }
}

impl SyncConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    pub fn with_trace(self, trace: bool) -> Self {
        Self { trace, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_defaults() {
        assert_eq!(SyncConfig::from_json("{}").unwrap(), SyncConfig::default());

        let config = SyncConfig::from_json(r#"{ "batch-size": 16, "trace": true }"#).unwrap();
        assert_eq!(config, SyncConfig { batch_size: 16, trace: true });

        assert!(SyncConfig::from_json(r#"{ "batch-size": "many" }"#).is_err());
    }
}
