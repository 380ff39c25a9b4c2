//! Application configuration loaded from environment variables.

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `ACCOUNT_STREAM` — stream carrying account events (default: `"account-events"`)
/// - `TRANSACTION_STREAM` — stream carrying transaction events (default: `"transaction-events"`)
/// - `CONSUMER_GROUP` — choreography consumer group (default: `"transaction-choreography"`)
/// - `CONSUMER_NAME` — this instance's name in the group (default: `"worker-1"`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub account_stream: String,
    pub transaction_stream: String,
    pub consumer_group: String,
    pub consumer_name: String,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            account_stream: std::env::var("ACCOUNT_STREAM")
                .unwrap_or_else(|_| "account-events".to_string()),
            transaction_stream: std::env::var("TRANSACTION_STREAM")
                .unwrap_or_else(|_| "transaction-events".to_string()),
            consumer_group: std::env::var("CONSUMER_GROUP")
                .unwrap_or_else(|_| "transaction-choreography".to_string()),
            consumer_name: std::env::var("CONSUMER_NAME")
                .unwrap_or_else(|_| "worker-1".to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_stream: "account-events".to_string(),
            transaction_stream: "transaction-events".to_string(),
            consumer_group: "transaction-choreography".to_string(),
            consumer_name: "worker-1".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.account_stream, "account-events");
        assert_eq!(config.transaction_stream, "transaction-events");
        assert_eq!(config.consumer_group, "transaction-choreography");
        assert_eq!(config.consumer_name, "worker-1");
        assert_eq!(config.log_level, "info");
    }
}
