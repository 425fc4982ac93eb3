//! Mediator configuration.
//!
//! Hosts can build a [`MediatorConfig`] in code or deserialize it from
//! their own configuration files:
//!
//! ```
//! use mediator::{MediatorConfig, PublishPolicy};
//!
//! let config: MediatorConfig = serde_json::from_str(r#"{ "publish_policy": "collect-all" }"#).unwrap();
//! assert_eq!(config.publish_policy, PublishPolicy::CollectAll);
//! ```

use serde::{Deserialize, Serialize};

/// What `publish` does when a notification handler fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishPolicy {
    /// Return the first failure; later handlers are not invoked.
    #[default]
    FailFast,
    /// Invoke every handler, then report the failures.
    CollectAll,
}

/// Configuration for a [`Mediator`](crate::Mediator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Failure handling for `publish`.
    pub publish_policy: PublishPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fail_fast() {
        assert_eq!(MediatorConfig::default().publish_policy, PublishPolicy::FailFast);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: MediatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MediatorConfig::default());
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(
            serde_json::to_string(&PublishPolicy::CollectAll).unwrap(),
            "\"collect-all\""
        );
        let policy: PublishPolicy = serde_json::from_str("\"fail-fast\"").unwrap();
        assert_eq!(policy, PublishPolicy::FailFast);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result: std::result::Result<PublishPolicy, _> = serde_json::from_str("\"parallel\"");
        assert!(result.is_err());
    }
}
