//! Session pruning: periodic cleanup of idle sessions.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::GatewayConfig;
use crate::session::manager::SessionManager;

/// Configuration for session pruning.
#[derive(Debug, Clone)]
pub struct PruningConfig {
    /// Maximum idle time before a session is dropped.
    pub max_idle: Duration,
    /// How often to check for idle sessions.
    pub check_interval: Duration,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self::from(&GatewayConfig::default())
    }
}

impl From<&GatewayConfig> for PruningConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            max_idle: config.session_idle,
            check_interval: config.prune_interval,
        }
    }
}

/// Result of a pruning pass.
#[derive(Debug, Clone)]
pub struct PruneResult {
    pub checked: usize,
    pub pruned: usize,
    pub timestamp: DateTime<Utc>,
}

/// Background task that drops idle sessions.
pub struct SessionPruner {
    config: PruningConfig,
}

impl SessionPruner {
    pub fn new(config: PruningConfig) -> Self {
        Self { config }
    }

    /// Start the pruning loop.
    pub fn spawn(self, sessions: SessionManager) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                interval_secs = self.config.check_interval.as_secs(),
                max_idle_secs = self.config.max_idle.as_secs(),
                "Session pruning started"
            );

            let mut timer = tokio::time::interval(self.config.check_interval);
            // The first tick completes immediately.
            timer.tick().await;
            loop {
                timer.tick().await;
                let result = self.prune(&sessions).await;
                if result.pruned > 0 {
                    tracing::info!(
                        pruned = result.pruned,
                        checked = result.checked,
                        "Pruned idle sessions"
                    );
                }
            }
        })
    }

    /// Run a single pruning pass.
    pub async fn prune(&self, sessions: &SessionManager) -> PruneResult {
        let (checked, pruned) = sessions.prune_idle(self.config.max_idle).await;
        PruneResult {
            checked,
            pruned,
            timestamp: Utc::now(),
        }
    }
}
