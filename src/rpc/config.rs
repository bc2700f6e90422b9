// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Channel configuration

use std::time::Duration;

/// Configuration of an [`RpcChannel`](super::RpcChannel)
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Delay between the last terminal dispatch and listener removal
    pub grace_delay: Duration,
    /// Drop calls that stay unanswered this long (`None` = wait forever)
    pub call_timeout: Option<Duration>,
    /// Run the message board and "little bug" alert hooks after caller handlers
    pub apply_default_hooks: bool,
    /// Settled calls kept for [`call_state`](super::RpcChannel::call_state) lookups
    pub history_limit: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            grace_delay: Duration::from_millis(10),
            call_timeout: None,
            apply_default_hooks: true,
            history_limit: 64,
        }
    }
}

impl ChannelConfig {
    /// Create a new channel config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listener grace delay
    pub fn grace_delay(mut self, delay: Duration) -> Self {
        self.grace_delay = delay;
        self
    }

    /// Set the call timeout
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Enable/disable the default completion and failure hooks
    pub fn apply_default_hooks(mut self, enabled: bool) -> Self {
        self.apply_default_hooks = enabled;
        self
    }

    /// Set the settled-call history size
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Configuration for tests: no grace period, no UI hooks
    pub fn immediate() -> Self {
        Self {
            grace_delay: Duration::ZERO,
            apply_default_hooks: false,
            ..Default::default()
        }
    }
}
