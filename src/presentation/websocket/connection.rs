//! Per-connection state tracking.

use std::time::Instant;

/// Lifecycle state for a single WebSocket connection.
///
/// Transitions: Connected (no identity) -> Identified (after `setup`)
/// -> Closed. Chat-room joins are tracked in the registry, not here.
#[derive(Debug)]
pub struct ConnectionState {
    pub connection_id: String,
    pub user_id: Option<i64>,
    pub last_activity: Instant,
}

impl ConnectionState {
    pub fn new(connection_id: String) -> Self {
        Self {
            connection_id,
            user_id: None,
            last_activity: Instant::now(),
        }
    }

    /// Record the identity bound by a `setup` event.
    pub fn identify(&mut self, user_id: i64) {
        self.user_id = Some(user_id);
    }

    pub fn is_identified(&self) -> bool {
        self.user_id.is_some()
    }

    /// Record inbound traffic for idle-timeout accounting.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle(&self, timeout_secs: u64) -> bool {
        self.last_activity.elapsed().as_secs() >= timeout_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_connection_is_unidentified() {
        let state = ConnectionState::new("conn-1".into());
        assert!(!state.is_identified());
        assert!(state.user_id.is_none());
    }

    #[test]
    fn test_identify_binds_user() {
        let mut state = ConnectionState::new("conn-1".into());
        state.identify(42);
        assert!(state.is_identified());
        assert_eq!(state.user_id, Some(42));
    }

    #[test]
    fn test_fresh_connection_is_not_idle() {
        let state = ConnectionState::new("conn-1".into());
        assert!(!state.is_idle(60));
    }
}
