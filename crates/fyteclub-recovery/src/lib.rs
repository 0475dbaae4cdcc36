//! # fyteclub-recovery
//!
//! Session lifecycle and recovery orchestration (§4.11): the per-peer
//! connection state machine, stale-group detection, and the ordered
//! plugin-wide recovery sequence.

use fyteclub_types::STALE_GROUP_THRESHOLD_SECS;

#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("cannot transition from {from:?} to {to:?}")]
    InvalidTransition { from: SessionState, to: &'static str },
}

pub type Result<T> = std::result::Result<T, RecoveryError>;

/// A peer session's lifecycle state (§4.11).
///
/// `Disconnected` is the initial state and may be re-entered after loss;
/// `Left` is terminal, reached only by an explicit leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Active,
    Left,
}

/// Actions to take once a session reaches `Active`, whether on first join
/// or reconnect (§4.11: "a full phonebook gossip and a `RecipeAnnounce`
/// for self are issued").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostActivationActions {
    pub resync_phonebook: bool,
    pub announce_self: bool,
}

/// One peer session's connection state machine.
pub struct PeerSession {
    state: SessionState,
}

impl Default for PeerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn start_connecting(&mut self) -> Result<()> {
        self.require(SessionState::Disconnected, "Connecting")?;
        self.state = SessionState::Connecting;
        Ok(())
    }

    pub fn start_authenticating(&mut self) -> Result<()> {
        self.require(SessionState::Connecting, "Authenticating")?;
        self.state = SessionState::Authenticating;
        Ok(())
    }

    /// Authentication succeeded; the session is now active.
    pub fn activate(&mut self) -> Result<PostActivationActions> {
        self.require(SessionState::Authenticating, "Active")?;
        self.state = SessionState::Active;
        Ok(PostActivationActions {
            resync_phonebook: true,
            announce_self: true,
        })
    }

    /// The session was lost; it may be retried from `Disconnected`.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.state == SessionState::Left {
            return Err(RecoveryError::InvalidTransition {
                from: self.state,
                to: "Disconnected",
            });
        }
        self.state = SessionState::Disconnected;
        Ok(())
    }

    /// The member explicitly left the syncshell. Terminal: no further
    /// transitions are possible.
    pub fn leave(&mut self) {
        self.state = SessionState::Left;
    }

    fn require(&self, expected: SessionState, to: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(RecoveryError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }
}

/// Whether a syncshell has gone stale (§4.11: no successful sync in 30 days).
pub fn is_group_stale(last_sync_at: u64, now: u64) -> bool {
    now.saturating_sub(last_sync_at) > STALE_GROUP_THRESHOLD_SECS
}

/// One step of the plugin-wide recovery sequence, in execution order
/// (§4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStep {
    PurgeExpiredPhonebookEntries,
    ReinitContentStore,
    RetryTransport,
    RerunProximityOnce,
}

/// The fixed, ordered plugin-wide recovery plan.
pub fn recovery_plan() -> [RecoveryStep; 4] {
    [
        RecoveryStep::PurgeExpiredPhonebookEntries,
        RecoveryStep::ReinitContentStore,
        RecoveryStep::RetryTransport,
        RecoveryStep::RerunProximityOnce,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions_to_active() {
        let mut session = PeerSession::new();
        session.start_connecting().expect("connect");
        session.start_authenticating().expect("authenticate");
        let actions = session.activate().expect("activate");
        assert_eq!(session.state(), SessionState::Active);
        assert!(actions.resync_phonebook);
        assert!(actions.announce_self);
    }

    #[test]
    fn test_skipping_a_state_is_rejected() {
        let mut session = PeerSession::new();
        let err = session.start_authenticating().expect_err("expected error");
        assert!(matches!(err, RecoveryError::InvalidTransition { .. }));
    }

    #[test]
    fn test_disconnect_from_active_allows_reconnect() {
        let mut session = PeerSession::new();
        session.start_connecting().expect("connect");
        session.start_authenticating().expect("authenticate");
        session.activate().expect("activate");

        session.disconnect().expect("disconnect");
        assert_eq!(session.state(), SessionState::Disconnected);

        session.start_connecting().expect("reconnect");
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn test_leave_is_terminal() {
        let mut session = PeerSession::new();
        session.leave();
        assert_eq!(session.state(), SessionState::Left);
        let err = session.disconnect().expect_err("expected error");
        assert!(matches!(err, RecoveryError::InvalidTransition { .. }));
        let err = session.start_connecting().expect_err("expected error");
        assert!(matches!(err, RecoveryError::InvalidTransition { .. }));
    }

    #[test]
    fn test_group_stale_after_threshold() {
        let now = STALE_GROUP_THRESHOLD_SECS * 10;
        assert!(!is_group_stale(now - STALE_GROUP_THRESHOLD_SECS, now));
        assert!(is_group_stale(now - STALE_GROUP_THRESHOLD_SECS - 1, now));
    }

    #[test]
    fn test_recovery_plan_purges_before_reiniting_store() {
        let plan = recovery_plan();
        let purge_idx = plan.iter().position(|s| *s == RecoveryStep::PurgeExpiredPhonebookEntries);
        let reinit_idx = plan.iter().position(|s| *s == RecoveryStep::ReinitContentStore);
        assert!(purge_idx < reinit_idx);
    }
}
