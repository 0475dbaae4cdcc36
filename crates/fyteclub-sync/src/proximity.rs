//! Proximity-driven sync scheduler (§4.10): decides, per tick, which nearby
//! peers warrant an outbound sync, plus bounded self-resync triggers.

use std::collections::{HashMap, HashSet};

use fyteclub_types::PeerId;

/// A peer is re-synced only after moving more than this far since the last
/// tick it was observed (unless never synced).
pub const MOVE_THRESHOLD_METERS: f32 = 5.0;

/// Skip enqueuing a peer if an inbound `RecipeAnnounce` arrived this recently.
pub const ANNOUNCE_FRESHNESS_SECS: u64 = 10;

/// One nearby-avatar observation for a tick, already filtered to the 50 m
/// scan radius by the external player-scanner collaborator.
#[derive(Clone, Debug)]
pub struct ProximityObservation {
    pub peer_game_id: String,
    pub position: (f32, f32, f32),
    pub zone_id: String,
}

/// Reasons a bounded self-resync may be triggered (§4.10).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResyncReason {
    ZoneChange,
    ModAdapterChange,
    Login,
}

/// Per-group proximity scheduling state.
#[derive(Default)]
pub struct ProximityScheduler {
    last_position: HashMap<PeerId, (f32, f32, f32)>,
    ever_synced: HashSet<PeerId>,
    last_announce_received_at: HashMap<PeerId, u64>,
    current_zone: Option<String>,
    self_resync_in_flight: bool,
}

impl ProximityScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an inbound `RecipeAnnounce` was just received from `peer_id`.
    pub fn record_announce_received(&mut self, peer_id: &str, now: u64) {
        self.last_announce_received_at.insert(peer_id.to_string(), now);
    }

    /// Record that a peer's recipe has been fully synced at least once.
    pub fn mark_synced(&mut self, peer_id: &str) {
        self.ever_synced.insert(peer_id.to_string());
    }

    /// Run one scheduling tick, returning the peers to enqueue an outbound
    /// sync for.
    pub fn tick(
        &mut self,
        observations: &[ProximityObservation],
        resolve: impl Fn(&str) -> Option<PeerId>,
        is_blocked: impl Fn(&str) -> bool,
        now: u64,
    ) -> Vec<PeerId> {
        let mut enqueued = Vec::new();

        for obs in observations {
            let Some(peer_id) = resolve(&obs.peer_game_id) else {
                continue;
            };

            if is_blocked(&peer_id) {
                continue;
            }

            let moved_enough = match self.last_position.get(&peer_id) {
                None => true,
                Some(prev) => distance(*prev, obs.position) > MOVE_THRESHOLD_METERS,
            };
            self.last_position.insert(peer_id.clone(), obs.position);

            if !moved_enough && self.ever_synced.contains(&peer_id) {
                continue;
            }

            let announced_recently = self
                .last_announce_received_at
                .get(&peer_id)
                .is_some_and(|at| now.saturating_sub(*at) <= ANNOUNCE_FRESHNESS_SECS);
            if announced_recently {
                continue;
            }

            enqueued.push(peer_id);
        }

        enqueued
    }

    /// Request a self-resync, bounded to one in-flight at a time. Returns
    /// `None` if one is already running.
    pub fn request_self_resync(&mut self, reason: ResyncReason, zone_id: Option<&str>) -> Option<ResyncReason> {
        if reason == ResyncReason::ZoneChange {
            if self.current_zone.as_deref() == zone_id {
                return None;
            }
            self.current_zone = zone_id.map(str::to_string);
        }
        if self.self_resync_in_flight {
            return None;
        }
        self.self_resync_in_flight = true;
        Some(reason)
    }

    /// Mark the in-flight self-resync as finished, allowing another to start.
    pub fn complete_self_resync(&mut self) {
        self.self_resync_in_flight = false;
    }
}

fn distance(a: (f32, f32, f32), b: (f32, f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    let dz = a.2 - b.2;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(game_id: &str, pos: (f32, f32, f32)) -> ProximityObservation {
        ProximityObservation {
            peer_game_id: game_id.into(),
            position: pos,
            zone_id: "zone-a".into(),
        }
    }

    #[test]
    fn test_unresolved_peer_ignored() {
        let mut scheduler = ProximityScheduler::new();
        let result = scheduler.tick(&[obs("ffxiv-1", (0.0, 0.0, 0.0))], |_| None, |_| false, 0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_first_observation_enqueues_even_with_no_movement() {
        let mut scheduler = ProximityScheduler::new();
        let result = scheduler.tick(
            &[obs("ffxiv-1", (0.0, 0.0, 0.0))],
            |_| Some("alice".to_string()),
            |_| false,
            0,
        );
        assert_eq!(result, vec!["alice".to_string()]);
    }

    #[test]
    fn test_small_movement_after_sync_is_dropped() {
        let mut scheduler = ProximityScheduler::new();
        scheduler.mark_synced("alice");
        scheduler.last_position.insert("alice".into(), (0.0, 0.0, 0.0));
        scheduler.record_announce_received("alice", 0);

        let result = scheduler.tick(
            &[obs("ffxiv-1", (1.0, 0.0, 0.0))],
            |_| Some("alice".to_string()),
            |_| false,
            20,
        );
        assert!(result.is_empty(), "moved only 1m, below 5m threshold");
    }

    #[test]
    fn test_large_movement_enqueues_even_if_synced() {
        let mut scheduler = ProximityScheduler::new();
        scheduler.mark_synced("alice");
        scheduler.last_position.insert("alice".into(), (0.0, 0.0, 0.0));

        let result = scheduler.tick(
            &[obs("ffxiv-1", (10.0, 0.0, 0.0))],
            |_| Some("alice".to_string()),
            |_| false,
            20,
        );
        assert_eq!(result, vec!["alice".to_string()]);
    }

    #[test]
    fn test_blocked_peer_dropped() {
        let mut scheduler = ProximityScheduler::new();
        let result = scheduler.tick(
            &[obs("ffxiv-1", (0.0, 0.0, 0.0))],
            |_| Some("alice".to_string()),
            |_| true,
            0,
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_recent_announce_suppresses_enqueue() {
        let mut scheduler = ProximityScheduler::new();
        scheduler.mark_synced("alice");
        scheduler.last_position.insert("alice".into(), (0.0, 0.0, 0.0));
        scheduler.record_announce_received("alice", 95);

        let result = scheduler.tick(
            &[obs("ffxiv-1", (10.0, 0.0, 0.0))],
            |_| Some("alice".to_string()),
            |_| false,
            100,
        );
        assert!(result.is_empty(), "announced 5s ago, within 10s freshness window");
    }

    #[test]
    fn test_self_resync_bounded_to_one_in_flight() {
        let mut scheduler = ProximityScheduler::new();
        assert_eq!(
            scheduler.request_self_resync(ResyncReason::Login, None),
            Some(ResyncReason::Login)
        );
        assert_eq!(scheduler.request_self_resync(ResyncReason::ModAdapterChange, None), None);
        scheduler.complete_self_resync();
        assert_eq!(
            scheduler.request_self_resync(ResyncReason::ModAdapterChange, None),
            Some(ResyncReason::ModAdapterChange)
        );
    }

    #[test]
    fn test_self_resync_zone_change_requires_actual_change() {
        let mut scheduler = ProximityScheduler::new();
        assert_eq!(
            scheduler.request_self_resync(ResyncReason::ZoneChange, Some("zone-a")),
            Some(ResyncReason::ZoneChange)
        );
        scheduler.complete_self_resync();
        assert_eq!(scheduler.request_self_resync(ResyncReason::ZoneChange, Some("zone-a")), None);
    }
}
