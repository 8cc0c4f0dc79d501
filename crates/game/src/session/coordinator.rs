use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::input::InputSnapshot;
use crate::net::broadcast::DEFAULT_BROADCAST_INTERVAL;
use crate::net::reconcile::DEFAULT_LERP_DURATION;
use crate::net::{
    InboundQueue, OutboundMessage, RawMessage, RemoteSync, StateBroadcaster, WireEvent,
};
use crate::player::{PlayerEntity, SpawnLayout};

use super::roster::{PlayerColor, Presence, Roster, RosterEntry};

pub const DEFAULT_DEATH_GRACE: f32 = 0.5;
pub const DEFAULT_ANNOUNCE_WINDOW: f32 = 2.0;

const INBOUND_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Seconds between unconditional velocity/position broadcasts.
    pub broadcast_interval: f32,
    /// Seconds over which remote position corrections are smoothed.
    pub lerp_duration: f32,
    /// Seconds between a death and the roster/entity removal, so the death
    /// presentation can play out.
    pub death_grace: f32,
    /// Seconds the winner banner stays up before the next round spawns.
    pub announce_window: f32,
    /// RNG seed for spawn slot selection.
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
            lerp_duration: DEFAULT_LERP_DURATION,
            death_grace: DEFAULT_DEATH_GRACE,
            announce_window: DEFAULT_ANNOUNCE_WINDOW,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No live round; the roster may be empty.
    Lobby,
    /// Normal play.
    InRound,
    /// A win has been declared; the banner countdown is running.
    Announcing,
    /// Transient while the local entity is re-placed; collapses to
    /// `InRound` as soon as it is.
    Respawning,
}

/// Owns the roster and drives the round lifecycle of one match.
///
/// All mutation happens inside [`MatchCoordinator::tick`], on whatever
/// thread the update loop runs. The transport hands inbound traffic to the
/// [`InboundQueue`] (any thread) and sends whatever [`drain_outbound`]
/// yields; join/leave/presence notifications arrive as plain method calls
/// when the relay completes them.
///
/// Win detection is deliberately symmetric and unauthoritative: every
/// client independently watches for "exactly one live presence remains and
/// it is me". Under message loss two clients can disagree about that
/// condition; the announcement then simply does not happen (or happens on
/// the other client). There is no leader election.
///
/// [`drain_outbound`]: MatchCoordinator::drain_outbound
#[derive(Debug)]
pub struct MatchCoordinator {
    config: MatchConfig,
    spawn_layout: SpawnLayout,
    inbound: InboundQueue,
    outbox: Vec<OutboundMessage>,
    roster: Roster,
    phase: RoundPhase,
    match_id: Option<String>,
    local: Option<Presence>,
    display_name: String,
    local_input: InputSnapshot,
    broadcaster: StateBroadcaster,
    winner_banner: Option<String>,
    announce_timer: Option<f32>,
    rng: StdRng,
}

impl MatchCoordinator {
    pub fn new(config: MatchConfig) -> Self {
        Self::with_layout(config, SpawnLayout::default())
    }

    pub fn with_layout(config: MatchConfig, spawn_layout: SpawnLayout) -> Self {
        Self {
            inbound: InboundQueue::new(INBOUND_CAPACITY),
            outbox: Vec::new(),
            roster: Roster::new(),
            phase: RoundPhase::Lobby,
            match_id: None,
            local: None,
            display_name: String::new(),
            local_input: InputSnapshot::default(),
            broadcaster: StateBroadcaster::new(config.broadcast_interval),
            winner_banner: None,
            announce_timer: None,
            rng: StdRng::seed_from_u64(config.seed),
            spawn_layout,
            config,
        }
    }

    /// Handle for the network execution context. Push raw messages here;
    /// they are decoded and applied on the next tick.
    pub fn inbound_queue(&self) -> InboundQueue {
        self.inbound.clone()
    }

    /// Take everything queued for sending since the last drain.
    pub fn drain_outbound(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    /// Write this tick's sampled local input. Applied to the local entity
    /// and considered for broadcast on the next [`tick`](Self::tick).
    pub fn set_local_input(&mut self, input: InputSnapshot) {
        self.local_input = input.clamped();
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn match_id(&self) -> Option<&str> {
        self.match_id.as_deref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn winner_banner(&self) -> Option<&str> {
        self.winner_banner.as_deref()
    }

    pub fn local_presence(&self) -> Option<&Presence> {
        self.local.as_ref()
    }

    pub fn local_entity(&self) -> Option<&PlayerEntity> {
        let local = self.local.as_ref()?;
        self.roster.get(&local.session_id).map(|e| &e.entity)
    }

    /// Mutable access to the locally simulated entity, for the physics and
    /// damage side of the simulation.
    pub fn local_entity_mut(&mut self) -> Option<&mut PlayerEntity> {
        let local = self.local.clone()?;
        self.roster.get_mut(&local.session_id).map(|e| &mut e.entity)
    }

    /// The match was joined: remember who we are and spawn an entity for
    /// every presence in the initial roster (the local one included).
    pub fn handle_match_joined(
        &mut self,
        match_id: impl Into<String>,
        local: Presence,
        presences: &[Presence],
    ) {
        let match_id = match_id.into();
        log::info!(
            "joined match {match_id} as {} with {} presences",
            local.session_id,
            presences.len()
        );
        self.match_id = Some(match_id);
        self.local = Some(local);
        for presence in presences {
            self.spawn_presence(presence.clone(), None);
        }
        self.phase = RoundPhase::InRound;
    }

    pub fn handle_presences_joined(&mut self, joins: &[Presence]) {
        if self.match_id.is_none() {
            return;
        }
        for presence in joins {
            self.spawn_presence(presence.clone(), None);
        }
        self.phase = RoundPhase::InRound;
    }

    pub fn handle_presences_left(&mut self, leaves: &[Presence]) {
        for presence in leaves {
            if self.roster.remove(&presence.session_id).is_some() {
                log::info!("{} left, despawned", presence.session_id);
            }
        }
    }

    /// Tear the match down: cancel every pending delayed action, then
    /// destroy all entities and return to the lobby.
    pub fn quit_match(&mut self) {
        self.announce_timer = None;
        self.winner_banner = None;
        for entry in self.roster.iter_mut() {
            entry.removal_timer = None;
            if let Some(sync) = entry.remote.as_mut() {
                sync.cancel();
            }
        }
        self.roster.clear();
        self.inbound.clear();
        self.outbox.clear();
        self.match_id = None;
        self.local = None;
        self.phase = RoundPhase::Lobby;
        log::info!("quit match");
    }

    /// One pass of the update loop: drain and apply inbound traffic, run
    /// the pending countdowns, step the simulation, and emit outbound
    /// state. `dt` is the tick's elapsed time in seconds.
    pub fn tick(&mut self, dt: f32) {
        let inbound = self.inbound.drain();
        if self.match_id.is_none() {
            if !inbound.is_empty() {
                log::debug!("discarding {} messages outside a match", inbound.len());
            }
            return;
        }

        // The death signal is synchronous with the simulation, so it is
        // observed ahead of whatever the network queued up.
        self.poll_local_death();

        for raw in inbound {
            self.handle_inbound(raw);
        }

        for entry in self.roster.expire_removals(dt) {
            log::info!("{} removed after death grace", entry.presence.session_id);
        }

        let input = self.local_input;
        if let Some(entry) = self.local_entry_mut() {
            entry.entity.apply_input(input);
            if input.attack {
                entry.entity.attack();
            }
        }

        for entry in self.roster.iter_mut() {
            entry.entity.step(dt);
            if let Some(sync) = entry.remote.as_mut() {
                sync.tick(dt, &mut entry.entity);
            }
        }

        if let Some((velocity, position)) = self
            .local_entry_mut()
            .map(|e| (e.entity.velocity, e.entity.position))
        {
            self.broadcaster
                .tick(dt, velocity, position, input, &mut self.outbox);
        }

        if let Some(timer) = self.announce_timer.as_mut() {
            *timer -= dt;
            if *timer <= 0.0 {
                self.finish_announcement();
            }
        }
    }

    fn handle_inbound(&mut self, raw: RawMessage) {
        let event = match WireEvent::decode(raw.opcode, &raw.payload) {
            Ok(event) => event,
            Err(err) => {
                log::warn!("dropping message from {}: {err}", raw.sender.session_id);
                return;
            }
        };

        let sender = raw.sender;
        if self
            .local
            .as_ref()
            .is_some_and(|l| l.session_id == sender.session_id)
        {
            // The relay does not echo our own traffic; anything that still
            // claims to be from us is ignored.
            return;
        }

        match event {
            WireEvent::VelocityAndPosition { .. } | WireEvent::Input(_) => {
                match self.roster.get_mut(&sender.session_id) {
                    Some(RosterEntry {
                        entity,
                        remote: Some(sync),
                        ..
                    }) => sync.apply(&event, entity),
                    _ => log::debug!("state for unknown presence {}", sender.session_id),
                }
            }
            WireEvent::Died { .. } => self.handle_remote_death(&sender, &event),
            WireEvent::Respawned { spawn_index } => self.handle_respawned(sender, spawn_index),
            WireEvent::NewRound { winner_name } => {
                log::info!("round over, {winner_name} won");
                self.begin_announcement(&winner_name);
            }
            WireEvent::Unknown { opcode } => {
                log::debug!("ignoring unknown opcode {opcode}");
            }
        }
    }

    fn handle_remote_death(&mut self, sender: &Presence, event: &WireEvent) {
        let Some(entry) = self.roster.get_mut(&sender.session_id) else {
            // Late death for a presence a leave already removed.
            log::debug!("death for unknown presence {}", sender.session_id);
            return;
        };
        if entry.is_pending_removal() {
            return;
        }

        if let Some(sync) = entry.remote.as_mut() {
            sync.apply(event, &mut entry.entity);
        }
        entry.removal_timer = Some(self.config.death_grace);
        log::info!("{} died", sender.session_id);

        self.check_local_win();
    }

    /// If, with all pending removals applied, exactly one presence is left
    /// and it is us, we won: announce and schedule the next round. A sole
    /// remote survivor is that client's win to announce.
    fn check_local_win(&mut self) {
        if self.phase == RoundPhase::Announcing {
            return;
        }
        let survivor = {
            let mut live = self.roster.live();
            match (live.next(), live.next()) {
                (Some(entry), None) => entry.presence.session_id.clone(),
                _ => return,
            }
        };
        let is_local_win = self
            .local
            .as_ref()
            .is_some_and(|l| l.session_id == survivor);
        if !is_local_win {
            return;
        }

        let winner = self.winner_name();
        self.push_event(&WireEvent::NewRound {
            winner_name: winner.clone(),
        });
        log::info!("local player won the round");
        self.begin_announcement(&winner);
    }

    fn handle_respawned(&mut self, sender: Presence, spawn_index: usize) {
        if let Some(entry) = self.roster.get_mut(&sender.session_id) {
            // Already present: a reposition. Revive the body in place and
            // forget any scheduled removal or in-flight correction.
            entry.removal_timer = None;
            if let Some(sync) = entry.remote.as_mut() {
                sync.cancel();
            }
            entry.entity.respawn(self.spawn_layout.point(spawn_index));
            log::info!("{} respawned at slot {spawn_index}", sender.session_id);
        } else {
            self.spawn_presence(sender, Some(spawn_index));
        }
    }

    fn begin_announcement(&mut self, winner_name: &str) {
        self.winner_banner = Some(format!("{winner_name} won this round!"));
        self.announce_timer = Some(self.config.announce_window);
        self.phase = RoundPhase::Announcing;
    }

    /// The announcement window elapsed: clear the banner, tear down the
    /// local entity, and spawn it fresh at a newly drawn slot, telling
    /// everyone where it went.
    fn finish_announcement(&mut self) {
        self.winner_banner = None;
        self.announce_timer = None;
        self.phase = RoundPhase::Respawning;

        if let Some(local) = self.local.clone() {
            self.roster.remove(&local.session_id);
            let spawn_index = self.rng.gen_range(0..self.spawn_layout.len());
            self.spawn_presence(local, Some(spawn_index));
            self.push_event(&WireEvent::Respawned { spawn_index });
            self.broadcaster.reset_input();
        }

        self.phase = RoundPhase::InRound;
    }

    fn poll_local_death(&mut self) {
        let death_grace = self.config.death_grace;
        let Some(entry) = self.local_entry_mut() else {
            return;
        };
        if let Some(position) = entry.entity.take_death_event() {
            entry.removal_timer = Some(death_grace);
            self.push_event(&WireEvent::Died { position });
            log::info!("local player died at {position}");
        }
    }

    /// Spawn an entity for a presence and insert it into the roster. The
    /// palette color is recomputed from the presence's position among the
    /// roster keys at this moment; it is derived, never stored identity.
    fn spawn_presence(&mut self, presence: Presence, spawn_index: Option<usize>) {
        if self.roster.contains(&presence.session_id) {
            log::debug!("duplicate spawn for {} ignored", presence.session_id);
            return;
        }

        let index =
            spawn_index.unwrap_or_else(|| self.rng.gen_range(0..self.spawn_layout.len()));
        let point = self.spawn_layout.point(index);
        let is_local = self
            .local
            .as_ref()
            .is_some_and(|l| l.session_id == presence.session_id);

        let session_id = presence.session_id.clone();
        self.roster.insert(RosterEntry {
            presence,
            entity: PlayerEntity::new(point),
            color: PlayerColor::Orange,
            remote: (!is_local).then(|| RemoteSync::new(self.config.lerp_duration)),
            removal_timer: None,
        });

        if let Some(position) = self.roster.position_of(&session_id) {
            if let Some(entry) = self.roster.get_mut(&session_id) {
                entry.color = PlayerColor::from_index(position);
            }
        }
        log::info!("spawned {session_id} at slot {index} (local: {is_local})");
    }

    fn winner_name(&self) -> String {
        if !self.display_name.is_empty() {
            return self.display_name.clone();
        }
        self.local
            .as_ref()
            .map(|l| l.username.clone())
            .unwrap_or_default()
    }

    fn local_entry_mut(&mut self) -> Option<&mut RosterEntry> {
        let local = self.local.clone()?;
        self.roster.get_mut(&local.session_id)
    }

    fn push_event(&mut self, event: &WireEvent) {
        self.outbox.push(OutboundMessage::from_event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Opcode;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn presence(id: &str) -> Presence {
        Presence::new(id, id)
    }

    fn coordinator(local: &str, others: &[&str]) -> MatchCoordinator {
        let mut c = MatchCoordinator::new(MatchConfig::default());
        c.set_display_name(local);
        let mut presences = vec![presence(local)];
        presences.extend(others.iter().map(|id| presence(id)));
        c.handle_match_joined("match-1", presence(local), &presences);
        c
    }

    fn deliver(c: &MatchCoordinator, from: &str, event: &WireEvent) {
        c.inbound_queue().push(RawMessage {
            opcode: event.opcode(),
            sender: presence(from),
            payload: event.encode_payload(),
        });
    }

    fn count_opcode(out: &[OutboundMessage], opcode: Opcode) -> usize {
        out.iter().filter(|m| m.opcode == opcode.as_i64()).count()
    }

    #[test]
    fn joining_spawns_everyone_and_enters_the_round() {
        let c = coordinator("a", &["b", "c"]);

        assert_eq!(c.phase(), RoundPhase::InRound);
        assert_eq!(c.roster().len(), 3);
        assert!(c.roster().get("a").unwrap().is_local());
        assert!(!c.roster().get("b").unwrap().is_local());

        let colors: Vec<_> = c.roster().iter().map(|e| e.color).collect();
        assert_eq!(
            colors,
            vec![PlayerColor::Orange, PlayerColor::Blue, PlayerColor::Green]
        );
    }

    #[test]
    fn duplicate_join_is_ignored() {
        let mut c = coordinator("a", &["b"]);
        c.handle_presences_joined(&[presence("b")]);
        assert_eq!(c.roster().len(), 2);
    }

    #[test]
    fn leave_despawns_the_presence() {
        let mut c = coordinator("a", &["b"]);
        c.handle_presences_left(&[presence("b")]);
        assert_eq!(c.roster().len(), 1);
        assert!(!c.roster().contains("b"));
    }

    #[test]
    fn inbound_state_reconciles_the_remote_entity() {
        let mut c = coordinator("a", &["b"]);
        let target = Vec2::new(7.0, 0.0);

        deliver(
            &c,
            "b",
            &WireEvent::velocity_and_position(Vec2::new(0.0, 0.0), target),
        );
        // One tick to decode, then let the 50 ms lerp run out.
        for _ in 0..6 {
            c.tick(DT);
        }
        assert_eq!(c.roster().get("b").unwrap().entity.position, target);
    }

    #[test]
    fn periodic_state_from_a_peer_is_idempotent_for_the_coordinator() {
        let mut c = coordinator("a", &["b"]);
        let event =
            WireEvent::velocity_and_position(Vec2::ZERO, Vec2::new(4.0, 0.0));

        for _ in 0..5 {
            deliver(&c, "b", &event);
            c.tick(DT);
        }
        assert_eq!(c.roster().len(), 2);
        assert_eq!(c.phase(), RoundPhase::InRound);
    }

    #[test]
    fn remote_death_is_removed_after_the_grace_delay() {
        let mut c = coordinator("a", &["b", "c"]);
        deliver(&c, "b", &WireEvent::Died { position: Vec2::ZERO });
        c.tick(DT);

        let entry = c.roster().get("b").unwrap();
        assert!(entry.is_pending_removal());
        assert!(entry.entity.is_dying());

        c.tick(0.25);
        assert!(c.roster().contains("b"));
        c.tick(0.3);
        assert!(!c.roster().contains("b"));
    }

    #[test]
    fn sole_local_survivor_announces_exactly_once_and_respawns() {
        let mut c = coordinator("a", &["b", "c"]);
        let mut sent = c.drain_outbound();

        deliver(&c, "b", &WireEvent::Died { position: Vec2::ZERO });
        c.tick(DT);
        sent.extend(c.drain_outbound());
        assert_eq!(count_opcode(&sent, Opcode::NewRound), 0);
        assert_eq!(c.phase(), RoundPhase::InRound);

        deliver(&c, "c", &WireEvent::Died { position: Vec2::ZERO });
        c.tick(DT);
        sent.extend(c.drain_outbound());
        assert_eq!(count_opcode(&sent, Opcode::NewRound), 1);
        assert_eq!(c.phase(), RoundPhase::Announcing);
        assert_eq!(c.winner_banner(), Some("a won this round!"));

        // A straggling duplicate death must not re-announce.
        deliver(&c, "c", &WireEvent::Died { position: Vec2::ZERO });
        c.tick(DT);
        sent.extend(c.drain_outbound());
        assert_eq!(count_opcode(&sent, Opcode::NewRound), 1);

        // Announcement window elapses: banner clears, we respawn and say so.
        c.tick(DEFAULT_ANNOUNCE_WINDOW);
        sent.extend(c.drain_outbound());
        assert_eq!(count_opcode(&sent, Opcode::Respawned), 1);
        assert_eq!(c.phase(), RoundPhase::InRound);
        assert_eq!(c.winner_banner(), None);
        assert!(c.roster().contains("a"));
    }

    #[test]
    fn sole_remote_survivor_is_not_our_win() {
        let mut c = coordinator("a", &["b", "c"]);
        c.drain_outbound();

        // Our own player dies first, then one of the remotes.
        c.local_entity_mut().unwrap().take_damage(1);
        c.tick(DT);
        deliver(&c, "b", &WireEvent::Died { position: Vec2::ZERO });
        c.tick(DT);

        let sent = c.drain_outbound();
        assert_eq!(count_opcode(&sent, Opcode::NewRound), 0);
        assert_eq!(c.phase(), RoundPhase::InRound);
    }

    #[test]
    fn inbound_new_round_respawns_without_rebroadcasting_it() {
        let mut c = coordinator("a", &["b"]);
        c.drain_outbound();

        deliver(
            &c,
            "b",
            &WireEvent::NewRound {
                winner_name: "b".to_string(),
            },
        );
        c.tick(DT);
        assert_eq!(c.phase(), RoundPhase::Announcing);
        assert_eq!(c.winner_banner(), Some("b won this round!"));

        c.tick(DEFAULT_ANNOUNCE_WINDOW);
        let sent = c.drain_outbound();
        assert_eq!(count_opcode(&sent, Opcode::NewRound), 0);
        assert_eq!(count_opcode(&sent, Opcode::Respawned), 1);
        assert_eq!(c.phase(), RoundPhase::InRound);
    }

    #[test]
    fn local_death_broadcasts_and_schedules_removal() {
        let mut c = coordinator("a", &["b"]);
        c.drain_outbound();

        c.local_entity_mut().unwrap().take_damage(1);
        c.tick(DT);

        let sent = c.drain_outbound();
        assert_eq!(count_opcode(&sent, Opcode::Died), 1);
        assert!(c.roster().get("a").unwrap().is_pending_removal());

        c.tick(DEFAULT_DEATH_GRACE);
        assert!(!c.roster().contains("a"));
    }

    #[test]
    fn respawned_spawns_absent_presences_and_repositions_present_ones() {
        let mut c = coordinator("a", &["b"]);
        c.handle_presences_left(&[presence("b")]);

        deliver(&c, "b", &WireEvent::Respawned { spawn_index: 2 });
        c.tick(DT);
        let spawned_at = c.roster().get("b").unwrap().entity.position;
        assert_eq!(spawned_at.x, SpawnLayout::default().point(2).x);

        deliver(&c, "b", &WireEvent::Respawned { spawn_index: 0 });
        c.tick(DT);
        assert_eq!(c.roster().len(), 2);
        let moved_to = c.roster().get("b").unwrap().entity.position;
        assert_eq!(moved_to.x, SpawnLayout::default().point(0).x);
    }

    #[test]
    fn stale_death_is_a_noop() {
        let mut c = coordinator("a", &["b"]);
        deliver(&c, "zz", &WireEvent::Died { position: Vec2::ZERO });
        c.tick(DT);
        assert_eq!(c.roster().len(), 2);
        assert_eq!(c.phase(), RoundPhase::InRound);
    }

    #[test]
    fn malformed_payload_mutates_nothing() {
        let mut c = coordinator("a", &["b"]);
        let before = c.roster().get("b").unwrap().entity.position;

        let payload = crate::net::Payload::new()
            .with("velocity.x", 9.0_f32)
            .with("velocity.y", 9.0_f32)
            .with("position.x", 9.0_f32)
            .encode();
        c.inbound_queue().push(RawMessage {
            opcode: Opcode::VelocityAndPosition.as_i64(),
            sender: presence("b"),
            payload,
        });
        c.tick(0.0);

        let after = c.roster().get("b").unwrap();
        assert_eq!(after.entity.position, before);
        assert_eq!(after.entity.velocity, Vec2::ZERO);
    }

    #[test]
    fn unknown_opcode_is_ignored() {
        let mut c = coordinator("a", &["b"]);
        c.inbound_queue().push(RawMessage {
            opcode: 99,
            sender: presence("b"),
            payload: b"whatever".to_vec(),
        });
        c.tick(DT);
        assert_eq!(c.roster().len(), 2);
    }

    #[test]
    fn quit_cancels_all_pending_work() {
        let mut c = coordinator("a", &["b", "c"]);
        deliver(&c, "b", &WireEvent::Died { position: Vec2::ZERO });
        deliver(
            &c,
            "c",
            &WireEvent::NewRound {
                winner_name: "c".to_string(),
            },
        );
        c.tick(DT);
        assert!(c.winner_banner().is_some());

        c.quit_match();
        assert_eq!(c.phase(), RoundPhase::Lobby);
        assert!(c.roster().is_empty());
        assert!(c.winner_banner().is_none());
        assert!(c.match_id().is_none());
        assert!(c.drain_outbound().is_empty());

        // Ticking after quit must be inert.
        c.tick(1.0);
        assert!(c.roster().is_empty());
    }

    /// Pipe each coordinator's outbox into the other's inbound queue, the
    /// way the relay would, for a number of ticks.
    fn pump(a: &mut MatchCoordinator, b: &mut MatchCoordinator, dt: f32, ticks: usize) {
        for _ in 0..ticks {
            a.tick(dt);
            b.tick(dt);
            let a_presence = a.local_presence().cloned().unwrap();
            let b_presence = b.local_presence().cloned().unwrap();
            for m in a.drain_outbound() {
                b.inbound_queue().push(RawMessage {
                    opcode: m.opcode,
                    sender: a_presence.clone(),
                    payload: m.payload,
                });
            }
            for m in b.drain_outbound() {
                a.inbound_queue().push(RawMessage {
                    opcode: m.opcode,
                    sender: b_presence.clone(),
                    payload: m.payload,
                });
            }
        }
    }

    #[test]
    fn two_clients_agree_through_a_full_round() {
        let roster = [presence("a"), presence("b")];
        let mut a = MatchCoordinator::new(MatchConfig::default());
        a.set_display_name("a");
        a.handle_match_joined("m", presence("a"), &roster);
        let mut b = MatchCoordinator::new(MatchConfig::default());
        b.set_display_name("b");
        b.handle_match_joined("m", presence("b"), &roster);

        // a's input change propagates into b's simulation of a.
        a.set_local_input(InputSnapshot {
            horizontal: 1.0,
            ..Default::default()
        });
        pump(&mut a, &mut b, DT, 10);
        assert_eq!(b.roster().get("a").unwrap().entity.input().horizontal, 1.0);

        // a dies; b is the sole survivor and announces; a hears about it.
        a.local_entity_mut().unwrap().take_damage(1);
        pump(&mut a, &mut b, DT, 5);
        assert_eq!(b.phase(), RoundPhase::Announcing);
        assert_eq!(b.winner_banner(), Some("b won this round!"));
        assert_eq!(a.phase(), RoundPhase::Announcing);

        // Grace and announcement both run out; everyone respawns and both
        // clients converge on the same two-entry roster.
        pump(&mut a, &mut b, 0.1, 30);
        assert_eq!(a.phase(), RoundPhase::InRound);
        assert_eq!(b.phase(), RoundPhase::InRound);
        assert_eq!(a.roster().len(), 2);
        assert_eq!(b.roster().len(), 2);
        assert!(!a.local_entity().unwrap().is_dying());
    }

    #[test]
    fn roster_never_holds_a_session_twice() {
        let mut c = coordinator("a", &["b", "c"]);

        let assert_unique = |c: &MatchCoordinator| {
            let mut ids: Vec<_> = c
                .roster()
                .iter()
                .map(|e| e.presence.session_id.clone())
                .collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), c.roster().len());
        };

        c.handle_presences_joined(&[presence("b"), presence("d")]);
        assert_unique(&c);

        deliver(&c, "b", &WireEvent::Died { position: Vec2::ZERO });
        deliver(&c, "b", &WireEvent::Respawned { spawn_index: 1 });
        c.tick(DT);
        assert_unique(&c);

        c.handle_presences_left(&[presence("d"), presence("d")]);
        assert_unique(&c);

        deliver(&c, "d", &WireEvent::Respawned { spawn_index: 3 });
        c.tick(DT);
        assert_unique(&c);
        assert_eq!(c.roster().len(), 4);
    }
}
