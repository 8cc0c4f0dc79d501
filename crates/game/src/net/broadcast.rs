use glam::Vec2;

use crate::input::InputSnapshot;

use super::protocol::WireEvent;

pub const DEFAULT_BROADCAST_INTERVAL: f32 = 0.1;

/// An encoded message ready to hand to the relay.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub opcode: i64,
    pub payload: Vec<u8>,
}

impl OutboundMessage {
    pub fn from_event(event: &WireEvent) -> Self {
        Self {
            opcode: event.opcode(),
            payload: event.encode_payload(),
        }
    }
}

/// Decides when the local player's state goes out.
///
/// Two independent policies:
/// - velocity and position go out unconditionally on a repeating interval,
///   whether or not anything changed (the receiving side is idempotent);
/// - the input snapshot goes out immediately when any field differs from
///   the previous tick, at most once per tick, and always as the full
///   snapshot rather than a diff.
///
/// Fire-and-forget: no acknowledgement, sequencing, or retry. The relay is
/// ordered per sender; deciding *when* to send is the whole job here.
#[derive(Debug)]
pub struct StateBroadcaster {
    interval: f32,
    sync_timer: f32,
    last_input: InputSnapshot,
}

impl Default for StateBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_INTERVAL)
    }
}

impl StateBroadcaster {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            // Starts expired so the first tick announces our state.
            sync_timer: 0.0,
            last_input: InputSnapshot::default(),
        }
    }

    /// Advance one tick and append any due messages to `out`.
    pub fn tick(
        &mut self,
        dt: f32,
        velocity: Vec2,
        position: Vec2,
        input: InputSnapshot,
        out: &mut Vec<OutboundMessage>,
    ) {
        if self.sync_timer <= 0.0 {
            out.push(OutboundMessage::from_event(
                &WireEvent::velocity_and_position(velocity, position),
            ));
            self.sync_timer = self.interval;
        }
        self.sync_timer -= dt;

        if input != self.last_input {
            out.push(OutboundMessage::from_event(&WireEvent::Input(input)));
        }
        self.last_input = input;
    }

    /// Forget the previous input sample, e.g. across respawns, so the next
    /// tick re-announces only genuine changes from neutral.
    pub fn reset_input(&mut self) {
        self.last_input = InputSnapshot::default();
    }
}
