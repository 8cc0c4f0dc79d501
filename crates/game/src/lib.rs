pub mod input;
pub mod net;
pub mod player;
pub mod session;

pub use input::InputSnapshot;
pub use net::{
    DEFAULT_BROADCAST_INTERVAL, DEFAULT_LERP_DURATION, DecodeError, InboundQueue, Opcode,
    OutboundMessage, Payload, RawMessage, RemoteSync, StateBroadcaster, WireEvent,
};
pub use player::{MoveTuning, PlayerEntity, SpawnLayout};
pub use session::{
    DEFAULT_ANNOUNCE_WINDOW, DEFAULT_DEATH_GRACE, MatchConfig, MatchCoordinator, PlayerColor,
    Presence, Roster, RosterEntry, RoundPhase, SessionId,
};
