pub mod coordinator;
pub mod roster;

pub use coordinator::{
    DEFAULT_ANNOUNCE_WINDOW, DEFAULT_DEATH_GRACE, MatchConfig, MatchCoordinator, RoundPhase,
};
pub use roster::{PlayerColor, Presence, Roster, RosterEntry, SessionId};
