pub mod broadcast;
pub mod protocol;
pub mod queue;
pub mod reconcile;

pub use broadcast::{DEFAULT_BROADCAST_INTERVAL, OutboundMessage, StateBroadcaster};
pub use protocol::{DecodeError, Opcode, Payload, WireEvent};
pub use queue::{InboundQueue, RawMessage};
pub use reconcile::{DEFAULT_LERP_DURATION, RemoteSync};
