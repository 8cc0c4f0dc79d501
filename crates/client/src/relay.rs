use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use rumble::{InboundQueue, OutboundMessage, Presence, RawMessage};

/// One frame on the loopback wire.
pub struct RelayFrame {
    pub opcode: i64,
    pub sender: Presence,
    pub payload: Vec<u8>,
}

/// In-process stand-in for the match relay.
///
/// Every message a client sends is fanned out to every other registered
/// client. Delivery runs on a dedicated thread per client, which pushes
/// onto that client's inbound queue: the same cross-context handoff a real
/// socket callback performs, so the update loop's single-mutator rule gets
/// exercised for real. Ordering is preserved per sender, nothing is
/// acknowledged, and a send to a closed peer is silently dropped.
pub struct LoopbackHub {
    peers: Vec<(Presence, Sender<RelayFrame>)>,
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self { peers: Vec::new() }
    }

    /// Register a client and start its delivery thread. The thread exits
    /// when the hub is dropped.
    pub fn register(&mut self, presence: Presence, queue: InboundQueue) -> JoinHandle<()> {
        let (tx, rx) = mpsc::channel::<RelayFrame>();
        self.peers.push((presence, tx));
        std::thread::spawn(move || {
            for frame in rx {
                queue.push(RawMessage {
                    opcode: frame.opcode,
                    sender: frame.sender,
                    payload: frame.payload,
                });
            }
        })
    }

    /// Fan a client's drained outbox out to every other client.
    pub fn broadcast(&self, from: &Presence, messages: &[OutboundMessage]) {
        for message in messages {
            for (peer, tx) in &self.peers {
                if peer.session_id == from.session_id {
                    continue;
                }
                let _ = tx.send(RelayFrame {
                    opcode: message.opcode,
                    sender: from.clone(),
                    payload: message.payload.clone(),
                });
            }
        }
    }
}
