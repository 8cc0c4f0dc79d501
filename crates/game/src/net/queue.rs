use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::session::Presence;

/// An undecoded inbound message as handed over by the transport: opcode,
/// sending presence, raw payload bytes. Decoding happens on the update
/// loop, never on the network execution context.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub opcode: i64,
    pub sender: Presence,
    pub payload: Vec<u8>,
}

/// Bounded handoff queue between the network execution context and the
/// update loop.
///
/// The transport callback may only ever `push`; the update loop calls
/// `drain` exactly once per tick and performs all decoding and state
/// mutation there. When the queue is full the oldest message is evicted:
/// state sync is periodic and idempotent, so old traffic is the right
/// thing to shed.
#[derive(Debug, Clone)]
pub struct InboundQueue {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    messages: VecDeque<RawMessage>,
    capacity: usize,
    dropped: u64,
}

impl InboundQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                messages: VecDeque::with_capacity(capacity),
                capacity,
                dropped: 0,
            })),
        }
    }

    /// Enqueue a raw message. Safe to call from any thread.
    pub fn push(&self, message: RawMessage) {
        let mut inner = self.lock();
        if inner.messages.len() >= inner.capacity {
            inner.messages.pop_front();
            inner.dropped += 1;
            log::warn!("inbound queue full, dropping oldest message");
        }
        inner.messages.push_back(message);
    }

    /// Take everything queued so far. Called once per tick by the update
    /// loop.
    pub fn drain(&self) -> Vec<RawMessage> {
        self.lock().messages.drain(..).collect()
    }

    /// Discard everything queued, e.g. on match quit.
    pub fn clear(&self) {
        self.lock().messages.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
