use std::collections::BTreeMap;

use glam::Vec2;
use serde_json::Value;

use crate::input::InputSnapshot;

/// Message kinds carried over the relay. The numeric values are the wire
/// contract and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum Opcode {
    VelocityAndPosition = 1,
    Input = 2,
    Died = 3,
    Respawned = 4,
    NewRound = 5,
}

impl Opcode {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::VelocityAndPosition),
            2 => Some(Self::Input),
            3 => Some(Self::Died),
            4 => Some(Self::Respawned),
            5 => Some(Self::NewRound),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl DecodeError {
    fn missing(key: &str) -> Self {
        Self::MalformedPayload(format!("missing field {key:?}"))
    }

    fn unparseable(key: &str, value: &str, ty: &str) -> Self {
        Self::MalformedPayload(format!("field {key:?} = {value:?} is not a {ty}"))
    }
}

/// Flat field map, the payload of every message: fixed string keys to
/// textual values. Numbers and booleans travel in their canonical Rust
/// text form, which is locale-invariant and round-trips exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: BTreeMap<String, String>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Result<&str, DecodeError> {
        self.fields
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| DecodeError::missing(key))
    }

    pub fn get_f32(&self, key: &str) -> Result<f32, DecodeError> {
        let raw = self.get(key)?;
        raw.parse()
            .map_err(|_| DecodeError::unparseable(key, raw, "float"))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, DecodeError> {
        let raw = self.get(key)?;
        raw.parse()
            .map_err(|_| DecodeError::unparseable(key, raw, "bool"))
    }

    pub fn get_index(&self, key: &str) -> Result<usize, DecodeError> {
        let raw = self.get(key)?;
        raw.parse()
            .map_err(|_| DecodeError::unparseable(key, raw, "non-negative integer"))
    }

    /// Serialize to the wire bytes: a UTF-8 JSON object. Keys are emitted
    /// in sorted order, so encoding is deterministic.
    pub fn encode(&self) -> Vec<u8> {
        let map: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map).to_string().into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let fields: BTreeMap<String, String> = serde_json::from_slice(bytes)
            .map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
        Ok(Self { fields })
    }
}

/// A decoded inbound message body.
///
/// `Unknown` is not an error: opcodes this build does not understand are
/// carried through so consumers can ignore them explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum WireEvent {
    VelocityAndPosition { velocity: Vec2, position: Vec2 },
    Input(InputSnapshot),
    Died { position: Vec2 },
    Respawned { spawn_index: usize },
    NewRound { winner_name: String },
    Unknown { opcode: i64 },
}

impl WireEvent {
    pub fn velocity_and_position(velocity: Vec2, position: Vec2) -> Self {
        Self::VelocityAndPosition { velocity, position }
    }

    pub fn opcode(&self) -> i64 {
        match self {
            Self::VelocityAndPosition { .. } => Opcode::VelocityAndPosition.as_i64(),
            Self::Input(_) => Opcode::Input.as_i64(),
            Self::Died { .. } => Opcode::Died.as_i64(),
            Self::Respawned { .. } => Opcode::Respawned.as_i64(),
            Self::NewRound { .. } => Opcode::NewRound.as_i64(),
            Self::Unknown { opcode } => *opcode,
        }
    }

    /// Encode this event's payload field map to wire bytes.
    pub fn encode_payload(&self) -> Vec<u8> {
        let payload = match self {
            Self::VelocityAndPosition { velocity, position } => Payload::new()
                .with("velocity.x", velocity.x)
                .with("velocity.y", velocity.y)
                .with("position.x", position.x)
                .with("position.y", position.y),
            Self::Input(input) => Payload::new()
                .with("horizontalInput", input.horizontal)
                .with("jump", input.jump)
                .with("jumpHeld", input.jump_held)
                .with("attack", input.attack),
            Self::Died { position } => Payload::new()
                .with("position.x", position.x)
                .with("position.y", position.y),
            Self::Respawned { spawn_index } => Payload::new().with("spawnIndex", spawn_index),
            Self::NewRound { winner_name } => {
                Payload::new().with("winningPlayerName", winner_name)
            }
            Self::Unknown { .. } => Payload::new(),
        };
        payload.encode()
    }

    /// Decode a raw message body. Fails only on a payload that is missing
    /// or fails to parse a required field; the caller drops such messages
    /// without touching any state.
    pub fn decode(opcode: i64, payload: &[u8]) -> Result<Self, DecodeError> {
        let Some(known) = Opcode::from_i64(opcode) else {
            return Ok(Self::Unknown { opcode });
        };

        let fields = Payload::decode(payload)?;
        match known {
            Opcode::VelocityAndPosition => Ok(Self::VelocityAndPosition {
                velocity: Vec2::new(fields.get_f32("velocity.x")?, fields.get_f32("velocity.y")?),
                position: Vec2::new(fields.get_f32("position.x")?, fields.get_f32("position.y")?),
            }),
            Opcode::Input => Ok(Self::Input(InputSnapshot {
                horizontal: fields.get_f32("horizontalInput")?,
                jump: fields.get_bool("jump")?,
                jump_held: fields.get_bool("jumpHeld")?,
                attack: fields.get_bool("attack")?,
            })),
            Opcode::Died => Ok(Self::Died {
                position: Vec2::new(fields.get_f32("position.x")?, fields.get_f32("position.y")?),
            }),
            Opcode::Respawned => Ok(Self::Respawned {
                spawn_index: fields.get_index("spawnIndex")?,
            }),
            Opcode::NewRound => Ok(Self::NewRound {
                winner_name: fields.get("winningPlayerName")?.to_string(),
            }),
        }
    }
}
