use glam::Vec2;

use crate::player::PlayerEntity;

use super::protocol::WireEvent;

pub const DEFAULT_LERP_DURATION: f32 = 0.05;

/// Applies inbound state to a remotely simulated player without visible
/// teleporting.
///
/// Velocity corrections are applied instantly (they are small and
/// continuous); position corrections are smoothed by interpolating from
/// the entity's current rendered position to the reported one over a fixed
/// window. A correction arriving mid-interpolation restarts the window
/// from wherever the entity currently is; targets are never queued.
#[derive(Debug)]
pub struct RemoteSync {
    lerp_duration: f32,
    lerp_timer: f32,
    lerp_from: Vec2,
    lerp_to: Vec2,
    lerp_active: bool,
}

impl Default for RemoteSync {
    fn default() -> Self {
        Self::new(DEFAULT_LERP_DURATION)
    }
}

impl RemoteSync {
    pub fn new(lerp_duration: f32) -> Self {
        Self {
            lerp_duration,
            lerp_timer: 0.0,
            lerp_from: Vec2::ZERO,
            lerp_to: Vec2::ZERO,
            lerp_active: false,
        }
    }

    /// Apply a decoded message to the entity. Opcodes that belong to the
    /// coordinator (round lifecycle) are ignored here.
    pub fn apply(&mut self, event: &WireEvent, entity: &mut PlayerEntity) {
        match event {
            WireEvent::VelocityAndPosition { velocity, position } => {
                entity.velocity = *velocity;
                self.lerp_from = entity.position;
                self.lerp_to = *position;
                self.lerp_timer = 0.0;
                self.lerp_active = true;
            }
            WireEvent::Input(input) => {
                entity.apply_input(*input);
                if input.attack {
                    entity.attack();
                }
            }
            WireEvent::Died { .. } => {
                // Presentation only. Roster bookkeeping is the
                // coordinator's job.
                entity.play_death_animation();
            }
            WireEvent::Respawned { .. }
            | WireEvent::NewRound { .. }
            | WireEvent::Unknown { .. } => {}
        }
    }

    /// Advance the position interpolation by `dt` seconds. Runs after the
    /// entity's own simulation step each tick.
    pub fn tick(&mut self, dt: f32, entity: &mut PlayerEntity) {
        if !self.lerp_active {
            return;
        }

        self.lerp_timer += dt;
        if self.lerp_timer >= self.lerp_duration {
            entity.position = self.lerp_to;
            self.lerp_active = false;
        } else {
            let t = (self.lerp_timer / self.lerp_duration).clamp(0.0, 1.0);
            entity.position = self.lerp_from.lerp(self.lerp_to, t);
        }
    }

    pub fn is_interpolating(&self) -> bool {
        self.lerp_active
    }

    /// Drop any in-flight interpolation, e.g. when the entity is about to
    /// be despawned or repositioned by a respawn.
    pub fn cancel(&mut self) {
        self.lerp_active = false;
        self.lerp_timer = 0.0;
    }
}
