use glam::Vec2;

use crate::input::InputSnapshot;

/// Movement constants for the kinematic body.
#[derive(Debug, Clone)]
pub struct MoveTuning {
    pub move_speed: f32,
    pub jump_speed: f32,
    /// How long holding jump keeps counteracting gravity.
    pub jump_sustain: f32,
    pub gravity: f32,
    pub ground_y: f32,
    pub attack_cooldown: f32,
}

impl Default for MoveTuning {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            jump_speed: 11.0,
            jump_sustain: 0.25,
            gravity: 30.0,
            ground_y: 0.0,
            attack_cooldown: 0.4,
        }
    }
}

/// A simulated player body.
///
/// Local and remote players run the same simulation; the difference is only
/// in who writes the inputs: the local input controller, or decoded network
/// messages. Position and velocity are freely writable so inbound state
/// corrections can override the integration.
#[derive(Debug, Clone)]
pub struct PlayerEntity {
    pub position: Vec2,
    pub velocity: Vec2,
    tuning: MoveTuning,
    input: InputSnapshot,
    grounded: bool,
    jump_time_left: f32,
    health: i32,
    max_health: i32,
    dying: bool,
    death_event: Option<Vec2>,
    attack_timer: f32,
    attacks_triggered: u32,
}

impl PlayerEntity {
    pub fn new(spawn: Vec2) -> Self {
        Self::with_tuning(spawn, MoveTuning::default())
    }

    pub fn with_tuning(spawn: Vec2, tuning: MoveTuning) -> Self {
        Self {
            position: spawn,
            velocity: Vec2::ZERO,
            grounded: spawn.y <= tuning.ground_y,
            jump_time_left: 0.0,
            health: 1,
            max_health: 1,
            dying: false,
            death_event: None,
            attack_timer: 0.0,
            attacks_triggered: 0,
            input: InputSnapshot::default(),
            tuning,
        }
    }

    /// Write the movement channels. The attack edge is intentionally not
    /// part of this: attacks are one-shot actions, not held state.
    pub fn apply_input(&mut self, input: InputSnapshot) {
        if self.dying {
            return;
        }
        let input = input.clamped();
        self.input.horizontal = input.horizontal;
        self.input.jump = input.jump;
        self.input.jump_held = input.jump_held;
    }

    pub fn input(&self) -> InputSnapshot {
        self.input
    }

    /// Trigger the attack action once, subject to the cooldown.
    pub fn attack(&mut self) {
        if self.dying || self.attack_timer > 0.0 {
            return;
        }
        self.attack_timer = self.tuning.attack_cooldown;
        self.attacks_triggered += 1;
    }

    pub fn attacks_triggered(&self) -> u32 {
        self.attacks_triggered
    }

    pub fn take_damage(&mut self, damage: i32) {
        if self.dying {
            return;
        }
        self.health -= damage;
        if self.health <= 0 {
            self.input = InputSnapshot::default();
            self.play_death_animation();
            self.death_event = Some(self.position);
        }
    }

    /// Consume the pending local-death edge, yielding the death position.
    pub fn take_death_event(&mut self) -> Option<Vec2> {
        self.death_event.take()
    }

    /// Enter the death presentation. Movement and inputs stop; the body is
    /// left in place until the owner despawns it.
    pub fn play_death_animation(&mut self) {
        self.dying = true;
        self.velocity = Vec2::ZERO;
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Reset the body at a new spawn position for the next round.
    pub fn respawn(&mut self, spawn: Vec2) {
        self.position = spawn;
        self.velocity = Vec2::ZERO;
        self.grounded = spawn.y <= self.tuning.ground_y;
        self.jump_time_left = 0.0;
        self.health = self.max_health;
        self.dying = false;
        self.death_event = None;
        self.input = InputSnapshot::default();
    }

    /// Advance the kinematic simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if self.attack_timer > 0.0 {
            self.attack_timer -= dt;
        }
        if self.dying {
            return;
        }

        self.velocity.x = self.input.horizontal * self.tuning.move_speed;

        if self.input.jump && self.grounded {
            self.velocity.y = self.tuning.jump_speed;
            self.grounded = false;
            self.jump_time_left = self.tuning.jump_sustain;
            self.input.jump = false;
        }

        if self.input.jump_held && self.jump_time_left > 0.0 {
            self.jump_time_left -= dt;
        } else {
            self.jump_time_left = 0.0;
            self.velocity.y -= self.tuning.gravity * dt;
        }

        self.position += self.velocity * dt;

        if self.position.y <= self.tuning.ground_y {
            self.position.y = self.tuning.ground_y;
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
            self.grounded = true;
        }
    }
}
