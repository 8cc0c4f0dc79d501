use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rumble::InputSnapshot;

/// Scripted pilot for a headless client: wanders, hops, swings.
pub struct Bot {
    rng: StdRng,
    direction: f32,
    direction_time: f32,
}

impl Bot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            direction: 0.0,
            direction_time: 0.0,
        }
    }

    pub fn next_input(&mut self, dt: f32) -> InputSnapshot {
        self.direction_time -= dt;
        if self.direction_time <= 0.0 {
            self.direction = [-1.0, 0.0, 1.0][self.rng.gen_range(0..3)];
            self.direction_time = self.rng.gen_range(0.3..1.2);
        }

        let jump = self.rng.gen_bool(0.02);
        InputSnapshot {
            horizontal: self.direction,
            jump,
            jump_held: jump,
            attack: self.rng.gen_bool(0.05),
        }
    }
}
