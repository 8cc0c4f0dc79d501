/// A single tick's worth of player input.
///
/// `horizontal` is the movement axis in `[-1, 1]`; `jump` is the edge-triggered
/// jump press, `jump_held` sustains the jump while the button stays down, and
/// `attack` requests the attack action.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub horizontal: f32,
    pub jump: bool,
    pub jump_held: bool,
    pub attack: bool,
}

impl InputSnapshot {
    /// Return a copy with `horizontal` clamped to the valid `[-1, 1]` range.
    pub fn clamped(self) -> Self {
        Self {
            horizontal: self.horizontal.clamp(-1.0, 1.0),
            ..self
        }
    }
}
