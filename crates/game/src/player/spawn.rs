use glam::Vec2;

/// Ordered set of spawn positions. Wire messages reference slots by index,
/// so the layout order must be identical on every client.
#[derive(Debug, Clone)]
pub struct SpawnLayout {
    points: Vec<Vec2>,
}

impl Default for SpawnLayout {
    fn default() -> Self {
        Self {
            points: vec![
                Vec2::new(-12.0, 0.0),
                Vec2::new(-4.0, 0.0),
                Vec2::new(4.0, 0.0),
                Vec2::new(12.0, 0.0),
            ],
        }
    }
}

impl SpawnLayout {
    pub fn new(points: Vec<Vec2>) -> Self {
        debug_assert!(!points.is_empty());
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Resolve a slot index to a position. Indices from the wire may exceed
    /// the layout on a misconfigured peer; wrap rather than drop the spawn.
    pub fn point(&self, index: usize) -> Vec2 {
        self.points[index % self.points.len()]
    }
}
