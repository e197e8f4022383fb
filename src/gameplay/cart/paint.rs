use bevy::prelude::*;

/// Chassis color state plus every revert still counting down.
///
/// Reverts are never cancelled: a second hit before the first revert fires leaves both pending,
/// and whichever fires first restores the normal color.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ChassisPaint {
    normal: Color,
    hit: Color,
    current: Color,
    pending_reverts_s: Vec<f32>,
}

impl ChassisPaint {
    pub fn new(normal: Color, hit: Color) -> Self {
        Self {
            normal,
            hit,
            current: normal,
            pending_reverts_s: Vec::new(),
        }
    }

    pub fn current(&self) -> Color {
        self.current
    }

    pub fn is_hit(&self) -> bool {
        self.current == self.hit && self.current != self.normal
    }

    pub fn pending_reverts(&self) -> usize {
        self.pending_reverts_s.len()
    }

    pub fn register_hit(&mut self, revert_after_s: f32) {
        self.current = self.hit;
        self.pending_reverts_s.push(revert_after_s);
    }

    /// Counts every pending revert down by `dt`; returns true when at least one fired.
    pub fn tick(&mut self, dt: f32) -> bool {
        let mut fired = false;
        self.pending_reverts_s.retain_mut(|remaining| {
            *remaining -= dt;
            if *remaining <= 0.0 {
                fired = true;
                false
            } else {
                true
            }
        });

        if fired {
            self.current = self.normal;
        }
        fired
    }
}
