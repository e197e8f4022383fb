/// Where a recycled slot should be moved this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingPlacement {
    pub slot: usize,
    pub x: f32,
}

/// Circular read index plus watermark over a fixed set of terrain slots.
///
/// The watermark only ever grows; moving backward past it never pulls slots back.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainRing {
    slot_count: usize,
    segment_width: f32,
    watermark: f32,
    next_slot: usize,
    advances: u64,
}

impl TerrainRing {
    /// Slots 0 and 1 start at `[0, 2w)`; the rest are parked contiguously behind the origin so
    /// the next slot to recycle is always the one furthest back.
    pub fn new(slot_count: usize, segment_width: f32) -> Self {
        assert!(slot_count > 0, "terrain ring needs at least one slot");
        Self {
            slot_count,
            segment_width,
            watermark: 0.0,
            next_slot: 2 % slot_count,
            advances: 0,
        }
    }

    pub fn initial_slot_x(&self, slot: usize) -> f32 {
        if slot < 2 {
            slot as f32 * self.segment_width
        } else {
            (slot as f32 - self.slot_count as f32) * self.segment_width
        }
    }

    pub fn watermark(&self) -> f32 {
        self.watermark
    }

    pub fn next_slot(&self) -> usize {
        self.next_slot
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn advances(&self) -> u64 {
        self.advances
    }

    /// Advances at most once per call when `chassis_x` has reached one segment past the
    /// watermark; the recycled slot lands one segment ahead of the new watermark.
    pub fn advance(&mut self, chassis_x: f32) -> Option<RingPlacement> {
        if chassis_x < self.watermark + self.segment_width {
            return None;
        }

        self.watermark += self.segment_width;
        let slot = self.next_slot;
        self.next_slot = (self.next_slot + 1) % self.slot_count;
        self.advances += 1;

        Some(RingPlacement {
            slot,
            x: self.watermark + self.segment_width,
        })
    }
}
