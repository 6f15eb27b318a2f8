//! Timed spawn sequence
//!
//! Emits `count` sizes evenly spread over `[min, max]`, one per interval.
//! The first size is emitted on the first poll.

/// Remaining wait treated as elapsed (absorbs f32 drift of summed ticks)
const WAIT_EPSILON: f32 = 1e-4;

/// Incremental producer of box sizes
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSequencer {
    count: usize,
    emitted: usize,
    min_size: f32,
    max_size: f32,
    step: f32,
    interval: f32,
    /// Seconds left before the next emission
    wait: f32,
}

impl SpawnSequencer {
    pub fn new(count: usize, min_size: f32, max_size: f32, interval: f32) -> Self {
        let step = if count > 1 {
            (max_size - min_size) / (count - 1) as f32
        } else {
            // Nothing to interpolate between
            log::debug!("Spawn count {} leaves no size step, using {}", count, min_size);
            0.0
        };
        Self {
            count,
            emitted: 0,
            min_size,
            max_size,
            step,
            interval,
            wait: 0.0,
        }
    }

    /// Size of the `index`-th box of the sequence
    pub fn size_at(&self, index: usize) -> f32 {
        if self.count > 1 && index + 1 == self.count {
            self.max_size
        } else {
            self.min_size + self.step * index as f32
        }
    }

    /// Advance by one tick; returns the size to spawn now, if any
    pub fn poll(&mut self, dt: f32) -> Option<f32> {
        if self.is_finished() {
            return None;
        }
        if self.emitted > 0 {
            self.wait -= dt;
        }
        if self.wait > WAIT_EPSILON {
            return None;
        }
        let size = self.size_at(self.emitted);
        self.emitted += 1;
        // Overshoot carries into the next interval
        self.wait += self.interval;
        Some(size)
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.emitted >= self.count
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn step(&self) -> f32 {
        self.step
    }
}
