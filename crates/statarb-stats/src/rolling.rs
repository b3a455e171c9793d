use std::collections::VecDeque;

use statarb_core::types::SpreadStats;

/// Window length between full recomputes of the running moments, bounding
/// floating-point drift accumulated by the incremental sum/sum-of-squares
/// recurrence (§4.2).
const RECOMPUTE_INTERVAL: u32 = 1024;

/// Degenerate-variance threshold below which a window is marked unstable.
const STDEV_EPSILON: f64 = 1e-10;

/// Fixed-capacity ring of the last `L` log-price spreads for one pair,
/// carrying running sum and sum-of-squares for O(1) mean/sample-stdev.
#[derive(Debug, Clone)]
pub struct SpreadWindow {
    capacity: usize,
    buf: VecDeque<f64>,
    sum: f64,
    sumsq: f64,
    updates_since_recompute: u32,
}

impl SpreadWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "SpreadWindow capacity must be >= 2");
        Self {
            capacity,
            buf: VecDeque::with_capacity(capacity),
            sum: 0.0,
            sumsq: 0.0,
            updates_since_recompute: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Append the latest log-spread and return the updated statistics, or
    /// `None` while the window has not yet filled to capacity.
    pub fn update(&mut self, spread: f64) -> Option<SpreadStats> {
        if self.buf.len() == self.capacity {
            let evicted = self.buf.pop_front().expect("non-empty at capacity");
            self.sum -= evicted;
            self.sumsq -= evicted * evicted;
        }
        self.buf.push_back(spread);
        self.sum += spread;
        self.sumsq += spread * spread;

        self.updates_since_recompute += 1;
        if self.updates_since_recompute >= RECOMPUTE_INTERVAL {
            self.recompute_exact();
            self.updates_since_recompute = 0;
        }

        if self.buf.len() < self.capacity {
            return None;
        }
        Some(self.stats_unchecked())
    }

    /// Read-only accessor; `None` while not full.
    pub fn stats(&self) -> Option<SpreadStats> {
        if self.buf.len() < self.capacity {
            None
        } else {
            Some(self.stats_unchecked())
        }
    }

    fn recompute_exact(&mut self) {
        self.sum = self.buf.iter().sum();
        self.sumsq = self.buf.iter().map(|v| v * v).sum();
    }

    /// Mean and *sample* stdev (`ddof=1`, divisor `L-1`) over the full window,
    /// with the current bar's spread included in both — this is deliberate,
    /// not an off-by-one (§4.2).
    fn stats_unchecked(&self) -> SpreadStats {
        let n = self.buf.len() as f64;
        let mean = self.sum / n;
        let variance = ((self.sumsq - n * mean * mean) / (n - 1.0)).max(0.0);
        let stdev = variance.sqrt();

        if stdev <= STDEV_EPSILON || !stdev.is_finite() {
            return SpreadStats {
                mean,
                stdev,
                z: 0.0,
                unstable: true,
            };
        }
        let current = *self.buf.back().expect("non-empty");
        let z = (current - mean) / stdev;
        SpreadStats {
            mean,
            stdev,
            z,
            unstable: false,
        }
    }
}
