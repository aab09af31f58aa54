//! Simulation clock

/// Fixed-step simulation time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Time {
    /// Length of the current tick in seconds
    delta: f32,
    /// Seconds simulated before the current tick, kept wide so long runs
    /// do not drift
    elapsed: f64,
    /// Number of completed ticks
    ticks: u64,
}

impl Time {
    /// Clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the length of the tick about to run
    pub fn begin_tick(&mut self, dt: f32) {
        self.delta = dt.max(0.0);
    }

    /// Close the current tick
    pub fn end_tick(&mut self) {
        self.elapsed += f64::from(self.delta);
        self.ticks += 1;
    }

    /// Length of the current tick in seconds
    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    /// Simulated seconds at the start of the current tick
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}
