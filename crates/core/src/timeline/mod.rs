use std::time::{Duration, Instant};

/// Timing for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    pub index: u64,
    /// Time since the clock started.
    pub elapsed: Duration,
    /// Time since the previous tick.
    pub delta: Duration,
}

/// Fixed-cadence frame pacing for a display-less render loop.
///
/// The clock never sleeps itself; a driver asks for [`FrameClock::next_deadline`]
/// and waits until then. Deadlines advance on a fixed grid from the start
/// time, and a driver that falls more than one frame behind skips ahead
/// instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    start: Instant,
    last: Instant,
    next_deadline: Instant,
    frames: u64,
}

impl FrameClock {
    pub fn new(frames_per_second: u32, now: Instant) -> Self {
        let interval = Duration::from_secs(1) / frames_per_second.max(1);
        Self {
            interval,
            start: now,
            last: now,
            next_deadline: now,
            frames: 0,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.interval
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Records a frame starting at `now` and schedules the next one.
    pub fn tick(&mut self, now: Instant) -> FrameTick {
        let tick = FrameTick {
            index: self.frames,
            elapsed: now.saturating_duration_since(self.start),
            delta: now.saturating_duration_since(self.last),
        };

        self.frames += 1;
        self.last = now;
        self.next_deadline += self.interval;
        if self.next_deadline <= now {
            self.next_deadline = now + self.interval;
        }
        tick
    }

    /// How long a driver should wait from `now` before the next frame.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }
}
