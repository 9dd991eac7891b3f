use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::mapping::ParameterTarget;

/// The render-affecting state. Every field lives in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub size: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            red: 1.0,
            green: 0.0,
            blue: 0.0,
            size: 1.0,
        }
    }
}

impl ParameterSet {
    /// Returns a copy with a single field replaced.
    pub fn with(mut self, target: ParameterTarget, value: f32) -> Self {
        *self.field_mut(target) = value;
        self
    }

    /// Clamps every field into the unit interval. NaN becomes 0.
    pub fn clamped(self) -> Self {
        let unit = |value: f32| if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        Self {
            red: unit(self.red),
            green: unit(self.green),
            blue: unit(self.blue),
            size: unit(self.size),
        }
    }

    fn field_mut(&mut self, target: ParameterTarget) -> &mut f32 {
        match target {
            ParameterTarget::Red => &mut self.red,
            ParameterTarget::Green => &mut self.green,
            ParameterTarget::Blue => &mut self.blue,
            ParameterTarget::Size => &mut self.size,
        }
    }
}

/// Shared, thread-safe home of the current [`ParameterSet`].
///
/// Written from the MIDI input threads and read once per frame by the render
/// thread. The lock is only ever held to copy or patch four floats, so no
/// side waits on another for longer than that. There are deliberately no
/// per-field accessors: a set is replaced and read as a whole.
#[derive(Debug)]
pub struct ParameterStore {
    current: Mutex<ParameterSet>,
    generation: AtomicU64,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::with_initial(ParameterSet::default())
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(initial: ParameterSet) -> Self {
        Self {
            current: Mutex::new(initial),
            generation: AtomicU64::new(0),
        }
    }

    /// Replaces the whole set.
    pub fn write(&self, set: ParameterSet) {
        let mut current = self.current.lock();
        *current = set;
        // bumped under the lock so a reader never sees a new generation with
        // an old set
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Replaces the whole set with `f` applied to the current one, in a
    /// single critical section. Concurrent writers changing different fields
    /// therefore never undo each other. Returns the set that was written.
    pub fn update(&self, f: impl FnOnce(ParameterSet) -> ParameterSet) -> ParameterSet {
        let mut current = self.current.lock();
        *current = f(*current);
        self.generation.fetch_add(1, Ordering::Release);
        *current
    }

    /// Returns a complete copy of the most recently written set.
    pub fn read_snapshot(&self) -> ParameterSet {
        *self.current.lock()
    }

    /// Number of writes so far. Cheap to poll without touching the lock.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
