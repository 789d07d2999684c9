//! Fixed-rate simulation clock
//!
//! The clock owns the world and drives it from a dedicated thread: one tick
//! immediately on `start`, then one every `UPDATE_RATE` of wall-clock time.
//! A tick that runs late pushes the schedule to the next free cadence
//! boundary; missed ticks are dropped, never replayed in a burst.
//!
//! The simulated step `delta` is independent from the cadence and can be
//! changed at any time, from any thread, through a [`DeltaHandle`]. A tick
//! reads it once before moving any vehicle.

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::error::{Result, SimError};
use super::observer::{TickFrame, TickObserver};
use super::types::{DEFAULT_DELTA, UPDATE_RATE};
use super::world::SimWorld;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DeltaState {
    delta: f64,
    prev_delta: f64,
}

/// Shared access to the clock's delta, safe to use from other threads
#[derive(Debug, Clone)]
pub struct DeltaHandle {
    state: Arc<Mutex<DeltaState>>,
}

impl DeltaHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DeltaState {
                delta: DEFAULT_DELTA,
                prev_delta: DEFAULT_DELTA,
            })),
        }
    }

    pub fn delta(&self) -> f64 {
        self.state.lock().delta
    }

    pub fn prev_delta(&self) -> f64 {
        self.state.lock().prev_delta
    }

    /// Replace the delta, remembering the one it replaces
    ///
    /// Fails with `InvalidParameter` unless `delta` is finite and positive;
    /// nothing changes in that case. The next tick uses the new value.
    pub fn set_delta(&self, delta: f64) -> Result<()> {
        if !delta.is_finite() || delta <= 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "delta must be finite and > 0, got {delta}"
            )));
        }
        let mut state = self.state.lock();
        state.prev_delta = state.delta;
        state.delta = delta;
        debug!("Delta changed from {}s to {}s", state.prev_delta, state.delta);
        Ok(())
    }
}

/// State shared between the clock and its tick thread
struct ClockShared {
    world: Mutex<SimWorld>,
    observers: Mutex<Vec<Box<dyn TickObserver>>>,
    delta: DeltaHandle,
    running: AtomicBool,
    ticks: AtomicU64,
    scale: f64,
}

impl ClockShared {
    /// Update every vehicle, then notify observers once
    ///
    /// Observers are not notified when the world fails to tick.
    fn run_tick(&self) -> Result<()> {
        let delta = self.delta.delta();
        let mut world = self.world.lock();
        world.tick(delta)?;

        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        let frame = TickFrame {
            tick,
            delta,
            scale: self.scale,
            world: &*world,
        };
        for observer in self.observers.lock().iter_mut() {
            observer.on_tick(&frame);
        }
        Ok(())
    }
}

fn run_loop(shared: Arc<ClockShared>, cadence: Duration) {
    let mut next = Instant::now();

    while shared.running.load(Ordering::Acquire) {
        if let Err(e) = shared.run_tick() {
            error!("Tick failed, stopping the tick loop: {}", e);
            shared.running.store(false, Ordering::Release);
            return;
        }

        next += cadence;
        let now = Instant::now();
        if next < now {
            let behind = now.duration_since(next);
            let skipped = (behind.as_nanos() / cadence.as_nanos()) as u32 + 1;
            debug!("Tick loop behind by {:?}, skipping {} tick(s)", behind, skipped);
            next += cadence * skipped;
        }

        // Sleep until the next boundary, woken early by stop()
        loop {
            if !shared.running.load(Ordering::Acquire) {
                return;
            }
            let now = Instant::now();
            if now >= next {
                break;
            }
            thread::park_timeout(next - now);
        }
    }
}

/// Drives a [`SimWorld`] at a fixed wall-clock cadence
pub struct SimulationClock {
    shared: Arc<ClockShared>,
    cadence: Duration,
    worker: Option<JoinHandle<()>>,
}

impl SimulationClock {
    /// Create a stopped clock for `world`, displayed at `scale` pixels per meter
    pub fn new(world: SimWorld, scale: f64) -> Self {
        Self {
            shared: Arc::new(ClockShared {
                world: Mutex::new(world),
                observers: Mutex::new(Vec::new()),
                delta: DeltaHandle::new(),
                running: AtomicBool::new(false),
                ticks: AtomicU64::new(0),
                scale,
            }),
            cadence: UPDATE_RATE,
            worker: None,
        }
    }

    /// Use a different wall-clock cadence than `UPDATE_RATE`
    pub fn with_cadence(mut self, cadence: Duration) -> Result<Self> {
        if cadence.is_zero() {
            return Err(SimError::InvalidParameter(
                "clock cadence must be > 0".to_string(),
            ));
        }
        self.cadence = cadence;
        Ok(self)
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    pub fn scale(&self) -> f64 {
        self.shared.scale
    }

    pub fn default_delta(&self) -> f64 {
        DEFAULT_DELTA
    }

    pub fn delta(&self) -> f64 {
        self.shared.delta.delta()
    }

    pub fn prev_delta(&self) -> f64 {
        self.shared.delta.prev_delta()
    }

    pub fn set_delta(&self, delta: f64) -> Result<()> {
        self.shared.delta.set_delta(delta)
    }

    /// Handle for changing the delta from another thread
    pub fn delta_handle(&self) -> DeltaHandle {
        self.shared.delta.clone()
    }

    /// True between `start` and `stop`, unless a tick has failed meanwhile
    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.shared.running.load(Ordering::Acquire)
    }

    /// Ticks completed since the clock was created
    pub fn tick_count(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    pub fn add_observer(&self, observer: impl TickObserver + 'static) {
        self.shared.observers.lock().push(Box::new(observer));
    }

    /// Run `f` with the world locked between ticks
    pub fn with_world<R>(&self, f: impl FnOnce(&SimWorld) -> R) -> R {
        f(&*self.shared.world.lock())
    }

    /// Run `f` with mutable access to the world locked between ticks
    pub fn with_world_mut<R>(&self, f: impl FnOnce(&mut SimWorld) -> R) -> R {
        f(&mut *self.shared.world.lock())
    }

    /// Start ticking: one tick now, then one per cadence
    ///
    /// Fails with `InvalidState` if already running and with `FollowCycle`
    /// if the front-vehicle chain loops.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(SimError::InvalidState("clock is already running".to_string()));
        }
        // Reap a tick loop that halted on its own
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Tick loop panicked before it was restarted");
            }
        }
        self.shared.world.lock().validate_chain()?;

        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let cadence = self.cadence;
        let worker = thread::Builder::new()
            .name("sim-clock".to_string())
            .spawn(move || run_loop(shared, cadence))
            .map_err(|e| {
                self.shared.running.store(false, Ordering::Release);
                SimError::InvalidState(format!("failed to spawn tick loop: {e}"))
            })?;

        self.worker = Some(worker);
        info!(
            "Simulation clock started (cadence {:?}, delta {}s)",
            self.cadence,
            self.delta()
        );
        Ok(())
    }

    /// Stop ticking
    ///
    /// Waits for a tick in progress to finish; no tick runs once this
    /// returns. Fails with `InvalidState` if the clock is not running.
    pub fn stop(&mut self) -> Result<()> {
        let worker = self
            .worker
            .take()
            .ok_or_else(|| SimError::InvalidState("clock is already stopped".to_string()))?;

        self.shared.running.store(false, Ordering::Release);
        worker.thread().unpark();
        if worker.join().is_err() {
            warn!("Tick loop panicked before it was stopped");
        }

        info!("Simulation clock stopped after {} tick(s)", self.tick_count());
        Ok(())
    }

    /// Run a single tick on the calling thread
    ///
    /// Only allowed while stopped, so it never overlaps the tick loop. Fails
    /// with `UnknownVehicle` if a front link points nowhere; nothing moves
    /// and observers are not notified in that case.
    pub fn step(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(SimError::InvalidState(
                "cannot step a running clock".to_string(),
            ));
        }
        self.shared.run_tick()
    }
}

impl Drop for SimulationClock {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop();
        }
    }
}
