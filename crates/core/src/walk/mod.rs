use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::RingModel;

/// Recurring timer driving the bounded random walk.
///
/// The worker thread holds only a weak reference to the model, so a torn
/// down model ends the walk on its next tick rather than being kept alive
/// by it. The stop channel doubles as the tick clock: `recv_timeout`
/// sleeps for one period and wakes immediately when the timer is dropped.
#[derive(Debug)]
pub struct WalkTimer {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WalkTimer {
    /// Spawns the timer. Every `interval` the model is upgraded, checked
    /// for the walk flag still being set, and randomized once.
    pub fn spawn(model: Weak<Mutex<RingModel>>, interval: Duration) -> Self {
        let (stop, ticks) = mpsc::channel::<()>();
        let thread = thread::spawn(move || loop {
            match ticks.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            let Some(shared) = model.upgrade() else { break };
            let Ok(mut ring) = shared.lock() else { break };
            if !ring.random_walk_enabled() {
                break;
            }
            ring.randomize();
        });

        Self {
            stop: Some(stop),
            thread: Some(thread),
        }
    }
}

impl Drop for WalkTimer {
    fn drop(&mut self) {
        // Dropping the sender wakes the worker out of its sleep, so the
        // join below returns promptly instead of after a full period.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
