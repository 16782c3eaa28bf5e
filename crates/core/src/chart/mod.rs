use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::model::{RingModel, RingSnapshot, Subscriber, Wedge, WedgeId};
use crate::walk::WalkTimer;
use crate::{ChartConfig, Result, RingVizError};

/// High level chart façade.
///
/// Wraps the single-threaded [`RingModel`] for shared use by the input
/// collaborator, the rendering collaborator and the walk timer. Methods
/// return `Result` only because a poisoned model lock has to surface
/// somewhere; the model operations themselves never fail.
#[derive(Debug)]
pub struct RingChart {
    model: Arc<Mutex<RingModel>>,
    walk: Mutex<Option<WalkTimer>>,
    walk_interval: Duration,
}

impl RingChart {
    /// Creates a chart with the standard one-second walk period.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    /// Creates a chart with an explicit walk period.
    pub fn with_interval(walk_interval: Duration) -> Self {
        Self {
            model: Arc::new(Mutex::new(RingModel::new())),
            walk: Mutex::new(None),
            walk_interval,
        }
    }

    pub fn from_config(config: &ChartConfig) -> Self {
        Self::with_interval(config.walk_interval())
    }

    /// Returns a cloneable view over the shared model.
    pub fn handle(&self) -> RingHandle {
        RingHandle::new(Arc::clone(&self.model))
    }

    pub fn add_wedge(&self, wedge: Wedge) -> Result<WedgeId> {
        Ok(self.lock_model()?.add_wedge(wedge))
    }

    pub fn remove_wedge(&self, id: WedgeId) -> Result<()> {
        self.lock_model()?.remove_wedge(id);
        Ok(())
    }

    pub fn reset(&self) -> Result<()> {
        self.lock_model()?.reset();
        Ok(())
    }

    pub fn randomize(&self) -> Result<()> {
        self.lock_model()?.randomize();
        Ok(())
    }

    /// Runs `body` against the model inside one batch scope, so any number
    /// of mutations produce a single notification.
    pub fn batch<R>(&self, body: impl FnOnce(&mut RingModel) -> R) -> Result<R> {
        let mut model = self.lock_model()?;
        Ok(model.batch(body))
    }

    pub fn subscribe(&self, subscriber: impl FnMut(&RingSnapshot) + Send + 'static) -> Result<()> {
        self.lock_model()?.subscribe(subscriber);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<RingSnapshot> {
        Ok(self.lock_model()?.snapshot())
    }

    /// Turns the periodic random walk on or off. Repeating the current
    /// setting is a no-op, so no duplicate timers can exist. Enabling
    /// randomizes once immediately and then once per period; disabling
    /// cancels the timer synchronously.
    pub fn set_random_walk(&self, enabled: bool) -> Result<()> {
        let mut walk = self.lock_walk()?;
        let mut model = self.lock_model()?;
        if model.random_walk_enabled() == enabled {
            return Ok(());
        }

        model.set_random_walk_flag(enabled);
        if enabled {
            model.randomize();
            drop(model);
            *walk = Some(WalkTimer::spawn(
                Arc::downgrade(&self.model),
                self.walk_interval,
            ));
        } else {
            // The model lock must be released before the timer's Drop
            // joins a worker that may be waiting on it.
            drop(model);
            *walk = None;
        }
        Ok(())
    }

    pub fn random_walk_enabled(&self) -> Result<bool> {
        Ok(self.lock_model()?.random_walk_enabled())
    }

    fn lock_model(&self) -> Result<MutexGuard<'_, RingModel>> {
        self.model
            .lock()
            .map_err(|_| RingVizError::msg("ring model lock has been poisoned"))
    }

    fn lock_walk(&self) -> Result<MutexGuard<'_, Option<WalkTimer>>> {
        self.walk
            .lock()
            .map_err(|_| RingVizError::msg("walk timer slot has been poisoned"))
    }
}

impl Default for RingChart {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, thread-safe view over the model managed by [`RingChart`].
#[derive(Clone)]
pub struct RingHandle {
    shared: Arc<Mutex<RingModel>>,
}

impl RingHandle {
    pub(crate) fn new(shared: Arc<Mutex<RingModel>>) -> Self {
        Self { shared }
    }

    pub fn snapshot(&self) -> Result<RingSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    pub fn wedge_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Registers a boxed change subscriber with the shared model.
    pub fn subscribe(&self, subscriber: Subscriber) -> Result<()> {
        self.lock()?.subscribe(subscriber);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, RingModel>> {
        self.shared
            .lock()
            .map_err(|_| RingVizError::msg("ring model lock has been poisoned"))
    }
}

impl std::fmt::Debug for RingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingHandle").finish()
    }
}
