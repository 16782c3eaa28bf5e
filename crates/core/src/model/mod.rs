use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{layout, Result, RingVizError};

/// Identifier allocated by [`RingModel`] when a wedge is inserted. Ids are
/// opaque to callers and never reused within a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WedgeId(u64);

impl WedgeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One angular slice of the ring.
///
/// `width` is the layout input and is not itself rendered; `start` and
/// `end` are derived angular bounds written only by the model's layout
/// step. Drawing reads `start`, `end`, `depth` and `hue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wedge {
    pub width: f64,
    pub depth: f64,
    pub hue: f64,
    start: f64,
    end: f64,
}

impl Wedge {
    pub fn new(width: f64, depth: f64, hue: f64) -> Self {
        Self {
            width,
            depth,
            hue,
            start: 0.0,
            end: 0.0,
        }
    }

    /// Samples a fresh wedge for the "add" gesture using the thread rng.
    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }

    /// Samples a fresh wedge from the provided rng.
    pub fn random_with<R: Rng>(rng: &mut R) -> Self {
        Self::new(
            rng.gen_range(0.5..=1.0),
            rng.gen_range(0.2..=1.0),
            rng.gen_range(0.0..=1.0),
        )
    }

    /// Start angle in radians, in `[0, 2π]`.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End angle in radians, in `[0, 2π]`.
    pub fn end(&self) -> f64 {
        self.end
    }
}

/// Resamples a value within ±0.2 of its current position, clamped to
/// `[0.2, 1]`. The sampling window is clamped before drawing so a value
/// outside the nominal range still yields a well-formed interval.
fn jitter<R: Rng>(rng: &mut R, value: f64) -> f64 {
    let high = (value + 0.2).min(1.0);
    let low = (value - 0.2).max(0.2).min(high);
    rng.gen_range(low..=high)
}

/// Owned copy of the model state delivered with each change notification
/// and serialized by the export path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingSnapshot {
    pub order: Vec<WedgeId>,
    pub wedges: HashMap<WedgeId, Wedge>,
}

impl RingSnapshot {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn wedge(&self, id: WedgeId) -> Option<&Wedge> {
        self.wedges.get(&id)
    }

    /// Walks the wedges in display order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (WedgeId, &Wedge)> {
        self.order
            .iter()
            .filter_map(|id| self.wedges.get(id).map(|wedge| (*id, wedge)))
    }

    /// Serializes the snapshot for the export command.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| RingVizError::msg(err.to_string()))
    }
}

/// Change subscriber invoked synchronously after each committed update.
pub type Subscriber = Box<dyn FnMut(&RingSnapshot) + Send>;

/// Interactive data model behind the ring chart.
///
/// The model owns the wedge collection and its display order, recomputes
/// every wedge's angular span whenever the set changes, and notifies its
/// subscribers exactly once per logical update. Mutations made inside
/// [`RingModel::batch`] collapse into a single recompute and notification.
///
/// All methods assume a single logical thread of control; shared access
/// for the walk timer is layered on top by [`crate::RingChart`].
#[derive(Default)]
pub struct RingModel {
    wedges: HashMap<WedgeId, Wedge>,
    order: Vec<WedgeId>,
    next_id: u64,
    random_walk_enabled: bool,
    batch_depth: u32,
    dirty: bool,
    subscribers: Vec<Subscriber>,
}

impl RingModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a wedge at the end of the display order and returns its
    /// freshly allocated id. Growth is unbounded.
    pub fn add_wedge(&mut self, wedge: Wedge) -> WedgeId {
        let id = WedgeId(self.next_id);
        self.next_id += 1;
        self.wedges.insert(id, wedge);
        self.order.push(id);
        self.dirty = true;
        self.commit();
        id
    }

    /// Removes a wedge. Unknown ids are a silent no-op and emit no
    /// notification.
    pub fn remove_wedge(&mut self, id: WedgeId) {
        if self.wedges.remove(&id).is_some() {
            self.order.retain(|other| *other != id);
            self.dirty = true;
            self.commit();
        }
    }

    /// Clears all wedges. A reset of an already-empty model is a no-op.
    pub fn reset(&mut self) {
        if self.order.is_empty() {
            return;
        }
        self.wedges.clear();
        self.order.clear();
        self.dirty = true;
        self.commit();
    }

    /// Applies one bounded random-walk step to every wedge using the
    /// thread rng.
    pub fn randomize(&mut self) {
        self.randomize_with(&mut rand::thread_rng());
    }

    /// Applies one bounded random-walk step to every wedge: `width` and
    /// `depth` are resampled within ±0.2 of their current values, clamped
    /// to `[0.2, 1]`. `hue` is untouched; spans are refreshed by the
    /// layout step. An empty model is a no-op.
    pub fn randomize_with<R: Rng>(&mut self, rng: &mut R) {
        if self.order.is_empty() {
            return;
        }
        for id in &self.order {
            if let Some(wedge) = self.wedges.get_mut(id) {
                wedge.width = jitter(rng, wedge.width);
                wedge.depth = jitter(rng, wedge.depth);
            }
        }
        self.dirty = true;
        self.commit();
    }

    /// Runs `body` with recompute and notification suspended, committing
    /// the net effect once when the outermost batch completes. Batches
    /// nest; only the outermost completion triggers the notification.
    pub fn batch<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_update();
        let result = body(self);
        self.end_update();
        result
    }

    /// Opens a batch scope by hand. Prefer [`RingModel::batch`].
    pub fn begin_update(&mut self) {
        self.batch_depth += 1;
    }

    /// Closes a batch scope opened by [`RingModel::begin_update`]. An
    /// unbalanced close saturates at zero instead of panicking.
    pub fn end_update(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        self.commit();
    }

    /// Registers a change subscriber. Subscribers are invoked in
    /// registration order, once per committed update, for the life of the
    /// model.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&RingSnapshot) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn random_walk_enabled(&self) -> bool {
        self.random_walk_enabled
    }

    pub(crate) fn set_random_walk_flag(&mut self, enabled: bool) {
        self.random_walk_enabled = enabled;
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Display/layout order of the wedge ids.
    pub fn order(&self) -> &[WedgeId] {
        &self.order
    }

    pub fn wedge(&self, id: WedgeId) -> Option<&Wedge> {
        self.wedges.get(&id)
    }

    /// Copies the current state for subscribers and the export path.
    pub fn snapshot(&self) -> RingSnapshot {
        RingSnapshot {
            order: self.order.clone(),
            wedges: self.wedges.clone(),
        }
    }

    /// Recomputes spans and notifies subscribers, provided no batch is in
    /// flight and an observable mutation actually happened.
    fn commit(&mut self) {
        if self.batch_depth > 0 || !self.dirty {
            return;
        }
        self.relayout();
        self.dirty = false;

        let snapshot = self.snapshot();
        for subscriber in &mut self.subscribers {
            subscriber(&snapshot);
        }
    }

    fn relayout(&mut self) {
        let widths: Vec<f64> = self.order.iter().map(|id| self.wedges[id].width).collect();
        let spans = layout::pack_spans(&widths);
        for (id, span) in self.order.iter().zip(spans) {
            if let Some(wedge) = self.wedges.get_mut(id) {
                wedge.start = span.start;
                wedge.end = span.end;
            }
        }
    }
}

impl std::fmt::Debug for RingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingModel")
            .field("order", &self.order)
            .field("next_id", &self.next_id)
            .field("random_walk_enabled", &self.random_walk_enabled)
            .field("batch_depth", &self.batch_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn wedge(width: f64) -> Wedge {
        Wedge::new(width, 0.5, 0.25)
    }

    fn counting_model() -> (RingModel, Arc<AtomicUsize>) {
        let mut model = RingModel::new();
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notifications);
        model.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (model, notifications)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn add_allocates_monotonic_ids_and_lays_out_from_zero() {
        let mut model = RingModel::new();

        let first = model.add_wedge(wedge(1.0));
        let second = model.add_wedge(wedge(1.0));

        assert!(first.raw() < second.raw());
        assert_close(model.wedge(first).unwrap().start(), 0.0);
        assert_close(model.wedge(first).unwrap().end(), 1.0);
        assert_close(model.wedge(second).unwrap().start(), 1.0);
    }

    #[test]
    fn ids_are_never_reused_after_removal() {
        let mut model = RingModel::new();

        let first = model.add_wedge(wedge(1.0));
        model.remove_wedge(first);
        let second = model.add_wedge(wedge(1.0));

        assert!(second.raw() > first.raw());
    }

    #[test]
    fn order_and_wedges_agree_after_mutations() {
        let mut model = RingModel::new();

        let a = model.add_wedge(wedge(0.5));
        let b = model.add_wedge(wedge(0.7));
        let c = model.add_wedge(wedge(0.9));
        model.remove_wedge(b);

        assert_eq!(model.order(), &[a, c]);
        assert_eq!(model.len(), 2);
        for id in model.order() {
            assert!(model.wedge(*id).is_some());
        }
    }

    #[test]
    fn removing_unknown_id_is_a_silent_noop() {
        let (mut model, notifications) = counting_model();
        let id = model.add_wedge(wedge(1.0));
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        model.remove_wedge(id);
        assert_eq!(notifications.load(Ordering::SeqCst), 2);

        // Second removal of the same id must not notify again.
        model.remove_wedge(id);
        assert_eq!(notifications.load(Ordering::SeqCst), 2);
        assert!(model.is_empty());
    }

    #[test]
    fn reset_on_empty_model_emits_nothing() {
        let (mut model, notifications) = counting_model();

        model.reset();

        assert_eq!(notifications.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reset_clears_and_notifies_exactly_once() {
        let (mut model, notifications) = counting_model();
        model.add_wedge(wedge(1.0));
        model.add_wedge(wedge(2.0));
        let before = notifications.load(Ordering::SeqCst);

        model.reset();

        assert!(model.is_empty());
        assert_eq!(notifications.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn batch_collapses_notifications_into_one() {
        let (mut model, notifications) = counting_model();

        model.batch(|model| {
            model.add_wedge(wedge(1.0));
            model.add_wedge(wedge(2.0));
            model.add_wedge(wedge(3.0));
        });

        assert_eq!(notifications.load(Ordering::SeqCst), 1);
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn batched_and_unbatched_mutations_agree_on_final_state() {
        let mut batched = RingModel::new();
        batched.batch(|model| {
            model.add_wedge(wedge(1.5));
            model.add_wedge(wedge(2.5));
        });

        let mut unbatched = RingModel::new();
        unbatched.add_wedge(wedge(1.5));
        unbatched.add_wedge(wedge(2.5));

        assert_eq!(batched.order(), unbatched.order());
        for id in batched.order() {
            let a = batched.wedge(*id).unwrap();
            let b = unbatched.wedge(*id).unwrap();
            assert_close(a.width, b.width);
            assert_close(a.start(), b.start());
            assert_close(a.end(), b.end());
        }
    }

    #[test]
    fn nested_batches_notify_once_at_outermost_completion() {
        let (mut model, notifications) = counting_model();

        model.batch(|model| {
            model.add_wedge(wedge(1.0));
            model.batch(|model| {
                model.add_wedge(wedge(2.0));
                model.reset();
                model.add_wedge(wedge(3.0));
            });
            assert_eq!(notifications.load(Ordering::SeqCst), 0);
        });

        assert_eq!(notifications.load(Ordering::SeqCst), 1);
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn batch_of_noops_emits_nothing() {
        let (mut model, notifications) = counting_model();

        model.batch(|model| {
            model.remove_wedge(WedgeId(42));
            model.reset();
        });

        assert_eq!(notifications.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unbalanced_end_update_saturates_instead_of_panicking() {
        let (mut model, notifications) = counting_model();

        model.end_update();
        model.end_update();
        model.add_wedge(wedge(1.0));

        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn overfull_ring_is_compressed_to_exactly_one_turn() {
        let mut model = RingModel::new();

        let a = model.add_wedge(wedge(4.0));
        let b = model.add_wedge(wedge(4.0));

        assert_close(model.wedge(a).unwrap().end(), TAU / 2.0);
        assert_close(model.wedge(b).unwrap().end(), TAU);
    }

    #[test]
    fn spans_stay_contiguous_across_arbitrary_mutations() {
        let mut model = RingModel::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10 {
            model.add_wedge(Wedge::random_with(&mut rng));
        }
        let victim = model.order()[3];
        model.remove_wedge(victim);
        model.randomize_with(&mut rng);

        let order = model.order().to_vec();
        assert_close(model.wedge(order[0]).unwrap().start(), 0.0);
        for pair in order.windows(2) {
            let prev = model.wedge(pair[0]).unwrap();
            let next = model.wedge(pair[1]).unwrap();
            assert_close(prev.end(), next.start());
        }
        let last = model.wedge(*order.last().unwrap()).unwrap();
        assert!(last.end() <= TAU + 1e-9);
    }

    #[test]
    fn randomize_walks_width_and_depth_within_bounds() {
        let mut model = RingModel::new();
        let mut rng = StdRng::seed_from_u64(99);
        let id = model.add_wedge(Wedge::new(0.5, 0.9, 0.33));

        model.randomize_with(&mut rng);

        let walked = model.wedge(id).unwrap();
        assert!(walked.width >= 0.3 && walked.width <= 0.7);
        assert!(walked.width >= 0.2 && walked.width <= 1.0);
        assert!(walked.depth >= 0.7 && walked.depth <= 1.0);
        assert_close(walked.hue, 0.33);
    }

    #[test]
    fn randomize_on_empty_model_emits_nothing() {
        let (mut model, notifications) = counting_model();

        model.randomize();

        assert_eq!(notifications.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn random_wedges_sample_the_documented_ranges() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let wedge = Wedge::random_with(&mut rng);
            assert!(wedge.width >= 0.5 && wedge.width <= 1.0);
            assert!(wedge.depth >= 0.2 && wedge.depth <= 1.0);
            assert!(wedge.hue >= 0.0 && wedge.hue <= 1.0);
        }
    }

    #[test]
    fn notification_carries_the_net_effect_of_a_batch() {
        let mut model = RingModel::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&seen);
        model.subscribe(move |snapshot| {
            observed.store(snapshot.len(), Ordering::SeqCst);
        });

        model.batch(|model| {
            let a = model.add_wedge(wedge(1.0));
            model.add_wedge(wedge(2.0));
            model.remove_wedge(a);
        });

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut model = RingModel::new();
        model.add_wedge(wedge(1.0));
        model.add_wedge(wedge(4.0));

        let json = model.snapshot().to_json().unwrap();
        let decoded: RingSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.order, model.order());
        for (id, original) in model.snapshot().iter_ordered() {
            let restored = decoded.wedge(id).unwrap();
            assert_close(restored.width, original.width);
            assert_close(restored.start(), original.start());
            assert_close(restored.end(), original.end());
        }
    }
}
