use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::chart::RingHandle;
use crate::model::{RingSnapshot, Subscriber};
use crate::Result;

/// Draw command for one wedge arc.
///
/// Carries exactly the fields the drawing contract needs; the wedge's
/// `width` is layout input and never reaches the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcCommand {
    pub start: f64,
    pub end: f64,
    pub depth: f64,
    pub hue: f64,
}

/// Converts a snapshot into draw commands, one per wedge in display order.
pub fn build_frame(snapshot: &RingSnapshot) -> Vec<ArcCommand> {
    snapshot
        .iter_ordered()
        .map(|(_, wedge)| ArcCommand {
            start: wedge.start(),
            end: wedge.end(),
            depth: wedge.depth,
            hue: wedge.hue,
        })
        .collect()
}

/// Rendering collaborator.
///
/// Subscribes to the model's change notification and rebuilds its draw
/// list on every committed update. The latest frame and a frame counter
/// stand in for an actual drawing backend.
#[derive(Debug, Default)]
pub struct RingRenderer {
    frame: Arc<Mutex<Frame>>,
}

#[derive(Debug, Default)]
struct Frame {
    commands: Vec<ArcCommand>,
    frames_built: u64,
}

impl RingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the callback to register on the model's notification list.
    pub fn subscriber(&self) -> Subscriber {
        let frame = Arc::clone(&self.frame);
        Box::new(move |snapshot: &RingSnapshot| {
            let Ok(mut frame) = frame.lock() else { return };
            frame.commands = build_frame(snapshot);
            frame.frames_built += 1;
        })
    }

    /// Subscribes this renderer to the chart behind `handle`.
    pub fn attach(&self, handle: &RingHandle) -> Result<()> {
        handle.subscribe(self.subscriber())
    }

    /// The draw list produced by the most recent notification.
    pub fn latest_frame(&self) -> Result<Vec<ArcCommand>> {
        Ok(self.lock()?.commands.clone())
    }

    /// Number of notifications rendered so far.
    pub fn frames_built(&self) -> Result<u64> {
        Ok(self.lock()?.frames_built)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Frame>> {
        self.frame
            .lock()
            .map_err(|_| crate::RingVizError::msg("render frame lock has been poisoned"))
    }
}
