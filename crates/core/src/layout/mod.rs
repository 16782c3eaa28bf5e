use std::f64::consts::TAU;

/// Angular bounds of one wedge after packing, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

/// Packs wedge widths into contiguous angular spans around the circle.
///
/// Wedges are laid out in input order starting at angle zero. They are
/// never stretched beyond their natural width: when the widths sum to less
/// than a full turn the ring keeps a trailing gap, and when they exceed one
/// the whole ring is compressed proportionally so the total extent stays
/// within `2π`.
pub fn pack_spans(widths: &[f64]) -> Vec<Span> {
    let total: f64 = widths.iter().sum();
    let scale = TAU / total.max(TAU);

    let mut spans = Vec::with_capacity(widths.len());
    let mut location = 0.0;
    for width in widths {
        let start = location * scale;
        location += width;
        spans.push(Span {
            start,
            end: location * scale,
        });
    }
    spans
}
