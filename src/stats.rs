//! Per-tick diagnostic counters, read and reset by the embedding layer.

/// Counters accumulated over one tick.
#[derive(Clone, Debug, Default)]
pub struct FrameStats {
    /// Tiles that reached the draw routine and were painted.
    pub tiles_drawn: usize,
    /// Chunks whose tight bound intersected a draw region.
    pub chunks_visible: usize,
    /// Chunks instantiated this tick.
    pub chunks_loaded: usize,
    /// Chunks evicted this tick.
    pub chunks_removed: usize,
    /// Wall time of the last repaint in milliseconds.
    pub draw_ms: f64,
}

impl FrameStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
