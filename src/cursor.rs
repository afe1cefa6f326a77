use std::sync::Arc;
use winit::window::{CursorIcon, Window};

/// Receives pointer-over transitions. The window implementation swaps the
/// OS cursor; tests substitute a recorder.
pub trait CursorSink {
    fn pointer_enter(&mut self);
    fn pointer_leave(&mut self);
}

/// Drives the real window cursor
pub struct WindowCursor {
    window: Arc<Window>,
}

impl WindowCursor {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl CursorSink for WindowCursor {
    fn pointer_enter(&mut self) {
        self.window.set_cursor(CursorIcon::Pointer);
    }

    fn pointer_leave(&mut self) {
        self.window.set_cursor(CursorIcon::Default);
    }
}

/// Tracks which instance the pointer is over and emits enter/leave edges.
/// Moving directly between two shapes emits a leave then an enter, so the
/// sink sees every transition.
#[derive(Debug, Default)]
pub struct HoverTracker {
    hovered: Option<usize>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Feed the latest hit test result
    pub fn update(&mut self, hit: Option<usize>, sink: &mut dyn CursorSink) {
        if self.hovered == hit {
            return;
        }
        if self.hovered.is_some() {
            sink.pointer_leave();
        }
        if hit.is_some() {
            sink.pointer_enter();
        }
        self.hovered = hit;
    }

    /// Pointer left the surface entirely
    pub fn reset(&mut self, sink: &mut dyn CursorSink) {
        self.update(None, sink);
    }
}
