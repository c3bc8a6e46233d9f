// Touch interaction session: lives from first contact to last lift.
use crate::model::{NodeId, Point};

use super::long_press::{PendingLongPress, TimerToken};

/// What the current touch sequence is doing. Each mode carries only the
/// anchors it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Finger down on empty canvas; long press still undecided.
    Waiting,
    /// Two-finger pinch with the previous sample's geometry.
    Zoom { last_dist: f64, last_center: Point },
    /// Single-finger canvas pan, anchored at the previous sample.
    Pan { anchor: Point },
    /// A node seized at touch start, with the previous screen sample.
    DragNode { node: NodeId, last_pos: Point },
    /// Marquee selection; the rectangle itself lives in the canvas state.
    Select,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Waiting => "waiting",
            Mode::Zoom { .. } => "zoom",
            Mode::Pan { .. } => "pan",
            Mode::DragNode { .. } => "drag",
            Mode::Select => "select",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSession {
    pub mode: Mode,
    pub long_press: Option<PendingLongPress>,
}

impl InteractionSession {
    pub fn new(mode: Mode) -> Self {
        Self { mode, long_press: None }
    }

    pub fn waiting(start: Point, token: TimerToken) -> Self {
        Self { mode: Mode::Waiting, long_press: Some(PendingLongPress { token, start }) }
    }

    pub fn dragging(node: NodeId, at: Point) -> Self {
        Self::new(Mode::DragNode { node, last_pos: at })
    }

    /// Hands out the pending timer exactly once.
    pub fn take_long_press(&mut self) -> Option<TimerToken> {
        self.long_press.take().map(|lp| lp.token)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if std::mem::discriminant(&self.mode) != std::mem::discriminant(&mode) {
            log::debug!("touch mode {} -> {}", self.mode.label(), mode.label());
        }
        self.mode = mode;
    }
}
