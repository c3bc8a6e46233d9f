//! Touch gesture interpretation for the node canvas.
//!
//! [`TouchController`] owns the [`InteractionSession`] for one continuous
//! touch sequence and turns raw contact lists into viewport, node and
//! marquee updates delivered through a [`GestureHost`].
//!
//! # Modes
//!
//! - Two contacts always pinch (`Zoom`), whatever the session was doing.
//! - One contact drags a seized node, pans the canvas, or grows the marquee,
//!   depending on how the sequence started.
//! - A held finger on empty canvas arms a long press; moving more than the
//!   jitter threshold before it fires degrades into a pan.
//! - A mouse skips the long press: empty canvas starts the marquee at once,
//!   Space + drag pans.
//!
//! # Invariants
//!
//! 1. The sample that establishes a pinch baseline never moves the view.
//! 2. The sample that drops from two fingers to one never moves the view.
//! 3. Zoom emitted by any path stays within `[MIN_ZOOM, MAX_ZOOM]`.
//! 4. A pending long-press timer is cancelled at most once.
//! 5. Every viewport handed to the host is absolute; deltas are accumulated
//!    here, per sample, through the session anchors.

use crate::model::{NodeId, Point, Rect};
use crate::settings::Settings;

use super::camera::{apply_sensitivity, Viewport};
use super::long_press::{TimerToken, DEFAULT_LONG_PRESS_MS, JITTER_THRESHOLD};
use super::touch::{InteractionSession, Mode};

/// A pinch baseline shorter than this cannot be divided by.
const MIN_BASELINE_DIST: f64 = 1e-3;
/// Contact id given to the mouse pointer.
const MOUSE_ID: i32 = -1;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Multiplier on the per-sample pinch rate (default: 1.0).
    pub zoom_sensitivity: f64,
    /// Screen distance that cancels a pending long press (default: 10).
    pub jitter_threshold: f64,
    /// Hold time before a long press turns into a marquee (default: 600ms).
    pub long_press_ms: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            zoom_sensitivity: 1.0,
            jitter_threshold: JITTER_THRESHOLD,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
        }
    }
}

impl From<&Settings> for GestureConfig {
    fn from(s: &Settings) -> Self {
        Self {
            zoom_sensitivity: s.effective_zoom_sensitivity(),
            long_press_ms: s.long_press_ms,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// One active touch point in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: i32,
    pub x: f64,
    pub y: f64,
}

impl Contact {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Everything the interpreter reads for one touch event.
#[derive(Debug, Clone, Copy)]
pub struct TouchFrame<'a> {
    pub contacts: &'a [Contact],
    /// Whether the platform lets us suppress its own pinch/scroll.
    pub cancelable: bool,
    pub viewport: Viewport,
    /// Container bounds in screen space, when known.
    pub container: Option<Rect>,
}

/// Keys held while a mouse button goes down or up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerModifiers {
    pub space: bool,
    /// Shift, Ctrl or Meta: add to the selection instead of replacing it.
    pub additive: bool,
}

/// Effects the interpreter applies to the surrounding surface.
pub trait GestureHost {
    fn prevent_native_gesture(&mut self);
    fn replace_viewport(&mut self, viewport: Viewport);
    /// World-space delta for the node being dragged.
    fn move_nodes(&mut self, anchor: &NodeId, dx: f64, dy: f64);
    /// New free corner of the marquee, container-local.
    fn update_selection(&mut self, corner: Point);
    fn clear_long_press_indicator(&mut self);
    fn clear_drag_target(&mut self);
    /// Must tolerate tokens that already fired or were cancelled.
    fn cancel_long_press(&mut self, token: TimerToken);

    fn arm_long_press(&mut self, delay_ms: u32) -> TimerToken;
    fn show_long_press_indicator(&mut self, at: Point);
    fn begin_drag(&mut self, node: &NodeId);
    fn clear_node_selection(&mut self);
    /// Anchor a fresh marquee at a container-local point.
    fn begin_selection(&mut self, anchor: Point, keep_selection: bool);
    fn commit_selection(&mut self, additive: bool);
    fn clear_selection_rect(&mut self);
    fn vibrate(&mut self) {}
}

// ---------------------------------------------------------------------------
// Touch-move handling
// ---------------------------------------------------------------------------

impl InteractionSession {
    /// Interpret one touch-move sample. Applies at most one viewport, node
    /// or marquee update; contact counts other than one or two do nothing.
    pub fn on_touch_move<H: GestureHost + ?Sized>(
        &mut self,
        frame: &TouchFrame<'_>,
        config: &GestureConfig,
        host: &mut H,
    ) {
        if frame.cancelable {
            host.prevent_native_gesture();
        }
        match frame.contacts {
            [a, b] => self.pinch(a.point(), b.point(), frame.viewport, config, host),
            [a] => self.single(a.point(), frame, config, host),
            _ => {}
        }
    }

    /// Record a pinch baseline and drop anything a pinch excludes.
    pub(crate) fn begin_zoom<H: GestureHost + ?Sized>(&mut self, dist: f64, center: Point, host: &mut H) {
        self.set_mode(Mode::Zoom { last_dist: dist, last_center: center });
        if let Some(token) = self.take_long_press() {
            host.cancel_long_press(token);
        }
        host.clear_long_press_indicator();
        host.clear_drag_target();
        host.clear_selection_rect();
    }

    fn pinch<H: GestureHost + ?Sized>(
        &mut self,
        a: Point,
        b: Point,
        viewport: Viewport,
        config: &GestureConfig,
        host: &mut H,
    ) {
        let dist = a.distance_to(b);
        let center = a.midpoint(b);
        let (last_dist, last_center) = match self.mode {
            Mode::Zoom { last_dist, last_center } if last_dist > MIN_BASELINE_DIST => {
                (last_dist, last_center)
            }
            _ => {
                self.begin_zoom(dist, center, host);
                return;
            }
        };

        let factor = apply_sensitivity(dist / last_dist, config.zoom_sensitivity);
        let next = viewport.pinch_step(last_center, center, factor);
        log::trace!("pinch factor={factor:.4} zoom {:.4} -> {:.4}", viewport.zoom, next.zoom);
        host.replace_viewport(next);
        self.mode = Mode::Zoom { last_dist: dist, last_center: center };
    }

    fn single<H: GestureHost + ?Sized>(
        &mut self,
        p: Point,
        frame: &TouchFrame<'_>,
        config: &GestureConfig,
        host: &mut H,
    ) {
        if let Some(lp) = self.long_press {
            if lp.exceeded_by(p, config.jitter_threshold) {
                self.long_press = None;
                host.cancel_long_press(lp.token);
                host.clear_long_press_indicator();
                if self.mode == Mode::Waiting {
                    self.set_mode(Mode::Pan { anchor: p });
                }
            }
        }

        // Lost a finger mid-pinch: re-anchor only, stale pinch state must not jump the view.
        if matches!(self.mode, Mode::Zoom { .. }) {
            self.set_mode(Mode::Pan { anchor: p });
            return;
        }

        let viewport = frame.viewport;
        match &mut self.mode {
            Mode::DragNode { node, last_pos } => {
                if viewport.zoom <= 0.0 {
                    return;
                }
                let dx = (p.x - last_pos.x) / viewport.zoom;
                let dy = (p.y - last_pos.y) / viewport.zoom;
                host.move_nodes(node, dx, dy);
                *last_pos = p;
            }
            Mode::Pan { anchor } => {
                host.replace_viewport(viewport.panned(p.x - anchor.x, p.y - anchor.y));
                *anchor = p;
            }
            Mode::Select => {
                if let Some(rect) = frame.container {
                    host.update_selection(rect.to_local(p));
                }
            }
            Mode::Waiting | Mode::Zoom { .. } => {}
        }
    }
}

// ---------------------------------------------------------------------------
// TouchController
// ---------------------------------------------------------------------------

/// Owns the session across touch events. Created once per canvas.
#[derive(Debug, Default)]
pub struct TouchController {
    pub config: GestureConfig,
    session: Option<InteractionSession>,
}

impl TouchController {
    pub fn new(config: GestureConfig) -> Self {
        Self { config, session: None }
    }

    /// `hit` is the node under the first contact, if any.
    pub fn on_touch_start<H: GestureHost + ?Sized>(
        &mut self,
        frame: &TouchFrame<'_>,
        hit: Option<NodeId>,
        host: &mut H,
    ) {
        log::trace!("touch start, contacts {:?}", frame.contacts.iter().map(|c| c.id).collect::<Vec<_>>());
        match frame.contacts {
            [] => {}
            [c] => {
                let p = c.point();
                if let Some(token) = self.session.take().and_then(|mut s| s.take_long_press()) {
                    host.cancel_long_press(token);
                }
                let session = match hit {
                    Some(node) => {
                        log::debug!("touch start on node {node}");
                        host.begin_drag(&node);
                        InteractionSession::dragging(node, p)
                    }
                    None => {
                        let token = host.arm_long_press(self.config.long_press_ms);
                        if let Some(rect) = frame.container {
                            host.show_long_press_indicator(rect.to_local(p));
                        }
                        host.clear_node_selection();
                        InteractionSession::waiting(p, token)
                    }
                };
                self.session = Some(session);
            }
            [a, b, ..] => {
                let (a, b) = (a.point(), b.point());
                let session = self.session.get_or_insert_with(|| InteractionSession::new(Mode::Waiting));
                session.begin_zoom(a.distance_to(b), a.midpoint(b), host);
            }
        }
    }

    pub fn on_touch_move<H: GestureHost + ?Sized>(&mut self, frame: &TouchFrame<'_>, host: &mut H) {
        match self.session.as_mut() {
            Some(session) => session.on_touch_move(frame, &self.config, host),
            None if frame.cancelable => host.prevent_native_gesture(),
            None => {}
        }
    }

    /// Timer callback. Stale tokens and sessions that already moved on are ignored.
    pub fn on_long_press_fired<H: GestureHost + ?Sized>(
        &mut self,
        token: TimerToken,
        container: Option<Rect>,
        host: &mut H,
    ) {
        let Some(session) = self.session.as_mut() else { return; };
        let Some(lp) = session.long_press.filter(|lp| lp.token == token) else { return; };
        session.long_press = None;
        if session.mode != Mode::Waiting {
            return;
        }
        session.set_mode(Mode::Select);
        host.clear_long_press_indicator();
        if let Some(rect) = container {
            host.begin_selection(rect.to_local(lp.start), false);
        }
        host.vibrate();
    }

    /// `remaining` is the number of contacts still down after the lift.
    pub fn on_touch_end<H: GestureHost + ?Sized>(&mut self, remaining: usize, host: &mut H) {
        let Some(session) = self.session.as_mut() else { return; };
        if let Some(token) = session.take_long_press() {
            host.cancel_long_press(token);
        }
        host.clear_long_press_indicator();
        if remaining > 0 {
            return;
        }
        if let Some(session) = self.session.take() {
            Self::finish(session, false, host);
        }
    }

    /// Primary button down at a screen point. `hit` is the node under it.
    pub fn on_mouse_down<H: GestureHost + ?Sized>(
        &mut self,
        at: Point,
        hit: Option<NodeId>,
        mods: PointerModifiers,
        container: Option<Rect>,
        host: &mut H,
    ) {
        self.reset(host);
        let session = if mods.space && !mods.additive {
            InteractionSession::new(Mode::Pan { anchor: at })
        } else if let Some(node) = hit {
            host.begin_drag(&node);
            InteractionSession::dragging(node, at)
        } else {
            if let Some(rect) = container {
                host.begin_selection(rect.to_local(at), mods.additive);
            }
            InteractionSession::new(Mode::Select)
        };
        log::debug!("mouse down, {}", session.mode.label());
        self.session = Some(session);
    }

    /// Mouse drags share the single-contact path but leave native behaviour alone.
    pub fn on_mouse_move<H: GestureHost + ?Sized>(
        &mut self,
        at: Point,
        viewport: Viewport,
        container: Option<Rect>,
        host: &mut H,
    ) {
        let Some(session) = self.session.as_mut() else { return; };
        let contact = [Contact { id: MOUSE_ID, x: at.x, y: at.y }];
        let frame = TouchFrame { contacts: &contact, cancelable: false, viewport, container };
        session.on_touch_move(&frame, &self.config, host);
    }

    pub fn on_mouse_up<H: GestureHost + ?Sized>(&mut self, mods: PointerModifiers, host: &mut H) {
        if let Some(session) = self.session.take() {
            Self::finish(session, mods.additive, host);
        }
    }

    fn finish<H: GestureHost + ?Sized>(session: InteractionSession, additive: bool, host: &mut H) {
        match session.mode {
            Mode::DragNode { .. } => host.clear_drag_target(),
            Mode::Select => host.commit_selection(additive),
            _ => {}
        }
        log::debug!("interaction ended in {}", session.mode.label());
    }

    /// Drop the session without committing anything (focus loss, unmount).
    pub fn reset<H: GestureHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(token) = self.session.take().and_then(|mut s| s.take_long_press()) {
            host.cancel_long_press(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;
    const CONTAINER: Rect = Rect::new(20.0, 40.0, 800.0, 600.0);

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Prevent,
        Viewport(Viewport),
        Move(NodeId, f64, f64),
        Selection(Point),
        ClearIndicator,
        ClearDrag,
        Cancel(TimerToken),
        Arm(u32),
        ShowIndicator(Point),
        BeginDrag(NodeId),
        ClearNodeSelection,
        BeginSelection(Point, bool),
        Commit(bool),
        ClearRect,
        Vibrate,
    }

    /// Records every call and merges viewports like the real surface does.
    struct RecordingHost {
        calls: Vec<Call>,
        viewport: Viewport,
        next_token: u64,
    }

    impl RecordingHost {
        fn new() -> Self {
            Self { calls: Vec::new(), viewport: Viewport::default(), next_token: 0 }
        }

        fn with_viewport(viewport: Viewport) -> Self {
            Self { viewport, ..Self::new() }
        }

        fn frame<'a>(&self, contacts: &'a [Contact]) -> TouchFrame<'a> {
            TouchFrame { contacts, cancelable: true, viewport: self.viewport, container: Some(CONTAINER) }
        }

        /// Calls that change the canvas (viewport, nodes, marquee).
        fn effects(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Viewport(_) | Call::Move(..) | Call::Selection(_)))
                .collect()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|&c| pred(c)).count()
        }

        fn clear(&mut self) {
            self.calls.clear();
        }
    }

    impl GestureHost for RecordingHost {
        fn prevent_native_gesture(&mut self) {
            self.calls.push(Call::Prevent);
        }
        fn replace_viewport(&mut self, viewport: Viewport) {
            self.viewport = viewport;
            self.calls.push(Call::Viewport(viewport));
        }
        fn move_nodes(&mut self, anchor: &NodeId, dx: f64, dy: f64) {
            self.calls.push(Call::Move(anchor.clone(), dx, dy));
        }
        fn update_selection(&mut self, corner: Point) {
            self.calls.push(Call::Selection(corner));
        }
        fn clear_long_press_indicator(&mut self) {
            self.calls.push(Call::ClearIndicator);
        }
        fn clear_drag_target(&mut self) {
            self.calls.push(Call::ClearDrag);
        }
        fn cancel_long_press(&mut self, token: TimerToken) {
            self.calls.push(Call::Cancel(token));
        }
        fn arm_long_press(&mut self, delay_ms: u32) -> TimerToken {
            self.next_token += 1;
            self.calls.push(Call::Arm(delay_ms));
            TimerToken(self.next_token)
        }
        fn show_long_press_indicator(&mut self, at: Point) {
            self.calls.push(Call::ShowIndicator(at));
        }
        fn begin_drag(&mut self, node: &NodeId) {
            self.calls.push(Call::BeginDrag(node.clone()));
        }
        fn clear_node_selection(&mut self) {
            self.calls.push(Call::ClearNodeSelection);
        }
        fn begin_selection(&mut self, anchor: Point, keep_selection: bool) {
            self.calls.push(Call::BeginSelection(anchor, keep_selection));
        }
        fn commit_selection(&mut self, additive: bool) {
            self.calls.push(Call::Commit(additive));
        }
        fn clear_selection_rect(&mut self) {
            self.calls.push(Call::ClearRect);
        }
        fn vibrate(&mut self) {
            self.calls.push(Call::Vibrate);
        }
    }

    fn c(id: i32, x: f64, y: f64) -> Contact {
        Contact { id, x, y }
    }

    fn one(x: f64, y: f64) -> [Contact; 1] {
        [c(0, x, y)]
    }

    fn two(x0: f64, y0: f64, x1: f64, y1: f64) -> [Contact; 2] {
        [c(0, x0, y0), c(1, x1, y1)]
    }

    fn step(session: &mut InteractionSession, host: &mut RecordingHost, contacts: &[Contact]) {
        let frame = host.frame(contacts);
        session.on_touch_move(&frame, &GestureConfig::default(), host);
    }

    fn assert_vp(actual: Viewport, expected: Viewport) {
        assert!(
            (actual.x - expected.x).abs() < EPS
                && (actual.y - expected.y).abs() < EPS
                && (actual.zoom - expected.zoom).abs() < EPS,
            "{actual:?} != {expected:?}"
        );
    }

    // --- Single contact ---

    #[test]
    fn waiting_without_timer_emits_nothing() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &one(100.0, 100.0));
        assert_eq!(host.calls, vec![Call::Prevent]);
        assert_eq!(s.mode, Mode::Waiting);
    }

    #[test]
    fn native_gesture_only_suppressed_when_cancelable() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::new();
        let contacts = one(1.0, 1.0);
        let frame = TouchFrame { cancelable: false, ..host.frame(&contacts) };
        s.on_touch_move(&frame, &GestureConfig::default(), &mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn zero_and_three_contacts_do_nothing() {
        let mut s = InteractionSession::new(Mode::Pan { anchor: Point::new(0.0, 0.0) });
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &[]);
        step(&mut s, &mut host, &[c(0, 5.0, 5.0), c(1, 50.0, 5.0), c(2, 90.0, 90.0)]);
        assert!(host.effects().is_empty());
        assert_eq!(s.mode, Mode::Pan { anchor: Point::new(0.0, 0.0) });
    }

    #[test]
    fn pan_accumulates_per_sample() {
        let start = Viewport { x: 7.0, y: -3.0, zoom: 2.0 };
        let mut s = InteractionSession::new(Mode::Pan { anchor: Point::new(100.0, 100.0) });
        let mut host = RecordingHost::with_viewport(start);
        let n = 12;
        for i in 1..=n {
            let f = i as f64;
            step(&mut s, &mut host, &one(100.0 + 4.0 * f, 100.0 - 2.5 * f));
        }
        assert_eq!(host.effects().len(), n);
        assert_vp(host.viewport, Viewport { x: 7.0 + 4.0 * n as f64, y: -3.0 - 2.5 * n as f64, zoom: 2.0 });
        assert_eq!(s.mode, Mode::Pan { anchor: Point::new(148.0, 70.0) });
    }

    #[test]
    fn drag_delta_is_divided_by_zoom() {
        let id = NodeId::new("n1");
        let moved = |zoom: f64| {
            let mut s = InteractionSession::dragging(id.clone(), Point::new(50.0, 50.0));
            let mut host = RecordingHost::with_viewport(Viewport { x: 0.0, y: 0.0, zoom });
            step(&mut s, &mut host, &one(70.0, 40.0));
            assert_eq!(s.mode, Mode::DragNode { node: id.clone(), last_pos: Point::new(70.0, 40.0) });
            let effects = host.effects();
            match effects.as_slice() {
                [Call::Move(n, dx, dy)] => {
                    assert_eq!(n, &id);
                    (*dx, *dy)
                }
                other => panic!("unexpected effects {other:?}"),
            }
        };
        assert_eq!(moved(1.0), (20.0, -10.0));
        assert_eq!(moved(2.0), (10.0, -5.0));
    }

    #[test]
    fn select_updates_free_corner_in_container_space() {
        let mut s = InteractionSession::new(Mode::Select);
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &one(120.0, 140.0));
        assert_eq!(host.effects(), vec![&Call::Selection(Point::new(100.0, 100.0))]);
    }

    #[test]
    fn select_without_container_is_skipped() {
        let mut s = InteractionSession::new(Mode::Select);
        let mut host = RecordingHost::new();
        let contacts = one(120.0, 140.0);
        let frame = TouchFrame { container: None, ..host.frame(&contacts) };
        s.on_touch_move(&frame, &GestureConfig::default(), &mut host);
        assert!(host.effects().is_empty());
    }

    // --- Long press ---

    #[test]
    fn jitter_inside_threshold_keeps_long_press() {
        let mut s = InteractionSession::waiting(Point::new(100.0, 100.0), TimerToken(3));
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &one(106.0, 108.0));
        assert_eq!(host.calls, vec![Call::Prevent]);
        assert!(s.long_press.is_some());
        assert_eq!(s.mode, Mode::Waiting);
    }

    #[test]
    fn moving_past_threshold_cancels_once_and_pans() {
        let mut s = InteractionSession::waiting(Point::new(100.0, 100.0), TimerToken(3));
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &one(111.0, 100.0));
        step(&mut s, &mut host, &one(131.0, 100.0));
        step(&mut s, &mut host, &one(151.0, 110.0));
        assert_eq!(host.count(|c| matches!(c, Call::Cancel(_))), 1);
        assert!(host.calls.contains(&Call::Cancel(TimerToken(3))));
        assert_eq!(s.mode, Mode::Pan { anchor: Point::new(151.0, 110.0) });
        // Promotion anchors at the crossing point, so only later samples move.
        assert_vp(host.viewport, Viewport { x: 40.0, y: 10.0, zoom: 1.0 });
    }

    #[test]
    fn long_press_cancel_does_not_promote_drag() {
        let mut s = InteractionSession::dragging(NodeId::new("a"), Point::new(0.0, 0.0));
        s.long_press = Some(crate::state::long_press::PendingLongPress {
            token: TimerToken(9),
            start: Point::new(0.0, 0.0),
        });
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &one(30.0, 0.0));
        assert!(matches!(s.mode, Mode::DragNode { .. }));
        assert!(host.calls.contains(&Call::Cancel(TimerToken(9))));
    }

    // --- Two contacts ---

    #[test]
    fn first_pinch_sample_only_sets_baseline() {
        let mut s = InteractionSession::waiting(Point::new(0.0, 0.0), TimerToken(1));
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &two(0.0, 0.0, 100.0, 0.0));
        assert!(host.effects().is_empty());
        assert_eq!(s.mode, Mode::Zoom { last_dist: 100.0, last_center: Point::new(50.0, 0.0) });
        assert_eq!(host.count(|c| *c == Call::Cancel(TimerToken(1))), 1);
        assert!(host.calls.contains(&Call::ClearIndicator));
        assert!(host.calls.contains(&Call::ClearDrag));
    }

    #[test]
    fn pinch_started_mid_marquee_drops_the_marquee() {
        let mut s = InteractionSession::new(Mode::Select);
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &two(0.0, 0.0, 80.0, 0.0));
        assert_eq!(host.count(|c| *c == Call::ClearRect), 1);
        assert!(matches!(s.mode, Mode::Zoom { .. }));
    }

    #[test]
    fn spreading_fingers_doubles_zoom() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &two(0.0, 0.0, 100.0, 0.0));
        step(&mut s, &mut host, &two(0.0, 0.0, 200.0, 0.0));
        assert_eq!(host.effects(), vec![&Call::Viewport(Viewport { x: 0.0, y: 0.0, zoom: 2.0 })]);
        assert_eq!(s.mode, Mode::Zoom { last_dist: 200.0, last_center: Point::new(100.0, 0.0) });
    }

    #[test]
    fn pinch_clamps_at_max_zoom() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::with_viewport(Viewport { x: 0.0, y: 0.0, zoom: 8.0 });
        step(&mut s, &mut host, &two(0.0, 0.0, 10.0, 0.0));
        step(&mut s, &mut host, &two(0.0, 0.0, 1000.0, 0.0));
        assert_eq!(host.viewport.zoom, 10.0);
    }

    #[test]
    fn pinch_out_and_back_restores_viewport() {
        let start = Viewport { x: 30.0, y: -20.0, zoom: 1.0 };
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::with_viewport(start);
        step(&mut s, &mut host, &two(100.0, 100.0, 200.0, 100.0));
        step(&mut s, &mut host, &two(50.0, 100.0, 250.0, 100.0));
        assert!((host.viewport.zoom - 2.0).abs() < EPS);
        step(&mut s, &mut host, &two(100.0, 100.0, 200.0, 100.0));
        assert_vp(host.viewport, start);
    }

    #[test]
    fn pinch_drift_pans_by_center_movement() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &two(0.0, 0.0, 100.0, 0.0));
        step(&mut s, &mut host, &two(15.0, 25.0, 115.0, 25.0));
        assert_vp(host.viewport, Viewport { x: 15.0, y: 25.0, zoom: 1.0 });
    }

    #[test]
    fn sensitivity_scales_pinch_rate() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::new();
        let config = GestureConfig { zoom_sensitivity: 0.5, ..GestureConfig::default() };
        for contacts in [two(0.0, 0.0, 100.0, 0.0), two(0.0, 0.0, 200.0, 0.0)] {
            let frame = host.frame(&contacts);
            s.on_touch_move(&frame, &config, &mut host);
        }
        assert!((host.viewport.zoom - 1.5).abs() < EPS);
    }

    #[test]
    fn zero_baseline_is_reestablished_not_divided() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &two(50.0, 50.0, 50.0, 50.0));
        step(&mut s, &mut host, &two(0.0, 50.0, 100.0, 50.0));
        assert!(host.effects().is_empty());
        assert_eq!(s.mode, Mode::Zoom { last_dist: 100.0, last_center: Point::new(50.0, 50.0) });
    }

    #[test]
    fn two_fingers_override_drag_and_select() {
        for mode in [Mode::DragNode { node: NodeId::new("x"), last_pos: Point::new(0.0, 0.0) }, Mode::Select] {
            let mut s = InteractionSession::new(mode);
            let mut host = RecordingHost::new();
            step(&mut s, &mut host, &two(0.0, 0.0, 40.0, 30.0));
            assert!(matches!(s.mode, Mode::Zoom { .. }));
            assert!(host.effects().is_empty());
        }
    }

    #[test]
    fn dropping_a_finger_demotes_to_pan_without_moving() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &two(0.0, 0.0, 100.0, 0.0));
        step(&mut s, &mut host, &two(0.0, 0.0, 150.0, 0.0));
        let after_pinch = host.viewport;
        host.clear();

        step(&mut s, &mut host, &one(300.0, 300.0));
        assert!(host.effects().is_empty());
        assert_eq!(s.mode, Mode::Pan { anchor: Point::new(300.0, 300.0) });

        step(&mut s, &mut host, &one(310.0, 290.0));
        assert_vp(host.viewport, after_pinch.panned(10.0, -10.0));
    }

    #[test]
    fn reentering_pinch_sets_a_fresh_baseline() {
        let mut s = InteractionSession::new(Mode::Waiting);
        let mut host = RecordingHost::new();
        step(&mut s, &mut host, &two(0.0, 0.0, 100.0, 0.0));
        step(&mut s, &mut host, &one(0.0, 0.0));
        host.clear();
        step(&mut s, &mut host, &two(0.0, 0.0, 400.0, 0.0));
        assert!(host.effects().is_empty());
        assert_eq!(s.mode, Mode::Zoom { last_dist: 400.0, last_center: Point::new(200.0, 0.0) });
    }

    proptest! {
        #[test]
        fn any_pinch_sequence_stays_in_zoom_range(
            start in 0.1f64..10.0,
            spreads in prop::collection::vec(0.0f64..5000.0, 2..60),
        ) {
            let mut s = InteractionSession::new(Mode::Waiting);
            let mut host = RecordingHost::with_viewport(Viewport { x: 0.0, y: 0.0, zoom: start });
            for d in spreads {
                step(&mut s, &mut host, &two(500.0 - d / 2.0, 300.0, 500.0 + d / 2.0, 300.0));
                prop_assert!(host.viewport.zoom >= 0.1 && host.viewport.zoom <= 10.0);
            }
        }
    }

    // --- Controller lifecycle ---

    #[test]
    fn touch_on_node_drags_then_releases() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        let id = NodeId::new("img");
        let down = one(100.0, 100.0);
        ctl.on_touch_start(&host.frame(&down), Some(id.clone()), &mut host);
        assert_eq!(host.calls, vec![Call::BeginDrag(id.clone())]);

        let mv = one(110.0, 120.0);
        let frame = host.frame(&mv);
        ctl.on_touch_move(&frame, &mut host);
        assert!(host.calls.contains(&Call::Move(id.clone(), 10.0, 20.0)));

        ctl.on_touch_end(0, &mut host);
        assert!(host.calls.contains(&Call::ClearDrag));
        assert!(ctl.session.as_ref().is_none());
    }

    #[test]
    fn long_press_on_canvas_opens_marquee_and_commits() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        let down = one(120.0, 140.0);
        ctl.on_touch_start(&host.frame(&down), None, &mut host);
        assert_eq!(
            host.calls,
            vec![Call::Arm(600), Call::ShowIndicator(Point::new(100.0, 100.0)), Call::ClearNodeSelection]
        );

        ctl.on_long_press_fired(TimerToken(1), Some(CONTAINER), &mut host);
        assert_eq!(ctl.session.as_ref().map(|s| &s.mode), Some(&Mode::Select));
        assert!(host.calls.contains(&Call::BeginSelection(Point::new(100.0, 100.0), false)));
        assert!(host.calls.contains(&Call::Vibrate));

        let mv = one(220.0, 190.0);
        let frame = host.frame(&mv);
        ctl.on_touch_move(&frame, &mut host);
        assert!(host.calls.contains(&Call::Selection(Point::new(200.0, 150.0))));

        host.clear();
        ctl.on_touch_end(0, &mut host);
        assert_eq!(host.calls, vec![Call::ClearIndicator, Call::Commit(false)]);
        assert!(ctl.session.as_ref().is_none());
    }

    #[test]
    fn stale_or_late_long_press_is_ignored() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        let down = one(0.0, 0.0);
        ctl.on_touch_start(&host.frame(&down), None, &mut host);

        ctl.on_long_press_fired(TimerToken(99), Some(CONTAINER), &mut host);
        assert_eq!(ctl.session.as_ref().map(|s| &s.mode), Some(&Mode::Waiting));

        let mv = one(50.0, 0.0);
        let frame = host.frame(&mv);
        ctl.on_touch_move(&frame, &mut host);
        host.clear();
        ctl.on_long_press_fired(TimerToken(1), Some(CONTAINER), &mut host);
        assert!(host.calls.is_empty());
        assert!(matches!(ctl.session.as_ref().map(|s| &s.mode), Some(Mode::Pan { .. })));
    }

    #[test]
    fn second_finger_landing_cancels_long_press_and_marquee() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        let down = one(10.0, 10.0);
        ctl.on_touch_start(&host.frame(&down), None, &mut host);
        host.clear();

        let both = two(10.0, 10.0, 110.0, 10.0);
        ctl.on_touch_start(&host.frame(&both), None, &mut host);
        assert_eq!(
            host.calls,
            vec![Call::Cancel(TimerToken(1)), Call::ClearIndicator, Call::ClearDrag, Call::ClearRect]
        );
        assert_eq!(
            ctl.session.as_ref().map(|s| &s.mode),
            Some(&Mode::Zoom { last_dist: 100.0, last_center: Point::new(60.0, 10.0) })
        );

        // Lifting one finger keeps the session; the next move demotes to pan.
        ctl.on_touch_end(1, &mut host);
        assert!(ctl.session.as_ref().is_some());
        let rest = one(10.0, 10.0);
        let frame = host.frame(&rest);
        ctl.on_touch_move(&frame, &mut host);
        assert!(matches!(ctl.session.as_ref().map(|s| &s.mode), Some(Mode::Pan { .. })));
    }

    #[test]
    fn lifting_cancels_pending_timer_once() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        let down = one(10.0, 10.0);
        ctl.on_touch_start(&host.frame(&down), None, &mut host);
        ctl.on_touch_end(0, &mut host);
        ctl.on_touch_end(0, &mut host);
        assert_eq!(host.count(|c| matches!(c, Call::Cancel(_))), 1);
        assert!(!host.calls.iter().any(|c| matches!(c, Call::Commit(_))));
    }

    #[test]
    fn move_without_session_only_suppresses_native() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        let mv = one(1.0, 1.0);
        let frame = host.frame(&mv);
        ctl.on_touch_move(&frame, &mut host);
        assert_eq!(host.calls, vec![Call::Prevent]);
    }

    // --- Mouse ---

    fn mouse(space: bool, additive: bool) -> PointerModifiers {
        PointerModifiers { space, additive }
    }

    #[test]
    fn mouse_down_on_node_drags_without_timer() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        let id = NodeId::new("n");
        ctl.on_mouse_down(Point::new(50.0, 60.0), Some(id.clone()), mouse(false, false), Some(CONTAINER), &mut host);
        assert_eq!(host.calls, vec![Call::BeginDrag(id.clone())]);

        ctl.on_mouse_move(Point::new(54.0, 58.0), host.viewport, Some(CONTAINER), &mut host);
        assert_eq!(host.effects(), vec![&Call::Move(id, 4.0, -2.0)]);
        assert!(!host.calls.contains(&Call::Prevent));

        ctl.on_mouse_up(mouse(false, false), &mut host);
        assert_eq!(host.calls.last(), Some(&Call::ClearDrag));
        assert!(ctl.session.is_none());
    }

    #[test]
    fn mouse_down_on_canvas_starts_marquee_immediately() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        ctl.on_mouse_down(Point::new(120.0, 140.0), None, mouse(false, false), Some(CONTAINER), &mut host);
        assert_eq!(host.calls, vec![Call::BeginSelection(Point::new(100.0, 100.0), false)]);
        assert_eq!(ctl.session.as_ref().map(|s| &s.mode), Some(&Mode::Select));
        assert!(ctl.session.as_ref().is_some_and(|s| s.long_press.is_none()));

        ctl.on_mouse_move(Point::new(220.0, 240.0), host.viewport, Some(CONTAINER), &mut host);
        assert_eq!(host.effects(), vec![&Call::Selection(Point::new(200.0, 200.0))]);

        ctl.on_mouse_up(mouse(false, false), &mut host);
        assert_eq!(host.calls.last(), Some(&Call::Commit(false)));
    }

    #[test]
    fn modifier_keeps_existing_selection() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        ctl.on_mouse_down(Point::new(120.0, 140.0), None, mouse(false, true), Some(CONTAINER), &mut host);
        assert_eq!(host.calls, vec![Call::BeginSelection(Point::new(100.0, 100.0), true)]);
        ctl.on_mouse_up(mouse(false, true), &mut host);
        assert_eq!(host.calls.last(), Some(&Call::Commit(true)));
    }

    #[test]
    fn space_drag_pans_even_over_a_node() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        ctl.on_mouse_down(Point::new(10.0, 10.0), Some(NodeId::new("n")), mouse(true, false), Some(CONTAINER), &mut host);
        assert!(host.calls.is_empty());
        ctl.on_mouse_move(Point::new(40.0, 25.0), host.viewport, Some(CONTAINER), &mut host);
        assert_vp(host.viewport, Viewport { x: 30.0, y: 15.0, zoom: 1.0 });
        ctl.on_mouse_up(mouse(true, false), &mut host);
        assert!(ctl.session.is_none());
    }

    #[test]
    fn shift_space_is_a_selection_not_a_pan() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        ctl.on_mouse_down(Point::new(20.0, 40.0), None, mouse(true, true), Some(CONTAINER), &mut host);
        assert_eq!(ctl.session.as_ref().map(|s| &s.mode), Some(&Mode::Select));
    }

    #[test]
    fn hover_without_button_does_nothing() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        ctl.on_mouse_move(Point::new(5.0, 5.0), host.viewport, Some(CONTAINER), &mut host);
        ctl.on_mouse_up(mouse(false, false), &mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn mouse_down_cancels_a_pending_long_press() {
        let mut ctl = TouchController::default();
        let mut host = RecordingHost::new();
        let down = one(0.0, 0.0);
        ctl.on_touch_start(&host.frame(&down), None, &mut host);
        ctl.on_mouse_down(Point::new(0.0, 0.0), None, mouse(false, false), Some(CONTAINER), &mut host);
        assert_eq!(host.count(|c| *c == Call::Cancel(TimerToken(1))), 1);
    }
}
