//! Core data models for the node canvas.
//! Geometry primitives, graph nodes, the marquee rectangle and the reducer
//! that owns everything the gesture layer mutates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use yew::Reducible;

use crate::state::camera::Viewport;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Axis-aligned rectangle. Used both for the container's screen-space bounds
/// (`left/top` from `getBoundingClientRect`) and for node bounds in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Strict overlap; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }

    /// Converts an absolute screen point into coordinates local to this rect.
    pub fn to_local(&self, p: Point) -> Point {
        Point::new(p.x - self.left, p.y - self.top)
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub title: String,
    /// World position of the top-left corner.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GraphNode {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Marquee rectangle in container-local screen coordinates.
/// `start_*` is the anchor corner; gestures only ever move `current_*`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub start_x: f64,
    pub start_y: f64,
    pub current_x: f64,
    pub current_y: f64,
}

impl SelectionRect {
    pub fn anchored_at(p: Point) -> Self {
        Self { start_x: p.x, start_y: p.y, current_x: p.x, current_y: p.y }
    }

    pub fn normalized(&self) -> Rect {
        let left = self.start_x.min(self.current_x);
        let top = self.start_y.min(self.current_y);
        Rect::new(
            left,
            top,
            self.start_x.max(self.current_x) - left,
            self.start_y.max(self.current_y) - top,
        )
    }

    /// Same rectangle expressed in world space under `viewport`.
    pub fn to_world(&self, viewport: &Viewport) -> Rect {
        let r = self.normalized();
        let a = viewport.screen_to_world(Point::new(r.left, r.top));
        let b = viewport.screen_to_world(Point::new(r.right(), r.bottom()));
        Rect::new(a.x, a.y, b.x - a.x, b.y - a.y)
    }
}

/// Topmost node under a world-space point (nodes later in the list draw on top).
pub fn hit_test(nodes: &[GraphNode], world: Point) -> Option<&GraphNode> {
    nodes.iter().rev().find(|n| n.bounds().contains(world))
}

pub fn nodes_in_rect(nodes: &[GraphNode], world: &Rect) -> BTreeSet<NodeId> {
    nodes
        .iter()
        .filter(|n| n.bounds().intersects(world))
        .map(|n| n.id.clone())
        .collect()
}

/// World bounds enclosing every node, `None` for an empty graph.
pub fn graph_bounds(nodes: &[GraphNode]) -> Option<Rect> {
    let first = nodes.first()?;
    let mut b = first.bounds();
    for n in &nodes[1..] {
        let r = n.bounds();
        let left = b.left.min(r.left);
        let top = b.top.min(r.top);
        let right = b.right().max(r.right());
        let bottom = b.bottom().max(r.bottom());
        b = Rect::new(left, top, right - left, bottom - top);
    }
    Some(b)
}

#[derive(Clone, Debug, PartialEq)]
pub struct CanvasState {
    pub nodes: Vec<GraphNode>,
    pub viewport: Viewport,
    /// Multi-selection; the primary selection is tracked separately.
    pub selected: BTreeSet<NodeId>,
    pub primary: Option<NodeId>,
    pub selection_rect: Option<SelectionRect>,
    /// Node currently held by a finger.
    pub dragging: Option<NodeId>,
    /// Container-local point where a long press is pending.
    pub long_press_indicator: Option<Point>,
    /// Bumped on every reduction so effects can key on it.
    pub version: u64,
}

impl CanvasState {
    pub fn new(nodes: Vec<GraphNode>) -> Self {
        Self {
            nodes,
            viewport: Viewport::default(),
            selected: BTreeSet::new(),
            primary: None,
            selection_rect: None,
            dragging: None,
            long_press_indicator: None,
            version: 0,
        }
    }

    /// Small starter graph so the surface has something to touch.
    pub fn demo() -> Self {
        let seeds = [
            ("prompt", "Prompt", 80.0, 120.0),
            ("image", "Image Generator", 460.0, 60.0),
            ("upscale", "Upscale", 840.0, 160.0),
            ("preview", "Preview", 460.0, 420.0),
        ];
        Self::new(
            seeds
                .iter()
                .map(|(id, title, x, y)| GraphNode {
                    id: NodeId::new(*id),
                    title: (*title).to_string(),
                    x: *x,
                    y: *y,
                    width: 280.0,
                    height: 160.0,
                })
                .collect(),
        )
    }
}

// ---------------- Reducer & Actions -----------------
#[derive(Clone, Debug)]
pub enum CanvasAction {
    SetViewport(Viewport),
    /// World-space delta; moves the whole selection when `anchor` belongs to it.
    MoveNodes { anchor: NodeId, dx: f64, dy: f64 },
    BeginDrag(NodeId),
    ClearDrag,
    SelectNode(Option<NodeId>),
    /// `keep_selection` leaves the current selection in place until commit.
    BeginSelection { anchor: Point, keep_selection: bool },
    UpdateSelection { corner: Point },
    /// Resolve the marquee against the nodes under `viewport`. `additive`
    /// unions the hits with the existing selection.
    CommitSelection { viewport: Viewport, additive: bool },
    ClearSelectionRect,
    ShowLongPress(Point),
    ClearLongPress,
}

impl Reducible for CanvasState {
    type Action = CanvasAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        use CanvasAction::*;
        let mut new = (*self).clone();
        match action {
            SetViewport(vp) => { new.viewport = vp; }
            MoveNodes { anchor, dx, dy } => {
                let group = new.selected.contains(&anchor);
                for n in new.nodes.iter_mut() {
                    if n.id == anchor || (group && new.selected.contains(&n.id)) {
                        n.x += dx;
                        n.y += dy;
                    }
                }
            }
            BeginDrag(id) => {
                // A node inside a multi-selection drags the whole group.
                if new.selected.len() <= 1 && !new.selected.contains(&id) {
                    new.selected = BTreeSet::from([id.clone()]);
                    new.primary = Some(id.clone());
                }
                new.dragging = Some(id);
            }
            ClearDrag => { new.dragging = None; }
            SelectNode(id) => {
                new.selected = id.iter().cloned().collect();
                new.primary = id;
            }
            BeginSelection { anchor, keep_selection } => {
                new.selection_rect = Some(SelectionRect::anchored_at(anchor));
                if !keep_selection {
                    new.selected.clear();
                    new.primary = None;
                }
            }
            UpdateSelection { corner } => {
                if let Some(rect) = new.selection_rect.as_mut() {
                    rect.current_x = corner.x;
                    rect.current_y = corner.y;
                }
            }
            CommitSelection { viewport, additive } => {
                let Some(rect) = new.selection_rect.take() else { return self; };
                let hits = nodes_in_rect(&new.nodes, &rect.to_world(&viewport));
                let hit_count = hits.len();
                if additive {
                    new.selected.extend(hits);
                } else {
                    new.selected = hits;
                }
                new.primary = if new.selected.len() == 1 { new.selected.iter().next().cloned() } else { None };
                log::debug!("marquee committed: {hit_count} hit(s), {} selected", new.selected.len());
            }
            ClearSelectionRect => { new.selection_rect = None; }
            ShowLongPress(p) => { new.long_press_indicator = Some(p); }
            ClearLongPress => {
                if new.long_press_indicator.is_none() { return self; }
                new.long_press_indicator = None;
            }
        }
        new.version = new.version.wrapping_add(1);
        Rc::new(new)
    }
}
