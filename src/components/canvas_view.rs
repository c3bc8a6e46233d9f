use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use gloo::timers::callback::Timeout;
use web_sys::{HtmlElement, KeyboardEvent, MouseEvent, TouchEvent, TouchList, WheelEvent};
use yew::prelude::*;

use super::canvas_controls::CanvasControls;
use super::status_bar::StatusBar;
use crate::model::{graph_bounds, hit_test, CanvasAction, CanvasState, GraphNode, NodeId, Point, Rect};
use crate::settings::Settings;
use crate::state::camera::FIT_PADDING;
use crate::state::{
    wheel_viewport, BrowserTimers, Contact, GestureConfig, GestureHost, PointerModifiers, TimerToken,
    TouchController, TouchFrame, Viewport, WheelInput,
};

const HAPTIC_MS: u32 = 50;
const GRID_PX: f64 = 24.0;

#[derive(Properties, PartialEq, Clone)]
pub struct CanvasViewProps {
    pub canvas_state: UseReducerHandle<CanvasState>,
    pub settings: Settings,
}

/// Handles every DOM listener closes over.
#[derive(Clone)]
struct Surface {
    state: Rc<RefCell<UseReducerHandle<CanvasState>>>,
    /// Written synchronously on every change; the reducer copy lags a render.
    viewport: Rc<RefCell<Viewport>>,
    controller: Rc<RefCell<TouchController>>,
    timers: Rc<RefCell<BrowserTimers>>,
    space_held: Rc<Cell<bool>>,
    container: HtmlElement,
}

fn contacts(list: &TouchList) -> Vec<Contact> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|t| Contact { id: t.identifier(), x: t.client_x() as f64, y: t.client_y() as f64 })
        .collect()
}

/// Events that begin on an overlay (`data-ui`) belong to the overlay.
fn on_overlay(e: &web_sys::Event) -> bool {
    e.target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .and_then(|el| el.closest("[data-ui]").ok().flatten())
        .is_some()
}

impl Surface {
    fn dispatch(&self, action: CanvasAction) {
        let handle = self.state.borrow().clone();
        handle.dispatch(action);
    }

    fn set_viewport(&self, viewport: Viewport) {
        *self.viewport.borrow_mut() = viewport;
        self.dispatch(CanvasAction::SetViewport(viewport));
    }

    fn container_rect(&self) -> Rect {
        let r = self.container.get_bounding_client_rect();
        Rect::new(r.left(), r.top(), r.width(), r.height())
    }

    fn frame<'a>(&self, contacts: &'a [Contact], cancelable: bool) -> TouchFrame<'a> {
        TouchFrame {
            contacts,
            cancelable,
            viewport: *self.viewport.borrow(),
            container: Some(self.container_rect()),
        }
    }

    fn host<'a>(&'a self, event: &'a web_sys::Event) -> CanvasHost<'a> {
        CanvasHost { surface: self, event: Some(event) }
    }

    /// Node under a client-space point.
    fn hit_at(&self, at: Point, viewport: Viewport) -> Option<NodeId> {
        let world = viewport.screen_to_world(self.container_rect().to_local(at));
        let state = self.state.borrow().clone();
        hit_test(&state.nodes, world).map(|n| n.id.clone())
    }

    fn modifiers(&self, e: &MouseEvent) -> PointerModifiers {
        PointerModifiers {
            space: self.space_held.get(),
            additive: e.shift_key() || e.ctrl_key() || e.meta_key(),
        }
    }

    fn touch_start(&self, e: &TouchEvent) {
        if on_overlay(e) {
            return;
        }
        // Keeps the browser from replaying the tap as mouse events.
        if e.cancelable() {
            e.prevent_default();
        }
        let contacts = contacts(&e.touches());
        let frame = self.frame(&contacts, e.cancelable());
        let hit = match frame.contacts {
            [c] => self.hit_at(c.point(), frame.viewport),
            _ => None,
        };
        let mut host = self.host(e);
        self.controller.borrow_mut().on_touch_start(&frame, hit, &mut host);
    }

    fn touch_move(&self, e: &TouchEvent) {
        let contacts = contacts(&e.touches());
        let frame = self.frame(&contacts, e.cancelable());
        let mut host = self.host(e);
        self.controller.borrow_mut().on_touch_move(&frame, &mut host);
    }

    fn touch_end(&self, e: &TouchEvent) {
        let remaining = e.touches().length() as usize;
        let mut host = self.host(e);
        self.controller.borrow_mut().on_touch_end(remaining, &mut host);
    }

    fn long_press_fired(&self, token: TimerToken) {
        let rect = self.container_rect();
        let mut host = CanvasHost { surface: self, event: None };
        self.controller.borrow_mut().on_long_press_fired(token, Some(rect), &mut host);
    }

    fn mouse_down(&self, e: &MouseEvent) {
        if e.button() != 0 || on_overlay(e) {
            return;
        }
        e.prevent_default();
        let at = Point::new(e.client_x() as f64, e.client_y() as f64);
        let mods = self.modifiers(e);
        let hit = if mods.space { None } else { self.hit_at(at, *self.viewport.borrow()) };
        let rect = self.container_rect();
        let mut host = self.host(e);
        self.controller.borrow_mut().on_mouse_down(at, hit, mods, Some(rect), &mut host);
    }

    fn mouse_move(&self, e: &MouseEvent) {
        let at = Point::new(e.client_x() as f64, e.client_y() as f64);
        let viewport = *self.viewport.borrow();
        let rect = self.container_rect();
        let mut host = self.host(e);
        self.controller.borrow_mut().on_mouse_move(at, viewport, Some(rect), &mut host);
    }

    fn mouse_up(&self, e: &MouseEvent) {
        if e.button() != 0 {
            return;
        }
        let mods = self.modifiers(e);
        let mut host = self.host(e);
        self.controller.borrow_mut().on_mouse_up(mods, &mut host);
    }

    fn key(&self, e: &KeyboardEvent) {
        if e.code() == "Space" {
            self.space_held.set(e.type_() == "keydown");
        }
    }

    fn wheel(&self, e: &WheelEvent) {
        let pointer = self.container_rect().to_local(Point::new(e.client_x() as f64, e.client_y() as f64));
        let input = WheelInput {
            delta_x: e.delta_x(),
            delta_y: e.delta_y(),
            delta_mode: e.delta_mode(),
            zoom_modifier: e.ctrl_key() || e.meta_key(),
            over_overlay: on_overlay(e),
            pointer,
        };
        let sensitivity = self.controller.borrow().config.zoom_sensitivity;
        if let Some(next) = wheel_viewport(*self.viewport.borrow(), input, sensitivity) {
            e.prevent_default();
            self.set_viewport(next);
        }
    }
}

/// Routes gesture output into the reducer, the timer slot and the event.
struct CanvasHost<'a> {
    surface: &'a Surface,
    event: Option<&'a web_sys::Event>,
}

impl GestureHost for CanvasHost<'_> {
    fn prevent_native_gesture(&mut self) {
        if let Some(e) = self.event {
            e.prevent_default();
        }
    }

    fn replace_viewport(&mut self, viewport: Viewport) {
        self.surface.set_viewport(viewport);
    }

    fn move_nodes(&mut self, anchor: &NodeId, dx: f64, dy: f64) {
        self.surface.dispatch(CanvasAction::MoveNodes { anchor: anchor.clone(), dx, dy });
    }

    fn update_selection(&mut self, corner: Point) {
        self.surface.dispatch(CanvasAction::UpdateSelection { corner });
    }

    fn clear_long_press_indicator(&mut self) {
        self.surface.dispatch(CanvasAction::ClearLongPress);
    }

    fn clear_drag_target(&mut self) {
        self.surface.dispatch(CanvasAction::ClearDrag);
    }

    fn cancel_long_press(&mut self, token: TimerToken) {
        self.surface.timers.borrow_mut().cancel(token);
    }

    fn arm_long_press(&mut self, delay_ms: u32) -> TimerToken {
        let surface = self.surface.clone();
        self.surface
            .timers
            .borrow_mut()
            .arm(|token| Timeout::new(delay_ms, move || surface.long_press_fired(token)))
    }

    fn show_long_press_indicator(&mut self, at: Point) {
        self.surface.dispatch(CanvasAction::ShowLongPress(at));
    }

    fn begin_drag(&mut self, node: &NodeId) {
        self.surface.dispatch(CanvasAction::BeginDrag(node.clone()));
    }

    fn clear_node_selection(&mut self) {
        self.surface.dispatch(CanvasAction::SelectNode(None));
    }

    fn begin_selection(&mut self, anchor: Point, keep_selection: bool) {
        self.surface.dispatch(CanvasAction::BeginSelection { anchor, keep_selection });
    }

    fn commit_selection(&mut self, additive: bool) {
        let viewport = *self.surface.viewport.borrow();
        self.surface.dispatch(CanvasAction::CommitSelection { viewport, additive });
    }

    fn clear_selection_rect(&mut self) {
        self.surface.dispatch(CanvasAction::ClearSelectionRect);
    }

    fn vibrate(&mut self) {
        if let Some(win) = web_sys::window() {
            let _ = win.navigator().vibrate_with_duration(HAPTIC_MS);
        }
    }
}

struct Listeners {
    surface: Surface,
    touch_start: Closure<dyn FnMut(TouchEvent)>,
    touch_move: Closure<dyn FnMut(TouchEvent)>,
    touch_end: Closure<dyn FnMut(TouchEvent)>,
    wheel: Closure<dyn FnMut(WheelEvent)>,
    mouse_down: Closure<dyn FnMut(MouseEvent)>,
    mouse_move: Closure<dyn FnMut(MouseEvent)>,
    mouse_up: Closure<dyn FnMut(MouseEvent)>,
    key: Closure<dyn FnMut(KeyboardEvent)>,
}

impl Listeners {
    fn attach(surface: Surface) -> Self {
        let touch_start = {
            let s = surface.clone();
            Closure::wrap(Box::new(move |e: TouchEvent| s.touch_start(&e)) as Box<dyn FnMut(_)>)
        };
        let touch_move = {
            let s = surface.clone();
            Closure::wrap(Box::new(move |e: TouchEvent| s.touch_move(&e)) as Box<dyn FnMut(_)>)
        };
        let touch_end = {
            let s = surface.clone();
            Closure::wrap(Box::new(move |e: TouchEvent| s.touch_end(&e)) as Box<dyn FnMut(_)>)
        };
        let wheel = {
            let s = surface.clone();
            Closure::wrap(Box::new(move |e: WheelEvent| s.wheel(&e)) as Box<dyn FnMut(_)>)
        };
        let mouse_down = {
            let s = surface.clone();
            Closure::wrap(Box::new(move |e: MouseEvent| s.mouse_down(&e)) as Box<dyn FnMut(_)>)
        };
        let mouse_move = {
            let s = surface.clone();
            Closure::wrap(Box::new(move |e: MouseEvent| s.mouse_move(&e)) as Box<dyn FnMut(_)>)
        };
        let mouse_up = {
            let s = surface.clone();
            Closure::wrap(Box::new(move |e: MouseEvent| s.mouse_up(&e)) as Box<dyn FnMut(_)>)
        };
        let key = {
            let s = surface.clone();
            Closure::wrap(Box::new(move |e: KeyboardEvent| s.key(&e)) as Box<dyn FnMut(_)>)
        };
        let el = &surface.container;
        for (kind, cb) in [
            ("touchstart", &touch_start),
            ("touchmove", &touch_move),
            ("touchend", &touch_end),
            ("touchcancel", &touch_end),
        ] {
            el.add_event_listener_with_callback(kind, cb.as_ref().unchecked_ref()).ok();
        }
        el.add_event_listener_with_callback("wheel", wheel.as_ref().unchecked_ref()).ok();
        el.add_event_listener_with_callback("mousedown", mouse_down.as_ref().unchecked_ref()).ok();
        // Drags keep tracking after the pointer leaves the canvas.
        if let Some(win) = web_sys::window() {
            win.add_event_listener_with_callback("mousemove", mouse_move.as_ref().unchecked_ref()).ok();
            win.add_event_listener_with_callback("mouseup", mouse_up.as_ref().unchecked_ref()).ok();
            win.add_event_listener_with_callback("keydown", key.as_ref().unchecked_ref()).ok();
            win.add_event_listener_with_callback("keyup", key.as_ref().unchecked_ref()).ok();
        }
        log::debug!("canvas listeners attached");
        Self { surface, touch_start, touch_move, touch_end, wheel, mouse_down, mouse_move, mouse_up, key }
    }

    fn detach(self) {
        let el = &self.surface.container;
        for (kind, cb) in [
            ("touchstart", &self.touch_start),
            ("touchmove", &self.touch_move),
            ("touchend", &self.touch_end),
            ("touchcancel", &self.touch_end),
        ] {
            let _ = el.remove_event_listener_with_callback(kind, cb.as_ref().unchecked_ref());
        }
        let _ = el.remove_event_listener_with_callback("wheel", self.wheel.as_ref().unchecked_ref());
        let _ = el.remove_event_listener_with_callback("mousedown", self.mouse_down.as_ref().unchecked_ref());
        if let Some(win) = web_sys::window() {
            let _ = win.remove_event_listener_with_callback("mousemove", self.mouse_move.as_ref().unchecked_ref());
            let _ = win.remove_event_listener_with_callback("mouseup", self.mouse_up.as_ref().unchecked_ref());
            let _ = win.remove_event_listener_with_callback("keydown", self.key.as_ref().unchecked_ref());
            let _ = win.remove_event_listener_with_callback("keyup", self.key.as_ref().unchecked_ref());
        }
        let mut host = CanvasHost { surface: &self.surface, event: None };
        self.surface.controller.borrow_mut().reset(&mut host);
        // Spent timeouts still hold a surface clone.
        self.surface.timers.borrow_mut().clear();
    }
}

fn container_size(node_ref: &NodeRef) -> (f64, f64) {
    node_ref
        .cast::<HtmlElement>()
        .map(|el| (el.client_width() as f64, el.client_height() as f64))
        .unwrap_or((800.0, 600.0))
}

fn node_view(node: &GraphNode, state: &CanvasState) -> Html {
    let border = if state.dragging.as_ref() == Some(&node.id) {
        "#d4af37"
    } else if state.primary.as_ref() == Some(&node.id) {
        "#58a6ff"
    } else if state.selected.contains(&node.id) {
        "#1f6feb"
    } else {
        "#30363d"
    };
    html! {
        <div key={node.id.0.clone()} style={format!("position:absolute; left:{}px; top:{}px; width:{}px; height:{}px; box-sizing:border-box; background:#161b22; border:2px solid {}; border-radius:10px; padding:10px 12px; color:#c9d1d9; font-size:14px; user-select:none;", node.x, node.y, node.width, node.height, border)}>
            <div style="font-weight:600;">{ node.title.clone() }</div>
            <div style="font-size:11px; opacity:0.6; margin-top:4px;">{ node.id.to_string() }</div>
        </div>
    }
}

#[function_component(CanvasView)]
pub fn canvas_view(props: &CanvasViewProps) -> Html {
    let container_ref = use_node_ref();
    let state_ref = use_mut_ref(|| props.canvas_state.clone());
    let live_viewport = use_mut_ref(|| props.canvas_state.viewport);
    let controller = {
        let settings = props.settings.clone();
        use_mut_ref(move || TouchController::new(GestureConfig::from(&settings)))
    };
    let timers = use_mut_ref(BrowserTimers::default);

    // Listeners dispatch through whichever handle the last render produced.
    {
        let state_ref = state_ref.clone();
        let handle = props.canvas_state.clone();
        use_effect_with(props.canvas_state.version, move |_| {
            *state_ref.borrow_mut() = handle;
            || ()
        });
    }
    {
        let controller = controller.clone();
        use_effect_with(props.settings.clone(), move |settings| {
            controller.borrow_mut().config = GestureConfig::from(settings);
            || ()
        });
    }
    {
        let container_ref = container_ref.clone();
        let state_ref = state_ref.clone();
        let live_viewport = live_viewport.clone();
        let controller = controller.clone();
        let timers = timers.clone();
        use_effect_with((), move |_| {
            let listeners = container_ref.cast::<HtmlElement>().map(|container| {
                Listeners::attach(Surface {
                    state: state_ref,
                    viewport: live_viewport,
                    controller,
                    timers,
                    space_held: Rc::new(Cell::new(false)),
                    container,
                })
            });
            if listeners.is_none() {
                log::warn!("canvas container missing; pointer input disabled");
            }
            move || {
                if let Some(l) = listeners {
                    l.detach();
                }
            }
        });
    }

    let set_viewport = {
        let live = live_viewport.clone();
        let handle = props.canvas_state.clone();
        Callback::from(move |vp: Viewport| {
            *live.borrow_mut() = vp;
            handle.dispatch(CanvasAction::SetViewport(vp));
        })
    };
    let about_center = |f: fn(&Viewport, Point) -> Viewport| {
        let set_viewport = set_viewport.clone();
        let live = live_viewport.clone();
        let container_ref = container_ref.clone();
        Callback::from(move |_: ()| {
            let (w, h) = container_size(&container_ref);
            let next = f(&live.borrow(), Point::new(w / 2.0, h / 2.0));
            set_viewport.emit(next);
        })
    };
    let on_zoom_in = about_center(|vp: &Viewport, c: Point| vp.stepped(c, true));
    let on_zoom_out = about_center(|vp: &Viewport, c: Point| vp.stepped(c, false));
    let on_reset = about_center(|vp: &Viewport, c: Point| vp.zoomed_at(c, 1.0));
    let on_fit = {
        let set_viewport = set_viewport.clone();
        let live = live_viewport.clone();
        let container_ref = container_ref.clone();
        let handle = props.canvas_state.clone();
        Callback::from(move |_: ()| {
            let (w, h) = container_size(&container_ref);
            let next = graph_bounds(&handle.nodes)
                .and_then(|b| Viewport::fit_bounds(&b, w, h, FIT_PADDING))
                .unwrap_or_else(|| live.borrow().zoomed_at(Point::new(w / 2.0, h / 2.0), 1.0));
            set_viewport.emit(next);
        })
    };

    let state = &*props.canvas_state;
    let vp = state.viewport;
    let grid = if props.settings.show_grid {
        let g = GRID_PX * vp.zoom;
        format!(
            "background-image:radial-gradient(circle, #30363d 1px, transparent 1px); background-size:{g}px {g}px; background-position:{}px {}px;",
            vp.x, vp.y
        )
    } else {
        String::new()
    };
    let marquee = match state.selection_rect {
        Some(sel) => {
            let r = sel.normalized();
            html! { <div style={format!("position:absolute; left:{}px; top:{}px; width:{}px; height:{}px; border:1px dashed #58a6ff; background:rgba(88,166,255,0.12); pointer-events:none;", r.left, r.top, r.width, r.height)}></div> }
        }
        None => html! {},
    };
    let indicator = match state.long_press_indicator {
        Some(p) => html! {
            <div style={format!("position:absolute; left:{}px; top:{}px; width:48px; height:48px; margin:-24px 0 0 -24px; border:2px solid #58a6ff; border-radius:50%; opacity:0.7; pointer-events:none;", p.x, p.y)}></div>
        },
        None => html! {},
    };

    html! {
        <div ref={container_ref} style={format!("position:fixed; inset:0; overflow:hidden; touch-action:none; background-color:#0d1117; {}", grid)}>
            <div style={format!("position:absolute; left:0; top:0; transform-origin:0 0; transform:translate({}px, {}px) scale({});", vp.x, vp.y, vp.zoom)}>
                { for state.nodes.iter().map(|n| node_view(n, state)) }
            </div>
            { marquee }
            { indicator }
            <StatusBar zoom={vp.zoom} nodes={state.nodes.len()} selected={state.selected.len()} />
            <CanvasControls {on_zoom_in} {on_zoom_out} {on_fit} {on_reset} />
        </div>
    }
}
