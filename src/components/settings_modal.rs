use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::settings::{Settings, LONG_PRESS_RANGE, SENSITIVITY_RANGE};

#[derive(Properties, PartialEq, Clone)]
pub struct SettingsModalProps {
    pub show: bool,
    pub settings: Settings,
    pub on_change: Callback<Settings>,
    pub on_close: Callback<()>,
    pub on_reset: Callback<()>,
}

#[function_component]
pub fn SettingsModal(props: &SettingsModalProps) -> Html {
    if !props.show {
        return html! {};
    }

    let close_cb = {
        let cb = props.on_close.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let sensitivity_cb = {
        let cb = props.on_change.clone();
        let current = props.settings.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            if let Ok(v) = input.value().parse::<f64>() {
                cb.emit(Settings { zoom_sensitivity: v, ..current.clone() });
            }
        })
    };
    let long_press_cb = {
        let cb = props.on_change.clone();
        let current = props.settings.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            if let Ok(v) = input.value().parse::<u32>() {
                cb.emit(Settings { long_press_ms: v, ..current.clone() });
            }
        })
    };
    let toggle_grid_cb = {
        let cb = props.on_change.clone();
        let current = props.settings.clone();
        Callback::from(move |_| cb.emit(Settings { show_grid: !current.show_grid, ..current.clone() }))
    };
    let reset_cb = {
        let cb = props.on_reset.clone();
        Callback::from(move |_| cb.emit(()))
    };

    let s = &props.settings;
    html! {<div style="position:absolute; inset:0; display:flex; align-items:center; justify-content:center; background:rgba(0,0,0,0.55); z-index:50;">
        <div style="background:#161b22; border:1px solid #30363d; border-radius:12px; padding:16px 20px; min-width:320px; max-width:440px; display:flex; flex-direction:column; gap:14px; color:#c9d1d9;">
            <div style="display:flex; justify-content:space-between; align-items:center;">
                <h3 style="margin:0; font-size:18px;">{"Settings"}</h3>
                <button onclick={close_cb.clone()} style="padding:4px 8px;">{"Close"}</button>
            </div>
            <div style="display:flex; flex-direction:column; gap:10px;">
                <label style="display:flex; flex-direction:column; gap:4px;">
                    <span>{ format!("Zoom Sensitivity ({:.1}x)", s.zoom_sensitivity) }</span>
                    <input type="range" min={SENSITIVITY_RANGE.0.to_string()} max={SENSITIVITY_RANGE.1.to_string()} step="0.1"
                        value={s.zoom_sensitivity.to_string()} oninput={sensitivity_cb} />
                </label>
                <label style="display:flex; flex-direction:column; gap:4px;">
                    <span>{ format!("Long Press ({} ms)", s.long_press_ms) }</span>
                    <input type="range" min={LONG_PRESS_RANGE.0.to_string()} max={LONG_PRESS_RANGE.1.to_string()} step="100"
                        value={s.long_press_ms.to_string()} oninput={long_press_cb} />
                </label>
                <label style="display:flex; align-items:center; gap:8px; cursor:pointer;">
                    <input type="checkbox" checked={s.show_grid} onclick={toggle_grid_cb} />
                    <span>{"Show Grid"}</span>
                </label>
            </div>
            <div style="display:flex; gap:8px; flex-wrap:wrap;">
                <button onclick={reset_cb} style="flex:1;">{"Restore Defaults"}</button>
                <button onclick={close_cb} style="flex:0 0 auto;">{"Done"}</button>
            </div>
        </div>
    </div>}
}
