use yew::prelude::*;

use crate::util::format_zoom;

#[derive(Properties, PartialEq, Clone)]
pub struct StatusBarProps {
    pub zoom: f64,
    pub nodes: usize,
    pub selected: usize,
}

#[function_component]
pub fn StatusBar(props: &StatusBarProps) -> Html {
    let cell_style = "display:flex; align-items:center; gap:6px;";
    let label_style = "opacity:0.7;";
    let value_style = "font-variant-numeric:tabular-nums; font-weight:600;";
    html! {
        <div style="position:absolute; top:12px; left:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:6px 12px; display:flex; gap:16px; font-size:13px; color:#c9d1d9; pointer-events:none;">
            <div style={cell_style}>
                <span style={label_style}>{"Zoom"}</span>
                <span style={format!("{} color:#58a6ff;", value_style)}>{ format_zoom(props.zoom) }</span>
            </div>
            <div style={cell_style}>
                <span style={label_style}>{"Nodes"}</span>
                <span style={value_style}>{ props.nodes }</span>
            </div>
            <div style={cell_style}>
                <span style={label_style}>{"Selected"}</span>
                <span style={format!("{} color:#d4af37;", value_style)}>{ props.selected }</span>
            </div>
        </div>
    }
}
